//! # Chunk Generator
//!
//! Produces a finished chunk: heights from the parallel job, then a
//! sequential classification pass in row-major `x`, then `y` order.
//!
//! The classification pass consumes the shared world sequence. Its draw
//! order is part of the reproducibility contract, so it must never be
//! parallelised or reordered.

use std::sync::Arc;

use crate::biome::{BiomeClassifier, Classification, TileId};
use crate::chunk::{Chunk, ChunkCoord};
use crate::config::WorldConfig;
use crate::error::WorldGenResult;
use crate::job::GenerationJob;
use crate::noise::NoiseField;
use crate::presentation::{Presentation, Surface};
use crate::random::SpawnRng;

/// Counts gathered while painting one chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintSummary {
    /// Cells classified as water.
    pub water: usize,
    /// Cells that matched a layer.
    pub layered: usize,
    /// Trees spawned.
    pub decorations: usize,
}

/// Generates and paints chunks.
#[derive(Clone)]
pub struct ChunkGenerator {
    job: GenerationJob,
    classifier: BiomeClassifier,
    dirt: TileId,
    chunk_size: u32,
}

impl ChunkGenerator {
    /// Creates a generator from its parts.
    #[must_use]
    pub fn new(job: GenerationJob, classifier: BiomeClassifier, dirt: TileId, chunk_size: u32) -> Self {
        Self {
            job,
            classifier,
            dirt,
            chunk_size,
        }
    }

    /// Builds the generator a configuration describes.
    ///
    /// # Errors
    ///
    /// Classifier configuration errors.
    pub fn from_config(config: &WorldConfig, field: Arc<NoiseField>) -> WorldGenResult<Self> {
        let classifier = BiomeClassifier::from_config(config)?;
        let job = GenerationJob::new(field, config.chunk_size, config.workers);
        Ok(Self::new(
            job,
            classifier,
            TileId::new(&config.tiles.base_dirt),
            config.chunk_size,
        ))
    }

    /// Cells per chunk edge.
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// The classifier.
    #[must_use]
    pub fn classifier(&self) -> &BiomeClassifier {
        &self.classifier
    }

    /// The height job.
    #[must_use]
    pub fn job(&self) -> &GenerationJob {
        &self.job
    }

    /// Generates, classifies and presents the chunk at `coord`.
    ///
    /// The chunk comes back inactive.
    pub fn generate<R, P>(&self, coord: ChunkCoord, rng: &mut R, presentation: &mut P) -> Chunk
    where
        R: SpawnRng + ?Sized,
        P: Presentation + ?Sized,
    {
        let heights = self.job.run(coord);
        let mut chunk = Chunk::from_heights(coord, self.chunk_size, &heights);
        chunk.set_presentation(presentation.create_chunk_object(coord));

        let summary = self.paint(&mut chunk, rng, presentation);
        tracing::debug!(
            "Generated chunk {}: {} water, {} layered, {} trees",
            coord,
            summary.water,
            summary.layered,
            summary.decorations
        );
        chunk
    }

    /// Classifies every unassigned cell of `chunk` and stamps the result.
    ///
    /// Cells that already carry a tile keep it and are re-stamped on the
    /// ground surface without drawing from `rng`.
    pub fn paint<R, P>(&self, chunk: &mut Chunk, rng: &mut R, presentation: &mut P) -> PaintSummary
    where
        R: SpawnRng + ?Sized,
        P: Presentation + ?Sized,
    {
        let field = self.job.field();
        let coord = chunk.coord();
        let size = chunk.size();
        let mut summary = PaintSummary::default();

        for x in 0..size {
            for y in 0..size {
                let Some(cell) = chunk.cell_at_mut(x, y) else {
                    continue;
                };
                let pos = cell.world_position();
                presentation.stamp(Surface::Dirt, pos, &self.dirt);

                let river = field.river_neighborhood(pos.x, pos.y);
                if river.is_clear() {
                    if let Some(existing) = cell.tile() {
                        presentation.stamp(Surface::Ground, pos, existing);
                        continue;
                    }
                }

                match self.classifier.classify(cell.sample(), river, pos, rng) {
                    Classification::Water { tile, bank } => {
                        summary.water += 1;
                        cell.assign_tile(tile.clone());
                        presentation.stamp(Surface::Water, pos, &tile);
                        presentation.stamp(Surface::Bank, pos, &bank);
                    }
                    Classification::Land {
                        tile,
                        default_tile,
                        layer,
                        mountain,
                        decoration,
                    } => {
                        if layer.is_some() {
                            summary.layered += 1;
                        }
                        if mountain {
                            presentation.stamp(Surface::Ground, pos, &default_tile);
                            presentation.stamp(Surface::Mountain, pos, &tile);
                        } else {
                            presentation.stamp(Surface::Ground, pos, &tile);
                        }
                        cell.assign_tile(tile);

                        if let Some(directive) = decoration {
                            summary.decorations += 1;
                            if let Some(handle) = presentation.spawn_decoration(coord, &directive) {
                                cell.set_decoration(handle);
                            }
                        }
                    }
                }
            }
        }

        summary
    }
}
