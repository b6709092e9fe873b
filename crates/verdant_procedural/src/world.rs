//! # World
//!
//! Ties the pieces together behind one owner: configuration, the world
//! sequence, the noise field, the chunk store, the streamer, the bulk
//! loader and the host presentation.
//!
//! A world starts in [`WorldPhase::Loading`] and generates one chunk per
//! [`World::tick`]. The first tick after the bulk load completes activates
//! the neighbourhood around the origin and tells the presentation loading
//! finished; from then on every tick streams around the viewer.
//!
//! ## Example
//!
//! ```rust
//! use verdant_procedural::{Headless, World, WorldConfig, WorldPhase, WorldPoint};
//!
//! let config = WorldConfig {
//!     seed: "doc".to_string(),
//!     chunk_size: 4,
//!     world_size: [1, 1],
//!     ..WorldConfig::default()
//! };
//! let mut world = World::new(config, Headless).unwrap();
//! while world.tick(None) == WorldPhase::Loading {}
//! world.tick(Some(WorldPoint::new(10.0, 0.0)));
//! assert_eq!(world.stats().active_chunks, 15);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::bulk_load::{BulkLoader, BulkStatus};
use crate::chunk::{Cell, Chunk, ChunkCoord, WorldPoint, WorldPos};
use crate::config::WorldConfig;
use crate::error::WorldGenResult;
use crate::generator::ChunkGenerator;
use crate::noise::{NoiseField, NoiseOffsets, WorldSeed};
use crate::presentation::{DecorationHandle, Presentation};
use crate::random::{random_seed_phrase, WorldRandom};
use crate::store::ChunkStore;
use crate::streamer::Streamer;

/// Where the world is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldPhase {
    /// Bulk load in progress.
    Loading,
    /// Streaming around the viewer.
    Ready,
}

/// Counters for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Chunks in the store.
    pub chunks_generated: usize,
    /// Chunks in the active neighbourhood.
    pub active_chunks: usize,
    /// Neighbourhood recomputations.
    pub neighbourhood_swaps: u64,
    /// Bulk-load ticks that visited a chunk.
    pub bulk_ticks: u64,
}

/// Snapshot of what sits under a world point.
#[derive(Clone, Debug, PartialEq)]
pub struct CellReport {
    /// Chunks in the store.
    pub loaded_chunks: usize,
    /// Chunks in the active neighbourhood.
    pub active_chunks: usize,
    /// Chunk under the point.
    pub chunk: ChunkCoord,
    /// Local cell index.
    pub cell_index: (usize, usize),
    /// Height sample.
    pub sample: f64,
    /// World cell position.
    pub world_position: WorldPos,
    /// Tile name, if assigned.
    pub tile: Option<String>,
    /// Decoration on the cell.
    pub decoration: Option<DecorationHandle>,
}

impl fmt::Display for CellReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOTAL_LOADED_CHUNKS: {}", self.loaded_chunks)?;
        writeln!(f, "ACTIVE_CHUNKS: {}", self.active_chunks)?;
        writeln!(f, "CHUNK: {}", self.chunk)?;
        writeln!(
            f,
            "CELL: {},{} | {} | {}",
            self.cell_index.0, self.cell_index.1, self.sample, self.world_position
        )?;
        let tile = self.tile.as_deref().unwrap_or("NULL");
        match self.decoration {
            Some(handle) => writeln!(f, "TILE: {tile} | decoration #{}", handle.0),
            None => writeln!(f, "TILE: {tile} | none"),
        }
    }
}

/// A generated, streamable world.
pub struct World<P: Presentation> {
    config: WorldConfig,
    seed: WorldSeed,
    rng: WorldRandom,
    field: Arc<NoiseField>,
    generator: ChunkGenerator,
    store: ChunkStore,
    streamer: Streamer,
    bulk: BulkLoader,
    presentation: P,
    phase: WorldPhase,
}

impl<P: Presentation> World<P> {
    /// Validates `config` and prepares the world. No chunk is generated yet.
    ///
    /// An empty seed is replaced by a random one, recorded in
    /// [`World::config`].
    ///
    /// # Errors
    ///
    /// Any configuration error; see [`WorldConfig::validate`].
    pub fn new(mut config: WorldConfig, presentation: P) -> WorldGenResult<Self> {
        config.validate()?;

        if config.seed.is_empty() {
            config.seed = random_seed_phrase();
            tracing::warn!("No world seed configured, generated \"{}\"", config.seed);
        }
        let seed = WorldSeed::from_phrase(&config.seed);

        let mut rng = WorldRandom::new(seed);
        let offsets = NoiseOffsets::draw(&mut rng);
        let field = Arc::new(NoiseField::new(seed, &config.noise, &config.river, offsets)?);
        let generator = ChunkGenerator::from_config(&config, Arc::clone(&field))?;
        let bulk = BulkLoader::new(config.world_size, config.loading_blurbs.clone(), seed);

        tracing::info!(
            "World \"{}\" ready to load: {} chunks of {}x{} cells, offsets ({}, {})",
            config.seed,
            bulk.total(),
            config.chunk_size,
            config.chunk_size,
            offsets.x,
            offsets.y
        );

        Ok(Self {
            config,
            seed,
            rng,
            field,
            generator,
            store: ChunkStore::new(),
            streamer: Streamer::new(),
            bulk,
            presentation,
            phase: WorldPhase::Loading,
        })
    }

    /// Advances the world by one host tick.
    ///
    /// While loading this generates one chunk. The first tick after the load
    /// completes activates the origin neighbourhood; that tick and every
    /// later one then stream around `viewer`, if given.
    pub fn tick(&mut self, viewer: Option<WorldPoint>) -> WorldPhase {
        if self.phase == WorldPhase::Loading {
            let status = self.bulk.status(&self.store);
            if !status.is_complete() {
                self.bulk
                    .tick(&mut self.store, &self.generator, &mut self.rng, &mut self.presentation);
                return WorldPhase::Loading;
            }

            self.set_active_neighborhood(ChunkCoord::new(0, 0));
            self.presentation.loading_finished();
            self.phase = WorldPhase::Ready;
            tracing::info!(
                "World \"{}\" loaded: {} chunks in {} ticks",
                self.config.seed,
                self.store.len(),
                self.bulk.ticks()
            );
        }

        if let Some(point) = viewer {
            let center = self.chunk_at_world(point);
            self.set_active_neighborhood(center);
        }
        self.phase
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> WorldPhase {
        self.phase
    }

    /// Bulk-load progress.
    #[must_use]
    pub fn bulk_status(&self) -> BulkStatus {
        self.bulk.status(&self.store)
    }

    /// Chunk at `coord`, generating it if needed.
    pub fn get_or_create(&mut self, coord: ChunkCoord) -> &mut Chunk {
        self.store
            .get_or_create(coord, &self.generator, &mut self.rng, &mut self.presentation)
    }

    /// Activates the neighbourhood around `center`. Returns whether the
    /// active set changed.
    pub fn set_active_neighborhood(&mut self, center: ChunkCoord) -> bool {
        self.streamer.set_active_neighborhood(
            center,
            &mut self.store,
            &self.generator,
            &mut self.rng,
            &mut self.presentation,
        )
    }

    /// Chunk coordinate under a world point.
    #[must_use]
    pub fn chunk_at_world(&self, point: WorldPoint) -> ChunkCoord {
        ChunkCoord::from_world_point(point, self.config.chunk_size)
    }

    /// Generated chunk at `coord`; never generates.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.store.get(coord)
    }

    /// Cell under a world point, if its chunk was generated.
    #[must_use]
    pub fn cell_at(&self, point: WorldPoint) -> Option<&Cell> {
        let pos = point.cell();
        self.chunk_holding(point)?.cell_from_world(pos)
    }

    /// Debug snapshot of the cell under a world point.
    #[must_use]
    pub fn inspect(&self, point: WorldPoint) -> Option<CellReport> {
        let chunk = self.chunk_holding(point)?;
        let cell = chunk.cell_from_world(point.cell())?;
        Some(CellReport {
            loaded_chunks: self.store.len(),
            active_chunks: self.streamer.active().len(),
            chunk: chunk.coord(),
            cell_index: cell.local(),
            sample: cell.sample(),
            world_position: cell.world_position(),
            tile: cell.tile().map(|t| t.as_str().to_string()),
            decoration: cell.decoration(),
        })
    }

    /// Generated chunk whose cells include the cell under `point`.
    ///
    /// The half-chunk rounding of [`World::chunk_at_world`] can land one
    /// chunk away from the one whose origin covers the cell, so the direct
    /// neighbours are checked after it.
    fn chunk_holding(&self, point: WorldPoint) -> Option<&Chunk> {
        const CANDIDATES: [(i32, i32); 9] = [
            (0, 0),
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (1, -1),
            (-1, 1),
            (1, 1),
        ];
        let pos = point.cell();
        let guess = self.chunk_at_world(point);
        CANDIDATES
            .iter()
            .filter_map(|(dx, dy)| self.store.get(guess.offset(*dx, *dy)))
            .find(|chunk| chunk.contains_world_position(pos))
    }

    /// Diagnostic counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            chunks_generated: self.store.len(),
            active_chunks: self.streamer.active().len(),
            neighbourhood_swaps: self.streamer.swaps(),
            bulk_ticks: self.bulk.ticks(),
        }
    }

    /// Active chunk coordinates.
    #[must_use]
    pub fn active_chunks(&self) -> &[ChunkCoord] {
        self.streamer.active()
    }

    /// Effective configuration (with the generated seed, if any).
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Hashed world seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Noise field.
    #[must_use]
    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    /// Chunk store.
    #[must_use]
    pub const fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Host presentation.
    #[must_use]
    pub const fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Mutable host presentation.
    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Consumes the world, returning the presentation.
    pub fn into_presentation(self) -> P {
        self.presentation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorldGenError;
    use crate::presentation::{Headless, PresentationEvent, RecordingPresentation};

    fn config() -> WorldConfig {
        WorldConfig {
            seed: "unit".to_string(),
            chunk_size: 4,
            world_size: [1, 1],
            workers: 1,
            ..WorldConfig::default()
        }
    }

    fn load<P: Presentation>(world: &mut World<P>) {
        while world.tick(None) == WorldPhase::Loading {}
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config();
        bad.default_tiles.clear();
        assert!(matches!(
            World::new(bad, Headless),
            Err(WorldGenError::EmptyDefaultTiles)
        ));
    }

    #[test]
    fn test_empty_seed_is_generated() {
        let mut cfg = config();
        cfg.seed.clear();
        let world = World::new(cfg, Headless).unwrap();
        assert_eq!(world.config().seed.len(), crate::random::GENERATED_SEED_LEN);
    }

    #[test]
    fn test_load_then_origin_neighbourhood() {
        let mut world = World::new(config(), RecordingPresentation::new()).unwrap();
        let total = world.bulk_status().total;
        assert_eq!(total, 6);

        for _ in 0..total {
            assert_eq!(world.tick(None), WorldPhase::Loading);
        }
        assert!(world.active_chunks().is_empty());
        assert_eq!(world.stats().chunks_generated, 6);

        assert_eq!(world.tick(None), WorldPhase::Ready);
        assert_eq!(world.active_chunks().len(), 15);
        assert!(world.active_chunks().contains(&ChunkCoord::new(0, 0)));
        assert!(world
            .presentation()
            .events()
            .contains(&PresentationEvent::LoadingFinished));
    }

    #[test]
    fn test_viewer_drives_streaming() {
        let mut world = World::new(config(), Headless).unwrap();
        load(&mut world);
        let swaps = world.stats().neighbourhood_swaps;

        world.tick(Some(WorldPoint::new(1.0, 1.0)));
        assert_eq!(world.stats().neighbourhood_swaps, swaps);

        world.tick(Some(WorldPoint::new(9.0, 1.0)));
        assert_eq!(world.stats().neighbourhood_swaps, swaps + 1);
        assert!(world.active_chunks().contains(&ChunkCoord::new(4, 0)));
    }

    #[test]
    fn test_cell_lookup_never_creates() {
        let mut world = World::new(config(), Headless).unwrap();
        load(&mut world);
        let before = world.stats().chunks_generated;

        assert!(world.cell_at(WorldPoint::new(500.0, 500.0)).is_none());
        assert!(world.inspect(WorldPoint::new(500.0, 500.0)).is_none());
        assert_eq!(world.stats().chunks_generated, before);

        let cell = world.cell_at(WorldPoint::new(0.5, -0.5)).unwrap();
        assert_eq!(cell.world_position(), WorldPos::new(0, -1));
        assert!(cell.tile().is_some());
    }

    #[test]
    fn test_inspect_report() {
        let mut world = World::new(config(), Headless).unwrap();
        load(&mut world);
        let report = world.inspect(WorldPoint::new(1.2, 0.7)).unwrap();
        assert_eq!(report.chunk, ChunkCoord::new(0, 0));
        assert_eq!(report.world_position, WorldPos::new(1, 0));
        assert_eq!(report.cell_index, (3, 2));
        assert_eq!(report.active_chunks, 15);
        let text = report.to_string();
        assert!(text.contains("CHUNK: (0, 0)"));
        assert!(text.contains("TILE: "));
    }

    fn bare_world(chunk_size: u32) -> World<Headless> {
        World::new(
            WorldConfig {
                chunk_size,
                ..config()
            },
            Headless,
        )
        .unwrap()
    }

    #[test]
    fn test_cell_at_odd_size_negative_edge() {
        // Size 5: chunk 0 covers -2..=2, chunk -1 covers -7..=-3.
        let mut world = bare_world(5);
        world.get_or_create(ChunkCoord::new(0, 0));
        let point = WorldPoint::new(-2.5, 0.0);
        assert_eq!(world.chunk_at_world(point), ChunkCoord::new(0, 0));

        // Only chunk 0 exists, and it does not hold cell -3.
        assert!(world.cell_at(point).is_none());
        assert!(world.inspect(point).is_none());

        world.get_or_create(ChunkCoord::new(-1, 0));
        let cell = world.cell_at(point).unwrap();
        assert_eq!(cell.world_position(), WorldPos::new(-3, 0));
        let report = world.inspect(point).unwrap();
        assert_eq!(report.chunk, ChunkCoord::new(-1, 0));
        assert_eq!(report.world_position, WorldPos::new(-3, 0));
        assert_eq!(report.cell_index, (4, 2));
    }

    #[test]
    fn test_cell_at_even_size_negative_boundary() {
        // Size 16: the point -8 rounds to chunk -1, but cell -8 is chunk 0's first.
        let mut world = bare_world(16);
        world.get_or_create(ChunkCoord::new(0, 0));
        let point = WorldPoint::new(-8.0, 0.5);
        assert_eq!(world.chunk_at_world(point).x, -1);

        let cell = world.cell_at(point).unwrap();
        assert_eq!(cell.world_position(), WorldPos::new(-8, 0));
        assert_eq!(cell.local(), (0, 8));

        let point = WorldPoint::new(3.0, -8.0);
        let report = world.inspect(point).unwrap();
        assert_eq!(report.chunk, ChunkCoord::new(0, 0));
        assert_eq!(report.world_position, WorldPos::new(3, -8));

        // One cell further out belongs to chunk -1, which was never generated.
        assert!(world.cell_at(WorldPoint::new(-8.5, 0.5)).is_none());
    }

    #[test]
    fn test_cell_at_matches_every_generated_cell() {
        for size in [5u32, 16] {
            let mut world = bare_world(size);
            for cx in -1..=1 {
                for cy in -1..=1 {
                    world.get_or_create(ChunkCoord::new(cx, cy));
                }
            }
            let centre = world.chunk(ChunkCoord::new(0, 0)).unwrap();
            let cells: Vec<WorldPos> = centre.cells().map(Cell::world_position).collect();
            for pos in cells {
                let point = WorldPoint::new(f64::from(pos.x) + 0.5, f64::from(pos.y) + 0.5);
                let cell = world.cell_at(point).unwrap();
                assert_eq!(cell.world_position(), pos, "size {size}");
            }
        }
    }
}
