//! # Amortised Bulk Load
//!
//! Generates the starting world one chunk per tick so the host loop stays
//! responsive. A resumable row-major cursor walks a rectangle of
//! `world_size.x + 3` columns, starting at chunk
//! `(-1 - w/2, -1 - h/2)`, until the store holds
//! `w*h + 3w + 2h` chunks.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::chunk::ChunkCoord;
use crate::generator::ChunkGenerator;
use crate::noise::WorldSeed;
use crate::presentation::{LoadProgress, Presentation};
use crate::random::SpawnRng;
use crate::store::ChunkStore;

/// Sub-seed purpose for the status-line picker.
const STATUS_STREAM: u64 = 0x5354_4154_5553;

/// Chunks the bulk load produces for a world of `w x h` chunks.
#[must_use]
pub const fn total_chunks(world_size: [u32; 2]) -> usize {
    let w = world_size[0] as usize;
    let h = world_size[1] as usize;
    w * h + w * 3 + h * 2
}

/// Result of one bulk-load tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BulkStatus {
    /// Chunk the tick visited, `None` once the load is complete.
    pub coord: Option<ChunkCoord>,
    /// Chunks in the store.
    pub generated: usize,
    /// Chunks the load must produce.
    pub total: usize,
}

impl BulkStatus {
    /// Chunks still to generate.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.total.saturating_sub(self.generated)
    }

    /// True once every chunk exists.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.generated >= self.total
    }
}

/// Resumable bulk-load cursor.
#[derive(Debug)]
pub struct BulkLoader {
    world_size: [u32; 2],
    total: usize,
    column: u32,
    row: u32,
    ticks: u64,
    blurbs: Vec<String>,
    status: Option<String>,
    status_rng: ChaCha8Rng,
}

impl BulkLoader {
    /// Creates a cursor for a world of `world_size` chunks.
    #[must_use]
    pub fn new(world_size: [u32; 2], blurbs: Vec<String>, seed: WorldSeed) -> Self {
        Self {
            world_size,
            total: total_chunks(world_size),
            column: 0,
            row: 0,
            ticks: 0,
            blurbs,
            status: None,
            status_rng: ChaCha8Rng::seed_from_u64(seed.derive(STATUS_STREAM).value()),
        }
    }

    /// Chunks the load must produce.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Ticks that generated (or revisited) a chunk.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current `(column, row)` of the cursor.
    #[must_use]
    pub const fn cursor(&self) -> (u32, u32) {
        (self.column, self.row)
    }

    /// Chunk the next tick will visit.
    #[must_use]
    pub fn next_coord(&self) -> ChunkCoord {
        let [w, h] = self.world_size;
        let half_w = i32::try_from(w / 2).unwrap_or(i32::MAX);
        let half_h = i32::try_from(h / 2).unwrap_or(i32::MAX);
        let column = i32::try_from(self.column).unwrap_or(i32::MAX);
        let row = i32::try_from(self.row).unwrap_or(i32::MAX);
        ChunkCoord::new(-1 - half_w + column, -1 - half_h + row)
    }

    /// Status without advancing.
    #[must_use]
    pub fn status(&self, store: &ChunkStore) -> BulkStatus {
        BulkStatus {
            coord: None,
            generated: store.len(),
            total: self.total,
        }
    }

    /// Generates the chunk under the cursor (left inactive) and advances.
    ///
    /// A tick that wraps the row does not report progress. Once the store
    /// holds every chunk the tick is a no-op.
    pub fn tick<R, P>(
        &mut self,
        store: &mut ChunkStore,
        generator: &ChunkGenerator,
        rng: &mut R,
        presentation: &mut P,
    ) -> BulkStatus
    where
        R: SpawnRng + ?Sized,
        P: Presentation + ?Sized,
    {
        if store.len() >= self.total {
            return self.status(store);
        }

        let coord = self.next_coord();
        let chunk = store.get_or_create(coord, generator, rng, presentation);
        chunk.set_active(false, presentation);
        self.ticks += 1;

        if self.column == self.world_size[0].saturating_add(2) {
            self.column = 0;
            self.row += 1;
        } else {
            self.column += 1;
            let progress = self.progress(store.len());
            presentation.report_progress(&progress);
        }

        BulkStatus {
            coord: Some(coord),
            generated: store.len(),
            total: self.total,
        }
    }

    fn progress(&mut self, generated: usize) -> LoadProgress {
        let interval = (self.total / 10).max(1);
        if generated % interval == 0 && !self.blurbs.is_empty() {
            let pick = self.status_rng.gen_range(0..self.blurbs.len());
            self.status = Some(self.blurbs[pick].clone());
        }
        LoadProgress {
            generated,
            total: self.total,
            status: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::config::WorldConfig;
    use crate::noise::{NoiseField, NoiseOffsets};
    use crate::presentation::RecordingPresentation;
    use crate::random::WorldRandom;

    fn generator() -> ChunkGenerator {
        let config = WorldConfig {
            chunk_size: 3,
            workers: 1,
            ..WorldConfig::default()
        };
        let field = NoiseField::new(
            WorldSeed::new(6),
            &config.noise,
            &config.river,
            NoiseOffsets::default(),
        )
        .unwrap();
        ChunkGenerator::from_config(&config, Arc::new(field)).unwrap()
    }

    #[test]
    fn test_total_over_provisions_border() {
        assert_eq!(total_chunks([32, 32]), 1024 + 96 + 64);
        assert_eq!(total_chunks([2, 2]), 14);
        assert_eq!(total_chunks([3, 1]), 3 + 9 + 2);
    }

    #[test]
    fn test_cursor_starts_outside_corner() {
        let loader = BulkLoader::new([4, 6], Vec::new(), WorldSeed::new(1));
        assert_eq!(loader.next_coord(), ChunkCoord::new(-3, -4));
    }

    #[test]
    fn test_one_chunk_per_tick_until_complete() {
        let gen = generator();
        let mut store = ChunkStore::new();
        let mut rng = WorldRandom::new(WorldSeed::new(6));
        let mut rec = RecordingPresentation::new();
        let mut loader = BulkLoader::new([2, 2], vec!["Loading".to_string()], WorldSeed::new(6));

        let mut visited = Vec::new();
        loop {
            let status = loader.tick(&mut store, &gen, &mut rng, &mut rec);
            match status.coord {
                Some(coord) => {
                    visited.push(coord);
                    assert_eq!(status.generated, visited.len());
                }
                None => break,
            }
            assert!(visited.len() <= 14, "bulk load must stop at its total");
        }

        assert_eq!(visited.len(), 14);
        assert_eq!(store.len(), 14);
        let distinct: HashSet<_> = visited.iter().collect();
        assert_eq!(distinct.len(), 14);
        assert!(store.iter().all(|(_, chunk)| !chunk.is_active()));

        // Row-major: five columns per row starting at (-2, -2).
        assert_eq!(visited[0], ChunkCoord::new(-2, -2));
        assert_eq!(visited[4], ChunkCoord::new(2, -2));
        assert_eq!(visited[5], ChunkCoord::new(-2, -1));
        assert_eq!(visited[13], ChunkCoord::new(1, 0));

        // Complete loads stay put.
        let status = loader.tick(&mut store, &gen, &mut rng, &mut rec);
        assert!(status.is_complete());
        assert_eq!(status.remaining(), 0);
        assert_eq!(loader.ticks(), 14);
    }

    #[test]
    fn test_row_wrap_skips_progress() {
        let gen = generator();
        let mut store = ChunkStore::new();
        let mut rng = WorldRandom::new(WorldSeed::new(6));
        let mut rec = RecordingPresentation::new();
        let mut loader = BulkLoader::new([2, 2], Vec::new(), WorldSeed::new(6));

        for _ in 0..14 {
            loader.tick(&mut store, &gen, &mut rng, &mut rec);
        }
        let reports = rec.progress_reports();
        // Ticks 5 and 10 wrap their rows.
        assert_eq!(reports.len(), 12);
        let fractions: Vec<f64> = reports.iter().map(LoadProgress::fraction).collect();
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert!(reports.iter().all(|r| r.status.is_none()));
    }

    #[test]
    fn test_status_refreshes_every_tenth() {
        let gen = generator();
        let mut store = ChunkStore::new();
        let mut rng = WorldRandom::new(WorldSeed::new(6));
        let mut rec = RecordingPresentation::new();
        let mut loader = BulkLoader::new([2, 2], vec!["Raising hills".to_string()], WorldSeed::new(6));

        // total 14 -> interval 1: every reported tick carries a status.
        loader.tick(&mut store, &gen, &mut rng, &mut rec);
        let reports = rec.progress_reports();
        assert_eq!(reports[0].status.as_deref(), Some("Raising hills"));
    }
}
