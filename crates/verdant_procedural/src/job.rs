//! # Per-Chunk Height Job
//!
//! Fills one chunk's height buffer as a single fork-join unit. Each worker
//! owns a disjoint band of `x` rows, so no synchronisation is needed; the
//! caller blocks until every band is done and then clamps the buffer.

use std::sync::Arc;
use std::thread;

use crate::chunk::ChunkCoord;
use crate::noise::NoiseField;

/// Parallel height sampling for one chunk.
#[derive(Clone)]
pub struct GenerationJob {
    field: Arc<NoiseField>,
    chunk_size: u32,
    workers: usize,
}

impl GenerationJob {
    /// Creates a job. `workers == 0` uses the machine's available
    /// parallelism.
    #[must_use]
    pub fn new(field: Arc<NoiseField>, chunk_size: u32, workers: usize) -> Self {
        let workers = if workers == 0 {
            thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            workers
        };
        Self {
            field,
            chunk_size,
            workers,
        }
    }

    /// Noise field sampled by this job.
    #[must_use]
    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    /// Worker threads used per chunk.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Samples every cell of `coord`, laid out `x * size + y`, with the
    /// lower bound clamped to 0.
    #[must_use]
    pub fn run(&self, coord: ChunkCoord) -> Vec<f64> {
        let size = self.chunk_size as usize;
        let mut buffer = vec![0.0; size * size];
        if size == 0 {
            return buffer;
        }

        let origin = coord.origin(self.chunk_size);
        let workers = self.workers.clamp(1, size);
        let rows_per_worker = size.div_ceil(workers);
        let field = self.field.as_ref();

        thread::scope(|s| {
            for (band, slots) in buffer.chunks_mut(rows_per_worker * size).enumerate() {
                let first_row = band * rows_per_worker;
                s.spawn(move || {
                    for (i, slot) in slots.iter_mut().enumerate() {
                        let x = first_row + i / size;
                        let y = i % size;
                        let wx = origin.x.wrapping_add(x as i32);
                        let wy = origin.y.wrapping_add(y as i32);
                        *slot = field.sample_height(wx, wy);
                    }
                });
            }
        });

        clamp_lower(&mut buffer);
        buffer
    }
}

/// Replaces negative samples with 0 in place. Values above 1 are kept.
pub fn clamp_lower(samples: &mut [f64]) {
    for sample in samples {
        if *sample < 0.0 {
            *sample = 0.0;
        }
    }
}
