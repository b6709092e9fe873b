//! # Chunk Store
//!
//! Owns every chunk ever generated, keyed by coordinate. Chunks are
//! created on first request and never removed.

use std::collections::HashMap;

use crate::chunk::{Chunk, ChunkCoord};
use crate::generator::ChunkGenerator;
use crate::presentation::Presentation;
use crate::random::SpawnRng;

/// Create-on-miss chunk dictionary.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl ChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chunk at `coord`, generating it on the first request.
    ///
    /// Later calls return the same chunk untouched; nothing is regenerated
    /// and no random draws are taken.
    pub fn get_or_create<R, P>(
        &mut self,
        coord: ChunkCoord,
        generator: &ChunkGenerator,
        rng: &mut R,
        presentation: &mut P,
    ) -> &mut Chunk
    where
        R: SpawnRng + ?Sized,
        P: Presentation + ?Sized,
    {
        self.chunks
            .entry(coord)
            .or_insert_with(|| generator.generate(coord, rng, presentation))
    }

    /// Chunk at `coord`, if it was ever generated.
    #[must_use]
    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Mutable chunk at `coord`, if it was ever generated.
    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// True if `coord` was generated.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of generated chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True before any chunk exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Every generated chunk, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&ChunkCoord, &Chunk)> {
        self.chunks.iter()
    }
}
