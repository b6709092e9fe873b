//! # Neighbourhood Streamer
//!
//! Keeps a fixed, wide-aspect set of chunks active around the viewer's
//! chunk. Moving to a new chunk deactivates the whole old set first and only
//! then activates the new one, so observers never see a mix of the two.

use crate::chunk::ChunkCoord;
use crate::generator::ChunkGenerator;
use crate::presentation::Presentation;
use crate::random::SpawnRng;
use crate::store::ChunkStore;

/// Active neighbourhood, relative to the centre chunk: five chunks across
/// in X, three in Y. The order is the activation order.
pub const NEIGHBORHOOD_OFFSETS: [(i32, i32); 15] = [
    (0, 1),
    (0, -1),
    (2, 0),
    (1, 0),
    (-2, 0),
    (-1, 0),
    (0, 0),
    (-2, -1),
    (-1, -1),
    (-1, 1),
    (-2, 1),
    (2, -1),
    (1, -1),
    (1, 1),
    (2, 1),
];

/// Tracks the active neighbourhood.
#[derive(Debug, Default)]
pub struct Streamer {
    center: Option<ChunkCoord>,
    active: Vec<ChunkCoord>,
    swaps: u64,
}

impl Streamer {
    /// Creates a streamer with nothing active.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Centre of the current neighbourhood.
    #[must_use]
    pub const fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    /// Active chunks, in activation order.
    #[must_use]
    pub fn active(&self) -> &[ChunkCoord] {
        &self.active
    }

    /// Number of neighbourhood recomputations so far.
    #[must_use]
    pub const fn swaps(&self) -> u64 {
        self.swaps
    }

    /// Makes the neighbourhood around `center` the active set.
    ///
    /// Does nothing if `center` is already the current centre. Missing
    /// chunks are generated on the way. Returns whether the set changed.
    pub fn set_active_neighborhood<R, P>(
        &mut self,
        center: ChunkCoord,
        store: &mut ChunkStore,
        generator: &ChunkGenerator,
        rng: &mut R,
        presentation: &mut P,
    ) -> bool
    where
        R: SpawnRng + ?Sized,
        P: Presentation + ?Sized,
    {
        if self.center == Some(center) {
            return false;
        }

        for coord in self.active.drain(..) {
            if let Some(chunk) = store.get_mut(coord) {
                chunk.set_active(false, presentation);
            }
        }

        for (dx, dy) in NEIGHBORHOOD_OFFSETS {
            let coord = center.offset(dx, dy);
            let chunk = store.get_or_create(coord, generator, rng, presentation);
            chunk.set_active(true, presentation);
            self.active.push(coord);
        }

        tracing::trace!("Neighbourhood moved to {} ({} chunks active)", center, self.active.len());
        self.center = Some(center);
        self.swaps += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_offsets_are_distinct() {
        let set: HashSet<_> = NEIGHBORHOOD_OFFSETS.iter().collect();
        assert_eq!(set.len(), 15);
    }

    #[test]
    fn test_offsets_wider_in_x() {
        let max_x = NEIGHBORHOOD_OFFSETS.iter().map(|o| o.0.abs()).max();
        let max_y = NEIGHBORHOOD_OFFSETS.iter().map(|o| o.1.abs()).max();
        assert_eq!(max_x, Some(2));
        assert_eq!(max_y, Some(1));
        for corner in [(2, 2), (-2, 2), (2, -2), (-2, -2)] {
            assert!(!NEIGHBORHOOD_OFFSETS.contains(&corner));
        }
    }
}
