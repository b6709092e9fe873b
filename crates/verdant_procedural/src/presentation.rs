//! # Presentation Boundary
//!
//! The generator never draws anything itself. Tile stamps, chunk visibility,
//! tree spawning and load progress are handed to a [`Presentation`]
//! implementation owned by the host. Every call is fire-and-forget except
//! [`Presentation::create_chunk_object`] and
//! [`Presentation::spawn_decoration`], whose opaque handles are stored for
//! later lookup only.

use crate::biome::{DecorationDirective, TileId};
use crate::chunk::{ChunkCoord, WorldPos};

/// Tile surfaces a host can draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Primary ground layer.
    Ground,
    /// Base layer under everything.
    Dirt,
    /// River layer.
    Water,
    /// Overlay next to rivers.
    Bank,
    /// Overlay for mountain tiles.
    Mountain,
}

/// Opaque handle to a host-side chunk object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PresentationHandle(pub u64);

/// Opaque handle to a host-side decoration object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecorationHandle(pub u64);

/// Bulk-load progress snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadProgress {
    /// Chunks generated so far.
    pub generated: usize,
    /// Chunks the bulk load will generate.
    pub total: usize,
    /// Status line, refreshed every tenth of the load.
    pub status: Option<String>,
}

impl LoadProgress {
    /// `generated / total`, within `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.generated as f64 / self.total as f64).min(1.0)
    }
}

/// Host-side collaborator for everything visual.
///
/// All methods default to doing nothing.
pub trait Presentation {
    /// Creates the host object for a freshly generated chunk.
    fn create_chunk_object(&mut self, _coord: ChunkCoord) -> Option<PresentationHandle> {
        None
    }

    /// Shows or hides a chunk object.
    fn set_chunk_visible(&mut self, _coord: ChunkCoord, _handle: PresentationHandle, _visible: bool) {}

    /// Draws `tile` at a world cell on a surface.
    fn stamp(&mut self, _surface: Surface, _position: WorldPos, _tile: &TileId) {}

    /// Spawns a tree.
    fn spawn_decoration(
        &mut self,
        _coord: ChunkCoord,
        _directive: &DecorationDirective,
    ) -> Option<DecorationHandle> {
        None
    }

    /// Reports bulk-load progress.
    fn report_progress(&mut self, _progress: &LoadProgress) {}

    /// Called once when the bulk load has finished.
    fn loading_finished(&mut self) {}
}

/// Presentation that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Headless;

impl Presentation for Headless {}

/// Everything a [`RecordingPresentation`] observed.
#[derive(Clone, Debug, PartialEq)]
pub enum PresentationEvent {
    /// A chunk object was created.
    Created(ChunkCoord),
    /// A chunk was shown (`true`) or hidden (`false`).
    Visibility(ChunkCoord, bool),
    /// A tile was stamped.
    Stamp(Surface, WorldPos, TileId),
    /// A tree was spawned.
    Decoration(ChunkCoord, DecorationDirective),
    /// Progress was reported.
    Progress(LoadProgress),
    /// The bulk load finished.
    LoadingFinished,
}

/// Presentation that records every call, handing out sequential handles.
#[derive(Clone, Debug, Default)]
pub struct RecordingPresentation {
    events: Vec<PresentationEvent>,
    next_handle: u64,
}

impl RecordingPresentation {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[PresentationEvent] {
        &self.events
    }

    /// Drops recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Visibility changes only.
    #[must_use]
    pub fn visibility_changes(&self) -> Vec<(ChunkCoord, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::Visibility(coord, visible) => Some((*coord, *visible)),
                _ => None,
            })
            .collect()
    }

    /// Stamps on one surface only.
    #[must_use]
    pub fn stamps_on(&self, surface: Surface) -> Vec<(WorldPos, TileId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::Stamp(s, pos, tile) if *s == surface => Some((*pos, tile.clone())),
                _ => None,
            })
            .collect()
    }

    /// Progress reports only.
    #[must_use]
    pub fn progress_reports(&self) -> Vec<LoadProgress> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::Progress(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl Presentation for RecordingPresentation {
    fn create_chunk_object(&mut self, coord: ChunkCoord) -> Option<PresentationHandle> {
        self.events.push(PresentationEvent::Created(coord));
        Some(PresentationHandle(self.handle()))
    }

    fn set_chunk_visible(&mut self, coord: ChunkCoord, _handle: PresentationHandle, visible: bool) {
        self.events.push(PresentationEvent::Visibility(coord, visible));
    }

    fn stamp(&mut self, surface: Surface, position: WorldPos, tile: &TileId) {
        self.events
            .push(PresentationEvent::Stamp(surface, position, tile.clone()));
    }

    fn spawn_decoration(
        &mut self,
        coord: ChunkCoord,
        directive: &DecorationDirective,
    ) -> Option<DecorationHandle> {
        self.events
            .push(PresentationEvent::Decoration(coord, *directive));
        Some(DecorationHandle(self.handle()))
    }

    fn report_progress(&mut self, progress: &LoadProgress) {
        self.events.push(PresentationEvent::Progress(progress.clone()));
    }

    fn loading_finished(&mut self) {
        self.events.push(PresentationEvent::LoadingFinished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        let p = LoadProgress {
            generated: 5,
            total: 20,
            status: None,
        };
        assert!((p.fraction() - 0.25).abs() < 1e-12);
        let done = LoadProgress {
            generated: 0,
            total: 0,
            status: None,
        };
        assert!((done.fraction() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_recorder_hands_out_distinct_handles() {
        let mut rec = RecordingPresentation::new();
        let a = rec.create_chunk_object(ChunkCoord::new(0, 0));
        let b = rec.create_chunk_object(ChunkCoord::new(1, 0));
        assert_ne!(a, b);
        assert_eq!(rec.events().len(), 2);
    }

    #[test]
    fn test_headless_creates_nothing() {
        let mut headless = Headless;
        assert!(headless.create_chunk_object(ChunkCoord::new(4, 4)).is_none());
    }
}
