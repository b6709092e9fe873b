//! # Chunk System
//!
//! The world is split into square chunks of `size x size` cells, the unit
//! of generation and streaming.
//!
//! ## Coordinates
//!
//! Chunks are centred on the world origin rather than corner-aligned:
//! the first cell of chunk `(cx, cy)` sits at
//! `trunc(cx * size - size / 2)` on each axis, so chunk `(0, 0)` straddles
//! `(0, 0)`.
//!
//! ## Lifecycle
//!
//! A chunk is created once, filled once, and then only toggles between
//! [`ChunkState::ResidentInactive`] and [`ChunkState::ResidentActive`].
//! Nothing ever unloads it.

use std::fmt;

use crate::biome::TileId;
use crate::presentation::{DecorationHandle, Presentation, PresentationHandle};

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not cells).
    pub x: i32,
    /// Y coordinate (in chunks, not cells).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this coordinate shifted by `(dx, dy)` chunks.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
        }
    }

    /// World position of this chunk's first cell:
    /// `trunc(c * size - size / 2)` per axis.
    #[must_use]
    pub fn origin(self, size: u32) -> WorldPos {
        let size = f64::from(size);
        let axis = |c: i32| (f64::from(c) * size - size / 2.0).trunc() as i32;
        WorldPos::new(axis(self.x), axis(self.y))
    }

    /// Chunk under a continuous world point.
    ///
    /// Each axis rounds half a chunk away from zero before truncating:
    /// `trunc((v + size/2) / size)` for `v >= 0`, and
    /// `trunc((v - size/2) / size)` otherwise, with integer `size/2`.
    #[must_use]
    pub fn from_world_point(point: WorldPoint, size: u32) -> Self {
        Self {
            x: chunk_axis(point.x, size),
            y: chunk_axis(point.y, size),
        }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn chunk_axis(v: f64, size: u32) -> i32 {
    let half = f64::from(size / 2);
    let size = f64::from(size.max(1));
    let shifted = if v >= 0.0 { v + half } else { v - half };
    (shifted / size).trunc() as i32
}

/// Integer world cell position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WorldPos {
    /// X in cells.
    pub x: i32,
    /// Y in cells.
    pub y: i32,
}

impl WorldPos {
    /// Creates a world cell position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Continuous world position, e.g. a viewer or a cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPoint {
    /// X in cells.
    pub x: f64,
    /// Y in cells.
    pub y: f64,
}

impl WorldPoint {
    /// Creates a world point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The cell containing this point.
    #[must_use]
    pub fn cell(self) -> WorldPos {
        WorldPos::new(self.x.floor() as i32, self.y.floor() as i32)
    }
}

/// One grid unit of a chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    local_x: usize,
    local_y: usize,
    world_position: WorldPos,
    sample: f64,
    tile: Option<TileId>,
    passable: bool,
    decoration: Option<DecorationHandle>,
}

impl Cell {
    fn new(local_x: usize, local_y: usize, world_position: WorldPos, sample: f64) -> Self {
        Self {
            local_x,
            local_y,
            world_position,
            sample,
            tile: None,
            passable: true,
            decoration: None,
        }
    }

    /// Local index inside the chunk.
    #[must_use]
    pub const fn local(&self) -> (usize, usize) {
        (self.local_x, self.local_y)
    }

    /// World cell position.
    #[must_use]
    pub const fn world_position(&self) -> WorldPos {
        self.world_position
    }

    /// Height sample; never negative, possibly above 1.
    #[must_use]
    pub const fn sample(&self) -> f64 {
        self.sample
    }

    /// Assigned tile, if classified.
    #[must_use]
    pub const fn tile(&self) -> Option<&TileId> {
        self.tile.as_ref()
    }

    /// Assigns the tile unless one is already set. Returns whether it was
    /// assigned.
    pub fn assign_tile(&mut self, tile: TileId) -> bool {
        if self.tile.is_some() {
            return false;
        }
        self.tile = Some(tile);
        true
    }

    /// Walkability flag.
    #[must_use]
    pub const fn passable(&self) -> bool {
        self.passable
    }

    /// Sets the walkability flag.
    pub fn set_passable(&mut self, passable: bool) {
        self.passable = passable;
    }

    /// Handle of the decoration standing on this cell.
    #[must_use]
    pub const fn decoration(&self) -> Option<DecorationHandle> {
        self.decoration
    }

    /// Records the decoration standing on this cell.
    pub fn set_decoration(&mut self, handle: DecorationHandle) {
        self.decoration = Some(handle);
    }
}

/// Residency of a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Generated, hidden.
    #[default]
    ResidentInactive,
    /// Generated, part of the active neighbourhood.
    ResidentActive,
}

/// A chunk of world data.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    size: usize,
    /// Indexed as `x * size + y`.
    cells: Vec<Cell>,
    state: ChunkState,
    presentation: Option<PresentationHandle>,
}

impl Chunk {
    /// Creates a chunk with every sample at 0.
    #[must_use]
    pub fn new(coord: ChunkCoord, size: u32) -> Self {
        Self::from_heights(coord, size, &[])
    }

    /// Creates a chunk from a height buffer laid out `x * size + y`.
    ///
    /// Missing samples read as 0.
    #[must_use]
    pub fn from_heights(coord: ChunkCoord, size: u32, heights: &[f64]) -> Self {
        let n = size as usize;
        let origin = coord.origin(size);
        let mut cells = Vec::with_capacity(n * n);
        for x in 0..n {
            for y in 0..n {
                let sample = heights.get(x * n + y).copied().unwrap_or(0.0);
                let world = WorldPos::new(
                    origin.x.wrapping_add(x as i32),
                    origin.y.wrapping_add(y as i32),
                );
                cells.push(Cell::new(x, y, world, sample));
            }
        }
        Self {
            coord,
            size: n,
            cells,
            state: ChunkState::ResidentInactive,
            presentation: None,
        }
    }

    /// Chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Cells per edge.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Current residency.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ChunkState {
        self.state
    }

    /// True while in the active neighbourhood.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ChunkState::ResidentActive
    }

    /// Host object for this chunk, if the presentation created one.
    #[must_use]
    pub const fn presentation(&self) -> Option<PresentationHandle> {
        self.presentation
    }

    /// Records the host object for this chunk.
    pub fn set_presentation(&mut self, handle: Option<PresentationHandle>) {
        self.presentation = handle;
    }

    /// Cell at a local index, or `None` outside the chunk.
    #[must_use]
    pub fn cell_at(&self, local_x: usize, local_y: usize) -> Option<&Cell> {
        if local_x < self.size && local_y < self.size {
            self.cells.get(local_x * self.size + local_y)
        } else {
            None
        }
    }

    /// Mutable cell at a local index, or `None` outside the chunk.
    pub fn cell_at_mut(&mut self, local_x: usize, local_y: usize) -> Option<&mut Cell> {
        if local_x < self.size && local_y < self.size {
            self.cells.get_mut(local_x * self.size + local_y)
        } else {
            None
        }
    }

    /// All cells, `x` major.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// World position of the first cell.
    #[must_use]
    pub fn origin(&self) -> WorldPos {
        self.coord.origin(self.size as u32)
    }

    /// World position of a local index. Indices outside the chunk
    /// extrapolate linearly.
    #[must_use]
    pub fn world_position_of(&self, local_x: usize, local_y: usize) -> WorldPos {
        let origin = self.origin();
        WorldPos::new(
            origin.x.wrapping_add(local_x as i32),
            origin.y.wrapping_add(local_y as i32),
        )
    }

    /// True if the world cell lies inside this chunk.
    #[must_use]
    pub fn contains_world_position(&self, pos: WorldPos) -> bool {
        let origin = self.origin();
        let size = i64::try_from(self.size).unwrap_or(i64::MAX);
        let dx = i64::from(pos.x) - i64::from(origin.x);
        let dy = i64::from(pos.y) - i64::from(origin.y);
        (0..size).contains(&dx) && (0..size).contains(&dy)
    }

    /// Local index a world cell maps to, wrapping with floor-modulo on both
    /// axes. Positions outside the chunk wrap onto it.
    #[must_use]
    pub fn cell_index_from_world(&self, pos: WorldPos) -> (usize, usize) {
        let origin = self.origin();
        let size = i64::try_from(self.size.max(1)).unwrap_or(i64::MAX);
        let lx = (i64::from(pos.x) - i64::from(origin.x)).rem_euclid(size);
        let ly = (i64::from(pos.y) - i64::from(origin.y)).rem_euclid(size);
        (lx as usize, ly as usize)
    }

    /// Cell at a world position, or `None` if it lies in another chunk.
    #[must_use]
    pub fn cell_from_world(&self, pos: WorldPos) -> Option<&Cell> {
        if !self.contains_world_position(pos) {
            return None;
        }
        let (lx, ly) = self.cell_index_from_world(pos);
        self.cell_at(lx, ly)
    }

    /// Activates or deactivates the chunk and forwards the visibility to
    /// the host object. Cell data is never touched. Returns whether the
    /// state changed.
    pub fn set_active<P: Presentation + ?Sized>(&mut self, active: bool, presentation: &mut P) -> bool {
        let next = if active {
            ChunkState::ResidentActive
        } else {
            ChunkState::ResidentInactive
        };
        if let Some(handle) = self.presentation {
            presentation.set_chunk_visible(self.coord, handle, active);
        }
        let changed = self.state != next;
        self.state = next;
        changed
    }

    /// Height samples, `x * size + y`.
    #[must_use]
    pub fn samples(&self) -> Vec<f64> {
        self.cells.iter().map(Cell::sample).collect()
    }
}
