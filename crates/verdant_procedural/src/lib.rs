//! # Verdant Procedural Generation
//!
//! Deterministic, chunked 2D world generation with viewer streaming.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and config always produce the same world
//! 2. **Chunked**: The world is generated in fixed-size square chunks
//! 3. **Streamed**: Only a small neighbourhood around the viewer is active
//! 4. **Amortised**: The starting world loads one chunk per host tick
//!
//! ## Core Components
//!
//! - `NoiseField`: height and river samplers
//! - `BiomeClassifier`: ordered-priority tile selection
//! - `Chunk`: cell grid and coordinate mapping
//! - `GenerationJob`: parallel per-chunk height sampling
//! - `ChunkStore` / `Streamer` / `BulkLoader`: chunk lifecycle
//! - `World`: everything above behind one owner
//!
//! ## Example
//!
//! ```rust
//! use verdant_procedural::{Headless, World, WorldConfig, WorldPhase};
//!
//! let config = WorldConfig {
//!     seed: "example".to_string(),
//!     chunk_size: 8,
//!     world_size: [2, 2],
//!     ..WorldConfig::default()
//! };
//! let mut world = World::new(config, Headless).unwrap();
//! while world.tick(None) == WorldPhase::Loading {}
//! assert!(world.stats().chunks_generated >= 14);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_precision_loss)]

pub mod biome;
pub mod bulk_load;
pub mod chunk;
pub mod config;
pub mod error;
pub mod generator;
pub mod job;
pub mod noise;
pub mod presentation;
pub mod random;
pub mod store;
pub mod streamer;
pub mod world;

pub use biome::{BiomeClassifier, BiomeLayer, Classification, DecorationDirective, TileId};
pub use bulk_load::{total_chunks, BulkLoader, BulkStatus};
pub use chunk::{Cell, Chunk, ChunkCoord, ChunkState, WorldPoint, WorldPos};
pub use config::{BiomeLayerConfig, DecorationConfig, NoiseConfig, RiverConfig, TileSet, WorldConfig};
pub use error::{WorldGenError, WorldGenResult};
pub use generator::{ChunkGenerator, PaintSummary};
pub use job::{clamp_lower, GenerationJob};
pub use noise::{NoiseField, NoiseOffsets, RiverMask, SimplexNoise, WorldSeed};
pub use presentation::{
    DecorationHandle, Headless, LoadProgress, Presentation, PresentationEvent, PresentationHandle,
    RecordingPresentation, Surface,
};
pub use random::{random_seed_phrase, ScriptedRng, SpawnRng, WorldRandom};
pub use store::ChunkStore;
pub use streamer::{Streamer, NEIGHBORHOOD_OFFSETS};
pub use world::{CellReport, World, WorldPhase, WorldStats};
