//! # World Generation Error Types
//!
//! Every failure the generator can report. All of them surface while the
//! world is being initialised; once a `World` exists, generation is
//! infallible.

use thiserror::Error;

/// Errors raised while loading or validating a world description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldGenError {
    /// The configuration file could not be read.
    #[error("cannot read world config {path}: {reason}")]
    ConfigRead {
        /// Path that was requested.
        path: String,
        /// Underlying I/O message.
        reason: String,
    },

    /// The configuration file is not valid TOML for a world description.
    #[error("cannot parse world config: {0}")]
    ConfigParse(String),

    /// The default-tile list is empty; the classifier needs a fallback tile.
    #[error("default tile list is empty")]
    EmptyDefaultTiles,

    /// A biome layer declares no tile variants.
    #[error("biome layer `{layer}` has no tile variants")]
    EmptyLayerVariants {
        /// Name of the offending layer.
        layer: String,
    },

    /// Zero octaves leaves nothing to normalise against.
    #[error("noise octave count must be at least 1")]
    ZeroOctaves,

    /// The amplitude series sums to something the normaliser cannot divide by.
    #[error("noise amplitudes sum to {max_possible_height}, cannot normalise heights")]
    DegenerateNormalization {
        /// Sum of the per-octave amplitudes, formatted.
        max_possible_height: String,
    },

    /// A noise parameter is non-finite or outside its usable range.
    #[error("invalid noise parameter {name} = {value}")]
    InvalidNoiseParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value, formatted.
        value: String,
    },

    /// Chunks must hold at least one cell.
    #[error("chunk size must be at least 1, got {0}")]
    InvalidChunkSize(u32),

    /// The bulk-load extent must be at least one chunk on each axis.
    #[error("world size must be at least 1x1 chunks, got {x}x{y}")]
    InvalidWorldSize {
        /// Requested width in chunks.
        x: u32,
        /// Requested height in chunks.
        y: u32,
    },

    /// A percentage chance lies outside `[0, 100]`.
    #[error("{field} must be within 0..=100, got {value}")]
    ChanceOutOfRange {
        /// Which chance was wrong.
        field: String,
        /// Offending value.
        value: u32,
    },

    /// A layer depth threshold lies outside `[0, 1]`.
    #[error("biome layer `{layer}` depth must be within 0..=1, got {depth}")]
    DepthOutOfRange {
        /// Name of the offending layer.
        layer: String,
        /// Offending depth, formatted.
        depth: String,
    },

    /// Trees can spawn but no sprite variants are available to pick from.
    #[error("tree decorations need at least one {part} variant")]
    MissingTreeVariants {
        /// `"top"` or `"trunk"`.
        part: &'static str,
    },
}

/// Result type for world generation setup.
pub type WorldGenResult<T> = Result<T, WorldGenError>;
