//! # World Configuration
//!
//! Everything a world needs is loaded once, validated once, and treated as
//! immutable afterwards. Descriptions live in TOML files:
//!
//! ```toml
//! seed = "meadow"
//! chunk_size = 32
//! world_size = [8, 8]
//! default_tiles = ["grass_a", "grass_b"]
//!
//! [noise]
//! scale = 100.0
//! octaves = 5
//!
//! [[layers]]
//! name = "Woods"
//! depth = 0.55
//! spawn_chance = 100
//! tiles = ["forest_floor"]
//! ```
//!
//! Omitted fields fall back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{WorldGenError, WorldGenResult};

/// Height noise parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// World units per noise unit at the first octave.
    pub scale: f64,
    /// Number of octaves summed.
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Amplitude of the first octave.
    pub base_amplitude: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: 100.0,
            octaves: 5,
            persistence: 2.0,
            lacunarity: 2.0,
            base_amplitude: 1.0,
        }
    }
}

impl NoiseConfig {
    /// Sum of the amplitude series; independent of position.
    #[must_use]
    pub fn max_possible_height(&self) -> f64 {
        let mut total = 0.0;
        let mut amplitude = self.base_amplitude;
        for _ in 0..self.octaves {
            total += amplitude;
            amplitude *= self.persistence;
        }
        total
    }

    /// Checks that the parameters can produce normalised heights.
    ///
    /// # Errors
    ///
    /// Zero octaves, non-finite parameters, a non-positive scale, or an
    /// amplitude series that sums to zero (or below).
    pub fn validate(&self) -> WorldGenResult<()> {
        if self.octaves == 0 {
            return Err(WorldGenError::ZeroOctaves);
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(invalid_noise("scale", self.scale));
        }
        if !self.persistence.is_finite() {
            return Err(invalid_noise("persistence", self.persistence));
        }
        if !self.lacunarity.is_finite() {
            return Err(invalid_noise("lacunarity", self.lacunarity));
        }
        if !self.base_amplitude.is_finite() {
            return Err(invalid_noise("base_amplitude", self.base_amplitude));
        }

        let max = self.max_possible_height();
        if !(max.is_finite() && max > 0.0) {
            return Err(WorldGenError::DegenerateNormalization {
                max_possible_height: max.to_string(),
            });
        }
        Ok(())
    }
}

/// River mask parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    /// World coordinates are divided by this before the cellular lookup.
    pub coordinate_divisor: f64,
    /// Base frequency of the river noises.
    pub frequency: f64,
    /// Fractal octaves for the warp and the fbm term.
    pub octaves: u32,
    /// Frequency multiplier per fractal octave.
    pub lacunarity: f64,
    /// Amplitude multiplier per fractal octave.
    pub gain: f64,
    /// Strength of the domain warp.
    pub perturb_amplitude: f64,
    /// Samples above this value are river.
    pub threshold: f64,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            coordinate_divisor: 5.0,
            frequency: 0.02,
            octaves: 5,
            lacunarity: 2.0,
            gain: 0.5,
            perturb_amplitude: 30.0,
            threshold: 0.82,
        }
    }
}

impl RiverConfig {
    /// Checks the river parameters.
    ///
    /// # Errors
    ///
    /// A non-positive divisor or any non-finite parameter.
    pub fn validate(&self) -> WorldGenResult<()> {
        if !(self.coordinate_divisor.is_finite() && self.coordinate_divisor > 0.0) {
            return Err(invalid_noise("river.coordinate_divisor", self.coordinate_divisor));
        }
        for (name, value) in [
            ("river.frequency", self.frequency),
            ("river.lacunarity", self.lacunarity),
            ("river.gain", self.gain),
            ("river.perturb_amplitude", self.perturb_amplitude),
            ("river.threshold", self.threshold),
        ] {
            if !value.is_finite() {
                return Err(invalid_noise(name, value));
            }
        }
        Ok(())
    }
}

/// Fixed tiles and reserved layer names used outside the layer table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSet {
    /// Tile assigned to river cells.
    pub water: String,
    /// Overlay stamped next to water on the bank surface.
    pub bank: String,
    /// Tile stamped on the dirt surface under every cell.
    pub base_dirt: String,
    /// Layer whose tiles go to the mountain overlay.
    pub mountain_layer: String,
}

impl Default for TileSet {
    fn default() -> Self {
        Self {
            water: "water".to_string(),
            bank: "bank".to_string(),
            base_dirt: "dirt".to_string(),
            mountain_layer: "Mountain".to_string(),
        }
    }
}

/// Tree decoration parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Percentage chance of a tree on a woods cell.
    pub tree_spawn_chance: u32,
    /// Layer whose cells may grow trees.
    pub woods_layer: String,
    /// Number of tree-top sprite variants.
    pub top_variants: u32,
    /// Number of trunk sprite variants.
    pub trunk_variants: u32,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            tree_spawn_chance: 45,
            woods_layer: "Woods".to_string(),
            top_variants: 3,
            trunk_variants: 2,
        }
    }
}

/// One authored biome layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeLayerConfig {
    /// Layer name; `"Woods"` and `"Mountain"` carry extra behaviour.
    pub name: String,
    /// Matches heights at or above this threshold.
    pub depth: f64,
    /// Percentage chance that a matching cell takes one of the layer's tiles.
    pub spawn_chance: u32,
    /// Tile variants.
    pub tiles: Vec<String>,
}

impl Default for BiomeLayerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            depth: 0.0,
            spawn_chance: 100,
            tiles: Vec::new(),
        }
    }
}

/// Complete description of a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed phrase; empty means "pick one at random".
    pub seed: String,
    /// Cells per chunk edge.
    pub chunk_size: u32,
    /// Bulk-load extent in chunks, `[x, y]`.
    pub world_size: [u32; 2],
    /// Worker threads for per-chunk height sampling; 0 uses every core.
    pub workers: usize,
    /// Height noise.
    pub noise: NoiseConfig,
    /// River mask.
    pub river: RiverConfig,
    /// Fixed tiles.
    pub tiles: TileSet,
    /// Trees.
    pub decoration: DecorationConfig,
    /// Fallback tiles, one picked at random per land cell.
    pub default_tiles: Vec<String>,
    /// Layers in priority order; the first whose depth matches wins.
    pub layers: Vec<BiomeLayerConfig>,
    /// Status lines shown while the world loads.
    pub loading_blurbs: Vec<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: String::new(),
            chunk_size: 75,
            world_size: [32, 32],
            workers: 0,
            noise: NoiseConfig::default(),
            river: RiverConfig::default(),
            tiles: TileSet::default(),
            decoration: DecorationConfig::default(),
            default_tiles: vec![
                "grass_a".to_string(),
                "grass_b".to_string(),
                "grass_c".to_string(),
            ],
            layers: vec![
                BiomeLayerConfig {
                    name: "Mountain".to_string(),
                    depth: 0.85,
                    spawn_chance: 100,
                    tiles: vec!["rock".to_string()],
                },
                BiomeLayerConfig {
                    name: "Woods".to_string(),
                    depth: 0.55,
                    spawn_chance: 100,
                    tiles: vec!["forest_floor".to_string()],
                },
                BiomeLayerConfig {
                    name: "Meadow".to_string(),
                    depth: 0.3,
                    spawn_chance: 35,
                    tiles: vec![
                        "meadow_a".to_string(),
                        "meadow_b".to_string(),
                        "meadow_c".to_string(),
                    ],
                },
            ],
            loading_blurbs: vec![
                "Carving rivers...".to_string(),
                "Planting forests...".to_string(),
                "Raising mountains...".to_string(),
                "Scattering wildflowers...".to_string(),
            ],
        }
    }
}

impl WorldConfig {
    /// Parses a TOML world description. The result is not yet validated.
    ///
    /// # Errors
    ///
    /// Returns [`WorldGenError::ConfigParse`] for malformed TOML or
    /// mistyped fields.
    pub fn from_toml_str(source: &str) -> WorldGenResult<Self> {
        toml::from_str(source).map_err(|e| WorldGenError::ConfigParse(e.to_string()))
    }

    /// Reads and parses a TOML world description from disk.
    ///
    /// # Errors
    ///
    /// Returns [`WorldGenError::ConfigRead`] if the file cannot be read, or
    /// [`WorldGenError::ConfigParse`] if it is not a valid description.
    pub fn from_file(path: impl AsRef<Path>) -> WorldGenResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| WorldGenError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Serialises the description back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`WorldGenError::ConfigParse`] if serialisation fails.
    pub fn to_toml_string(&self) -> WorldGenResult<String> {
        toml::to_string_pretty(self).map_err(|e| WorldGenError::ConfigParse(e.to_string()))
    }

    /// Total chunks the bulk load must produce:
    /// `x*y + 3x + 2y`, which over-provisions the border.
    #[must_use]
    pub fn total_bulk_chunks(&self) -> usize {
        crate::bulk_load::total_chunks(self.world_size)
    }

    /// Validates the whole description.
    ///
    /// # Errors
    ///
    /// The first configuration problem found; see [`WorldGenError`].
    pub fn validate(&self) -> WorldGenResult<()> {
        if self.chunk_size == 0 {
            return Err(WorldGenError::InvalidChunkSize(self.chunk_size));
        }
        let [wx, wy] = self.world_size;
        if wx == 0 || wy == 0 {
            return Err(WorldGenError::InvalidWorldSize { x: wx, y: wy });
        }

        self.noise.validate()?;
        self.river.validate()?;

        if self.default_tiles.is_empty() {
            return Err(WorldGenError::EmptyDefaultTiles);
        }

        for layer in &self.layers {
            if layer.tiles.is_empty() {
                return Err(WorldGenError::EmptyLayerVariants {
                    layer: layer.name.clone(),
                });
            }
            if !(0.0..=1.0).contains(&layer.depth) {
                return Err(WorldGenError::DepthOutOfRange {
                    layer: layer.name.clone(),
                    depth: layer.depth.to_string(),
                });
            }
            check_chance(&format!("layers.{}.spawn_chance", layer.name), layer.spawn_chance)?;
        }

        let decoration = &self.decoration;
        check_chance("decoration.tree_spawn_chance", decoration.tree_spawn_chance)?;
        let has_woods = self.layers.iter().any(|l| l.name == decoration.woods_layer);
        if has_woods {
            if decoration.top_variants == 0 {
                return Err(WorldGenError::MissingTreeVariants { part: "top" });
            }
            if decoration.trunk_variants == 0 {
                return Err(WorldGenError::MissingTreeVariants { part: "trunk" });
            }
        }

        Ok(())
    }
}

fn check_chance(field: &str, value: u32) -> WorldGenResult<()> {
    if value > 100 {
        return Err(WorldGenError::ChanceOutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn invalid_noise(name: &'static str, value: f64) -> WorldGenError {
    WorldGenError::InvalidNoiseParameter {
        name,
        value: value.to_string(),
    }
}
