//! # Biome Classification
//!
//! Turns a height sample into a tile choice.
//!
//! Layers are authored in priority order and are never sorted: the first
//! layer whose depth threshold lies at or below the sample wins. A matched
//! layer still has to win a spawn roll, otherwise the cell keeps the
//! default tile that was drawn before the scan.
//!
//! Two layer names carry extra behaviour:
//! - the woods layer may emit a tree [`DecorationDirective`];
//! - the mountain layer puts its tile on the mountain overlay and leaves the
//!   default tile on the ground.

use std::fmt;
use std::sync::Arc;

use crate::chunk::WorldPos;
use crate::config::{DecorationConfig, TileSet, WorldConfig};
use crate::error::{WorldGenError, WorldGenResult};
use crate::noise::RiverMask;
use crate::random::SpawnRng;

/// Identifier of a tile asset. Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileId(Arc<str>);

impl TileId {
    /// Creates a tile identifier.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Returns the tile name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TileId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One rule of the classifier.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeLayer {
    name: String,
    depth: f64,
    spawn_chance: u32,
    variants: Vec<TileId>,
}

impl BiomeLayer {
    /// Creates a layer.
    ///
    /// # Errors
    ///
    /// Fails if `variants` is empty, `depth` lies outside `[0, 1]` or
    /// `spawn_chance` exceeds 100.
    pub fn new(
        name: impl Into<String>,
        depth: f64,
        spawn_chance: u32,
        variants: Vec<TileId>,
    ) -> WorldGenResult<Self> {
        let name = name.into();
        if variants.is_empty() {
            return Err(WorldGenError::EmptyLayerVariants { layer: name });
        }
        if !(0.0..=1.0).contains(&depth) {
            return Err(WorldGenError::DepthOutOfRange {
                layer: name,
                depth: depth.to_string(),
            });
        }
        if spawn_chance > 100 {
            return Err(WorldGenError::ChanceOutOfRange {
                field: format!("layers.{name}.spawn_chance"),
                value: spawn_chance,
            });
        }
        Ok(Self {
            name,
            depth,
            spawn_chance,
            variants,
        })
    }

    /// Layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowest sample this layer matches.
    #[must_use]
    pub const fn depth(&self) -> f64 {
        self.depth
    }

    /// Percentage chance that a matching cell takes a layer tile.
    #[must_use]
    pub const fn spawn_chance(&self) -> u32 {
        self.spawn_chance
    }

    /// Tile variants; never empty.
    #[must_use]
    pub fn variants(&self) -> &[TileId] {
        &self.variants
    }
}

/// Request to place a tree on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecorationDirective {
    /// World cell the tree stands on.
    pub position: WorldPos,
    /// Mirror the tree top horizontally.
    pub flip: bool,
    /// Index into the tree-top sprites.
    pub top_variant: u32,
    /// Index into the trunk sprites.
    pub trunk_variant: u32,
    /// Draw order; trees further south draw on top.
    pub sort_order: i32,
}

/// Outcome of classifying one cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// River or river buffer.
    Water {
        /// Tile stored on the cell.
        tile: TileId,
        /// Overlay stamped on the bank surface.
        bank: TileId,
    },
    /// Dry land.
    Land {
        /// Tile stored on the cell.
        tile: TileId,
        /// Default candidate drawn before the layer scan.
        default_tile: TileId,
        /// Index of the matched layer, if any.
        layer: Option<usize>,
        /// The matched layer is the mountain layer.
        mountain: bool,
        /// Tree to spawn, if the woods roll succeeded.
        decoration: Option<DecorationDirective>,
    },
}

impl Classification {
    /// Tile stored on the cell.
    #[must_use]
    pub fn tile(&self) -> &TileId {
        match self {
            Self::Water { tile, .. } | Self::Land { tile, .. } => tile,
        }
    }

    /// Tree directive, if any.
    #[must_use]
    pub fn decoration(&self) -> Option<&DecorationDirective> {
        match self {
            Self::Land { decoration, .. } => decoration.as_ref(),
            Self::Water { .. } => None,
        }
    }

    /// True for water cells.
    #[must_use]
    pub const fn is_water(&self) -> bool {
        matches!(self, Self::Water { .. })
    }
}

/// Tree decoration rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TreeRules {
    spawn_chance: u32,
    top_variants: u32,
    trunk_variants: u32,
}

impl TreeRules {
    const fn from_config(decoration: &DecorationConfig) -> Self {
        Self {
            spawn_chance: decoration.tree_spawn_chance,
            top_variants: decoration.top_variants,
            trunk_variants: decoration.trunk_variants,
        }
    }
}

/// Ordered-priority tile classifier.
#[derive(Clone, Debug)]
pub struct BiomeClassifier {
    layers: Vec<BiomeLayer>,
    default_tiles: Vec<TileId>,
    water: TileId,
    bank: TileId,
    woods_layer: Option<usize>,
    mountain_layer: Option<usize>,
    trees: TreeRules,
}

impl BiomeClassifier {
    /// Creates a classifier with the default woods and mountain names.
    ///
    /// # Errors
    ///
    /// Fails if `default_tiles` is empty.
    pub fn new(
        layers: Vec<BiomeLayer>,
        default_tiles: Vec<TileId>,
        water: TileId,
        bank: TileId,
    ) -> WorldGenResult<Self> {
        if default_tiles.is_empty() {
            return Err(WorldGenError::EmptyDefaultTiles);
        }
        let decoration = DecorationConfig::default();
        let woods_layer = position_of(&layers, &decoration.woods_layer);
        let mountain_layer = position_of(&layers, &TileSet::default().mountain_layer);
        Ok(Self {
            layers,
            default_tiles,
            water,
            bank,
            woods_layer,
            mountain_layer,
            trees: TreeRules::from_config(&decoration),
        })
    }

    /// Builds the classifier described by a world configuration.
    ///
    /// # Errors
    ///
    /// Any problem [`WorldConfig::validate`] would report for the classifier
    /// inputs.
    pub fn from_config(config: &WorldConfig) -> WorldGenResult<Self> {
        let layers = config
            .layers
            .iter()
            .map(|layer| {
                BiomeLayer::new(
                    layer.name.clone(),
                    layer.depth,
                    layer.spawn_chance,
                    layer.tiles.iter().map(|t| TileId::new(t)).collect(),
                )
            })
            .collect::<WorldGenResult<Vec<_>>>()?;
        let default_tiles = config.default_tiles.iter().map(|t| TileId::new(t)).collect();

        let mut classifier = Self::new(
            layers,
            default_tiles,
            TileId::new(&config.tiles.water),
            TileId::new(&config.tiles.bank),
        )?;
        classifier.woods_layer = position_of(&classifier.layers, &config.decoration.woods_layer);
        classifier.mountain_layer = position_of(&classifier.layers, &config.tiles.mountain_layer);
        classifier.trees = TreeRules::from_config(&config.decoration);
        Ok(classifier)
    }

    /// Layers in priority order.
    #[must_use]
    pub fn layers(&self) -> &[BiomeLayer] {
        &self.layers
    }

    /// Index of the first layer whose depth is at or below `sample`.
    ///
    /// The sample is clamped to `[0, 1]` before matching.
    #[must_use]
    pub fn match_layer(&self, sample: f64) -> Option<usize> {
        let s = sample.clamp(0.0, 1.0);
        self.layers.iter().position(|layer| layer.depth <= s)
    }

    /// Classifies one cell.
    ///
    /// Water cells draw nothing. Land cells draw, in order: the default
    /// index, the layer spawn roll and (for multi-variant layers, on a
    /// successful roll) the variant index; woods cells then draw the tree
    /// roll and, on success, the flip flag, the top index and the trunk
    /// index.
    pub fn classify<R: SpawnRng + ?Sized>(
        &self,
        height: f64,
        river: RiverMask,
        position: WorldPos,
        rng: &mut R,
    ) -> Classification {
        if !river.is_clear() {
            return Classification::Water {
                tile: self.water.clone(),
                bank: self.bank.clone(),
            };
        }

        let defaults = self.default_tiles.len();
        let default_tile = self.default_tiles[rng.index(defaults).min(defaults - 1)].clone();
        let mut tile = default_tile.clone();

        let layer = self.match_layer(height);
        let mut decoration = None;

        if let Some(index) = layer {
            let matched = &self.layers[index];
            let roll = rng.percent();
            let succeeded = roll <= matched.spawn_chance;
            if succeeded {
                let count = matched.variants.len();
                let variant = if count > 1 { rng.index(count).min(count - 1) } else { 0 };
                tile = matched.variants[variant].clone();
            }

            if self.woods_layer == Some(index) {
                decoration = self.roll_tree(position, rng);
            }
        }

        Classification::Land {
            tile,
            default_tile,
            layer,
            mountain: layer.is_some() && layer == self.mountain_layer,
            decoration,
        }
    }

    fn roll_tree<R: SpawnRng + ?Sized>(
        &self,
        position: WorldPos,
        rng: &mut R,
    ) -> Option<DecorationDirective> {
        if rng.percent() > self.trees.spawn_chance {
            return None;
        }
        let flip = rng.range(0, 2) == 1;
        let top_variant = variant_roll(rng, self.trees.top_variants);
        let trunk_variant = variant_roll(rng, self.trees.trunk_variants);
        Some(DecorationDirective {
            position,
            flip,
            top_variant,
            trunk_variant,
            sort_order: position.y.saturating_neg(),
        })
    }
}

fn variant_roll<R: SpawnRng + ?Sized>(rng: &mut R, count: u32) -> u32 {
    let len = usize::try_from(count).unwrap_or(usize::MAX);
    u32::try_from(rng.index(len)).unwrap_or(0)
}

fn position_of(layers: &[BiomeLayer], name: &str) -> Option<usize> {
    layers.iter().position(|layer| layer.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRng;

    fn tiles(names: &[&str]) -> Vec<TileId> {
        names.iter().map(|n| TileId::new(n)).collect()
    }

    fn layer(name: &str, depth: f64, chance: u32, variants: &[&str]) -> BiomeLayer {
        BiomeLayer::new(name, depth, chance, tiles(variants)).unwrap()
    }

    fn classifier(layers: Vec<BiomeLayer>) -> BiomeClassifier {
        BiomeClassifier::new(
            layers,
            tiles(&["grass_a", "grass_b"]),
            TileId::new("water"),
            TileId::new("bank"),
        )
        .unwrap()
    }

    const ORIGIN: WorldPos = WorldPos { x: 3, y: 7 };

    #[test]
    fn test_first_matching_layer_wins() {
        let c = classifier(vec![
            layer("Low", 0.2, 100, &["low"]),
            layer("High", 0.5, 100, &["high"]),
        ]);
        assert_eq!(c.match_layer(0.6), Some(0));
        assert_eq!(c.match_layer(0.1), None);

        let mut rng = ScriptedRng::new([0, 0]);
        let result = c.classify(0.6, RiverMask::CLEAR, ORIGIN, &mut rng);
        assert_eq!(result.tile().as_str(), "low");
    }

    #[test]
    fn test_layers_are_not_sorted() {
        let c = classifier(vec![
            layer("High", 0.5, 100, &["high"]),
            layer("Low", 0.2, 100, &["low"]),
        ]);
        assert_eq!(c.match_layer(0.6), Some(0));
        assert_eq!(c.match_layer(0.3), Some(1));
    }

    #[test]
    fn test_match_uses_clamped_sample() {
        let c = classifier(vec![layer("Peak", 1.0, 100, &["peak"])]);
        assert_eq!(c.match_layer(3.5), Some(0));
        let c = classifier(vec![layer("Floor", 0.0, 100, &["floor"])]);
        assert_eq!(c.match_layer(-2.0), Some(0));
    }

    #[test]
    fn test_failed_spawn_roll_keeps_default() {
        let c = classifier(vec![layer("Meadow", 0.3, 35, &["meadow_a", "meadow_b"])]);
        // default index 1, roll 36 fails
        let mut rng = ScriptedRng::new([1, 36]);
        let result = c.classify(0.4, RiverMask::CLEAR, ORIGIN, &mut rng);
        match result {
            Classification::Land {
                tile,
                default_tile,
                layer,
                ..
            } => {
                assert_eq!(tile.as_str(), "grass_b");
                assert_eq!(default_tile.as_str(), "grass_b");
                assert_eq!(layer, Some(0));
            }
            other => panic!("expected land, got {other:?}"),
        }
        assert_eq!(rng.requests(), &[(0, 2), (0, 100)]);
    }

    #[test]
    fn test_roll_equal_to_chance_succeeds() {
        let c = classifier(vec![layer("Meadow", 0.3, 35, &["meadow_a", "meadow_b"])]);
        let mut rng = ScriptedRng::new([0, 35, 1]);
        let result = c.classify(0.4, RiverMask::CLEAR, ORIGIN, &mut rng);
        assert_eq!(result.tile().as_str(), "meadow_b");
        assert_eq!(rng.requests(), &[(0, 2), (0, 100), (0, 2)]);
    }

    #[test]
    fn test_single_variant_skips_index_draw() {
        let c = classifier(vec![layer("Sand", 0.1, 100, &["sand"])]);
        let mut rng = ScriptedRng::new([0, 50]);
        let result = c.classify(0.2, RiverMask::CLEAR, ORIGIN, &mut rng);
        assert_eq!(result.tile().as_str(), "sand");
        assert_eq!(rng.requests().len(), 2);
    }

    #[test]
    fn test_any_river_sample_forces_water() {
        let c = classifier(vec![layer("Low", 0.0, 100, &["low"])]);
        for i in 0..9 {
            let mut rng = ScriptedRng::new([]);
            let result = c.classify(0.5, RiverMask::CLEAR.with(i), ORIGIN, &mut rng);
            assert_eq!(
                result,
                Classification::Water {
                    tile: TileId::new("water"),
                    bank: TileId::new("bank"),
                }
            );
            assert!(rng.requests().is_empty());
        }
    }

    #[test]
    fn test_woods_draw_order() {
        let c = classifier(vec![layer("Woods", 0.5, 100, &["floor_a", "floor_b"])]);
        // default, spawn roll, variant, tree roll, flip, top, trunk
        let mut rng = ScriptedRng::new([0, 10, 1, 20, 1, 2, 1]);
        let result = c.classify(0.7, RiverMask::CLEAR, ORIGIN, &mut rng);

        assert_eq!(result.tile().as_str(), "floor_b");
        assert_eq!(
            result.decoration(),
            Some(&DecorationDirective {
                position: ORIGIN,
                flip: true,
                top_variant: 2,
                trunk_variant: 1,
                sort_order: -7,
            })
        );
        assert_eq!(
            rng.requests(),
            &[(0, 2), (0, 100), (0, 2), (0, 100), (0, 2), (0, 3), (0, 2)]
        );
    }

    #[test]
    fn test_failed_tree_roll_stops_drawing() {
        let c = classifier(vec![layer("Woods", 0.5, 100, &["floor"])]);
        let mut rng = ScriptedRng::new([0, 10, 46]);
        let result = c.classify(0.7, RiverMask::CLEAR, ORIGIN, &mut rng);
        assert!(result.decoration().is_none());
        assert_eq!(rng.requests().len(), 3);
    }

    #[test]
    fn test_mountain_layer_flagged() {
        let c = classifier(vec![
            layer("Mountain", 0.8, 100, &["rock"]),
            layer("Hills", 0.4, 100, &["hill"]),
        ]);
        let mut rng = ScriptedRng::new([1, 0]);
        match c.classify(0.9, RiverMask::CLEAR, ORIGIN, &mut rng) {
            Classification::Land {
                tile,
                default_tile,
                mountain,
                ..
            } => {
                assert!(mountain);
                assert_eq!(tile.as_str(), "rock");
                assert_eq!(default_tile.as_str(), "grass_b");
            }
            other => panic!("expected land, got {other:?}"),
        }
        let mut rng = ScriptedRng::new([0, 0]);
        assert!(matches!(
            c.classify(0.5, RiverMask::CLEAR, ORIGIN, &mut rng),
            Classification::Land { mountain: false, .. }
        ));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert_eq!(
            BiomeLayer::new("Empty", 0.5, 100, Vec::new()),
            Err(WorldGenError::EmptyLayerVariants {
                layer: "Empty".to_string()
            })
        );
        assert!(BiomeLayer::new("Deep", 1.5, 100, tiles(&["x"])).is_err());
        assert!(BiomeLayer::new("Lucky", 0.5, 101, tiles(&["x"])).is_err());
        assert_eq!(
            BiomeClassifier::new(Vec::new(), Vec::new(), TileId::new("w"), TileId::new("b"))
                .unwrap_err(),
            WorldGenError::EmptyDefaultTiles
        );
    }

    #[test]
    fn test_new_uses_default_reserved_names() {
        let c = classifier(vec![
            layer("Mountain", 0.8, 100, &["rock"]),
            layer("Woods", 0.5, 100, &["floor"]),
        ]);
        // Woods: default, spawn roll, tree roll 45 succeeds at the default chance.
        let mut rng = ScriptedRng::new([0, 0, 45, 0, 2, 1]);
        let result = c.classify(0.6, RiverMask::CLEAR, ORIGIN, &mut rng);
        let tree = result.decoration().copied().unwrap();
        assert_eq!((tree.top_variant, tree.trunk_variant), (2, 1));

        // A roll one above the default chance fails.
        let mut rng = ScriptedRng::new([0, 0, 46]);
        assert!(c
            .classify(0.6, RiverMask::CLEAR, ORIGIN, &mut rng)
            .decoration()
            .is_none());

        let mut rng = ScriptedRng::new([0, 0]);
        assert!(matches!(
            c.classify(0.9, RiverMask::CLEAR, ORIGIN, &mut rng),
            Classification::Land { mountain: true, .. }
        ));
    }

    #[test]
    fn test_from_config_uses_reserved_names() {
        let mut config = WorldConfig::default();
        config.decoration.woods_layer = "Forest".to_string();
        config.layers[1].name = "Forest".to_string();
        config.decoration.tree_spawn_chance = 100;
        let c = BiomeClassifier::from_config(&config).unwrap();
        assert_eq!(c.layers().len(), 3);

        // Forest matches at 0.6: default, roll, then tree roll, flip, top, trunk
        let mut rng = ScriptedRng::new([0, 0, 0, 0, 0, 0]);
        let result = c.classify(0.6, RiverMask::CLEAR, ORIGIN, &mut rng);
        assert!(result.decoration().is_some());
    }
}
