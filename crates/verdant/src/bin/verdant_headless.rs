//! # Verdant Headless Runner
//!
//! Loads a world description, runs the amortised bulk load tick by tick,
//! then walks a simulated viewer east and logs streaming activity.
//!
//! ```bash
//! verdant_headless [world.toml] [steps]
//! RUST_LOG=verdant_procedural=debug verdant_headless data/worlds/meadow.toml 400
//! ```

use std::collections::HashMap;
use std::process::ExitCode;
use std::time::Instant;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use verdant_procedural::{
    ChunkCoord, DecorationDirective, DecorationHandle, LoadProgress, Presentation, PresentationHandle,
    Surface, TileId, World, WorldConfig, WorldPhase, WorldPoint, WorldPos,
};

/// Default world description.
const DEFAULT_WORLD: &str = "data/worlds/meadow.toml";

/// Default number of viewer steps after loading.
const DEFAULT_STEPS: u32 = 240;

/// Cells the viewer moves per step.
const VIEWER_SPEED: f64 = 1.5;

/// Counts what a real renderer would draw.
#[derive(Default)]
struct TallyPresentation {
    chunk_objects: u64,
    visible: HashMap<ChunkCoord, bool>,
    stamps: HashMap<Surface, u64>,
    trees: u64,
    last_status: Option<String>,
}

impl Presentation for TallyPresentation {
    fn create_chunk_object(&mut self, _coord: ChunkCoord) -> Option<PresentationHandle> {
        self.chunk_objects += 1;
        Some(PresentationHandle(self.chunk_objects))
    }

    fn set_chunk_visible(&mut self, coord: ChunkCoord, _handle: PresentationHandle, visible: bool) {
        self.visible.insert(coord, visible);
    }

    fn stamp(&mut self, surface: Surface, _position: WorldPos, _tile: &TileId) {
        *self.stamps.entry(surface).or_default() += 1;
    }

    fn spawn_decoration(
        &mut self,
        _coord: ChunkCoord,
        _directive: &DecorationDirective,
    ) -> Option<DecorationHandle> {
        self.trees += 1;
        Some(DecorationHandle(self.trees))
    }

    fn report_progress(&mut self, progress: &LoadProgress) {
        if progress.status != self.last_status {
            if let Some(status) = &progress.status {
                tracing::info!("{} ({:.0}%)", status, progress.fraction() * 100.0);
            }
            self.last_status = progress.status.clone();
        }
    }

    fn loading_finished(&mut self) {
        tracing::info!("Loading screen dismissed");
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer().with_target(true).with_level(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| DEFAULT_WORLD.to_string());
    let steps = match args.next().map(|s| s.parse::<u32>()) {
        None => DEFAULT_STEPS,
        Some(Ok(steps)) => steps,
        Some(Err(e)) => {
            tracing::error!("Invalid step count: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match WorldConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut world = match World::new(config, TallyPresentation::default()) {
        Ok(world) => world,
        Err(e) => {
            tracing::error!("Invalid world {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    while world.tick(None) == WorldPhase::Loading {}
    tracing::info!(
        "Bulk load of {} chunks took {:?}",
        world.stats().chunks_generated,
        start.elapsed()
    );

    let mut viewer = WorldPoint::new(0.0, 0.0);
    let mut swaps = world.stats().neighbourhood_swaps;
    for _ in 0..steps {
        viewer.x += VIEWER_SPEED;
        world.tick(Some(viewer));

        let stats = world.stats();
        if stats.neighbourhood_swaps != swaps {
            swaps = stats.neighbourhood_swaps;
            tracing::info!(
                "Viewer at {:.1}, {:.1} entered chunk {} ({} chunks loaded)",
                viewer.x,
                viewer.y,
                world.chunk_at_world(viewer),
                stats.chunks_generated
            );
            if let Some(report) = world.inspect(viewer) {
                tracing::debug!("\n{}", report);
            }
        }
    }

    let stats = world.stats();
    let tally = world.presentation();
    let visible = tally.visible.values().filter(|v| **v).count();
    tracing::info!(
        "Done: {} chunks, {} active ({} visible), {} swaps, {} bulk ticks, {} trees",
        stats.chunks_generated,
        stats.active_chunks,
        visible,
        stats.neighbourhood_swaps,
        stats.bulk_ticks,
        tally.trees
    );
    for surface in [Surface::Ground, Surface::Dirt, Surface::Water, Surface::Bank, Surface::Mountain] {
        tracing::info!(
            "{:?} stamps: {}",
            surface,
            tally.stamps.get(&surface).copied().unwrap_or(0)
        );
    }

    ExitCode::SUCCESS
}
