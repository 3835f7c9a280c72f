use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use river_systems::erosion::{ErosionPreset, ErosionStats};
use river_systems::export::{export_hydro_png, export_hydrology_png};
use river_systems::logging::init_logging;
use river_systems::{SimConfig, World, WorldSeeds};

#[derive(Parser, Debug)]
#[command(name = "river_systems")]
#[command(about = "Evolve a terrain under water erosion and vegetation growth")]
struct Args {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Width of the grid in cells (overrides the config file)
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the grid in cells (overrides the config file)
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Number of frames to simulate
    #[arg(short, long, default_value = "600")]
    frames: u64,

    /// Frame rate the scheduler tries to hold
    #[arg(long)]
    target_fps: Option<f64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Erosion preset (ignored when a config file is given)
    #[arg(short, long, value_enum)]
    preset: Option<ErosionPreset>,

    /// Export the hydrology map (R = height, G = pool, B = flow) to a PNG
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export the hydro colour map to a PNG
    #[arg(long)]
    hydro: Option<PathBuf>,

    /// Log filter, e.g. "debug" (RUST_LOG takes precedence)
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log.as_deref());

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            SimConfig::from_json_file(path)?
        }
        None => {
            let preset = args.preset.unwrap_or_default();
            info!(%preset, description = preset.description(), "using erosion preset");
            SimConfig::with_preset(preset)
        }
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(fps) = args.target_fps {
        config.scheduler.target_fps = fps;
    }

    let seeds = match args.seed {
        Some(seed) => WorldSeeds::from_master(seed),
        None => WorldSeeds::default(),
    };
    info!(%seeds, "starting simulation");

    let mut world = World::generate(seeds, config)?;

    let mut totals = ErosionStats::default();
    let mut growth_cycles = 0usize;
    let mut busy = Duration::ZERO;
    let log_every = (args.frames / 10).max(1);

    for _ in 0..args.frames {
        let report = world.step_frame();
        totals.merge(&report.erosion);
        busy += report.elapsed;
        if report.growth.is_some() {
            growth_cycles += 1;
        }

        if (report.frame + 1) % log_every == 0 {
            info!(
                frame = report.frame + 1,
                rate = report.rate,
                erodes = report.erodes,
                plants = world.plants().len(),
                pooled_water = world.terrain().pooled_water(),
                "progress"
            );
        }
    }

    info!(
        frames = args.frames,
        drops = totals.drops,
        growth_cycles,
        eroded = totals.total_eroded,
        deposited = totals.total_deposited,
        escaped = totals.escaped,
        pooled = totals.pooled,
        deposited_in_lakes = totals.deposited,
        evaporated = totals.evaporated,
        spills = totals.spills,
        busy_ms = busy.as_secs_f64() * 1000.0,
        "simulation finished"
    );

    let snapshot = world.snapshot();
    if let Some(path) = &args.export {
        export_hydrology_png(&snapshot, path)?;
        info!(path = %path.display(), "exported hydrology map");
    }
    if let Some(path) = &args.hydro {
        export_hydro_png(&snapshot, &world.config().hydro, path)?;
        info!(path = %path.display(), "exported hydro map");
    }

    Ok(())
}
