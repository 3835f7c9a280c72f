//! Profiling tool to identify performance bottlenecks

use std::time::{Duration, Instant};

use river_systems::{SimConfig, World, WorldSeeds};

fn percent(part: Duration, total: Duration) -> f64 {
    100.0 * part.as_secs_f64() / total.as_secs_f64().max(f64::MIN_POSITIVE)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SimConfig::default();
    let seed = 1337u64;
    let batches = 40;
    let batch_size = config.scheduler.base_cycles;

    println!("=== Performance Profiling ===");
    println!("Map size: {} ({} cells)", config.dim(), config.dim().area());
    println!();

    // Profile terrain generation
    let start = Instant::now();
    let mut world = World::generate(WorldSeeds::from_master(seed), config)?;
    let generation_time = start.elapsed();
    println!("Terrain generation: {:?}", generation_time);

    println!("\nErosion parameters:");
    println!("  Batches: {} x {} drops", batches, batch_size);
    println!("  Erosion radius: {}", world.config().erosion.erosion_radius);
    println!("  Max steps: {}", world.config().erosion.max_steps);
    println!();

    let mut erosion_time = Duration::ZERO;
    let mut growth_time = Duration::ZERO;
    let mut smoothing_time = Duration::ZERO;
    let mut steps = 0u64;
    let mut drops = 0usize;

    for _ in 0..batches {
        let start = Instant::now();
        let stats = world.erode(batch_size);
        erosion_time += start.elapsed();
        steps += stats.steps_taken;
        drops += stats.drops;

        let start = Instant::now();
        world.grow();
        growth_time += start.elapsed();

        let start = Instant::now();
        world.smooth();
        smoothing_time += start.elapsed();
    }

    println!("Erosion: {:?} ({} drops, {} steps)", erosion_time, drops, steps);
    println!(
        "  Per drop: {:.3} ms",
        erosion_time.as_secs_f64() * 1000.0 / drops.max(1) as f64
    );
    println!("Growth cycles: {:?} ({} plants)", growth_time, world.plants().len());
    println!("Smoothing passes: {:?}", smoothing_time);

    // Frames the scheduler would fit at the target rate
    let per_drop_ms = erosion_time.as_secs_f64() * 1000.0 / drops.max(1) as f64;
    let budget_ms = 1000.0 / world.config().scheduler.target_fps;
    println!(
        "Drops per frame at {} fps: ~{:.0}",
        world.config().scheduler.target_fps,
        budget_ms / per_drop_ms.max(f64::MIN_POSITIVE)
    );

    // Summary
    let total = generation_time + erosion_time + growth_time + smoothing_time;
    println!("\n=== Summary ===");
    println!("Generation:       {:>8.2}% ({:?})", percent(generation_time, total), generation_time);
    println!("Erosion:          {:>8.2}% ({:?})", percent(erosion_time, total), erosion_time);
    println!("Growth:           {:>8.2}% ({:?})", percent(growth_time, total), growth_time);
    println!("Smoothing:        {:>8.2}% ({:?})", percent(smoothing_time, total), smoothing_time);
    println!("─────────────────────────────────");
    println!("Total:            {:?}", total);

    Ok(())
}
