//! Re-centering trace: walks a viewer across a headless terrain and prints
//! every level move.
//!
//! Usage: cargo run --release --bin recenter_trace -- [OPTIONS]
//!
//! Options:
//!   --levels <N>      Number of clipmap levels (default: 3)
//!   --distance <D>    Distance walked along +X in world units (default: 1000)
//!   --step <S>        Viewer step per frame (default: 1.0)
//!   --diagonal        Walk along +X+Y instead of +X
//!   --toroidal        Rewrite only newly exposed texels on each move
//!   --json            Print events as JSON lines

use glam::Vec3;
use serde_json::json;

use geomip::core::camera::Camera;
use geomip::core::config::{HeightmapSource, TerrainConfig};
use geomip::core::types::Result;
use geomip::render::HeadlessDevice;
use geomip::terrain::Terrain;

/// Eye height; the trace only cares about xy
const EYE_HEIGHT: f32 = 200.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = TraceOptions {
        levels: parse_usize_arg(&args, "--levels").unwrap_or(3),
        distance: parse_f32_arg(&args, "--distance").unwrap_or(1000.0),
        step: parse_f32_arg(&args, "--step").unwrap_or(1.0),
        diagonal: args.iter().any(|a| a == "--diagonal"),
        toroidal: args.iter().any(|a| a == "--toroidal"),
        json: args.iter().any(|a| a == "--json"),
    };

    if let Err(e) = run(&options) {
        log::error!("Trace failed: {}", e);
        std::process::exit(1);
    }
}

struct TraceOptions {
    levels: usize,
    distance: f32,
    step: f32,
    diagonal: bool,
    toroidal: bool,
    json: bool,
}

fn run(options: &TraceOptions) -> Result<()> {
    let config = TerrainConfig {
        level_count: options.levels,
        heightmap: HeightmapSource::Procedural { size: 256, seed: 7, octaves: 4, frequency: 1.0 / 64.0 },
        toroidal_updates: options.toroidal,
        ..TerrainConfig::default()
    };

    let mut device = HeadlessDevice::new();
    let mut terrain = Terrain::from_config(config)?;
    let mut camera = Camera::look_at(Vec3::new(0.0, 0.0, EYE_HEIGHT), Vec3::new(0.0, 1.0, EYE_HEIGHT), Vec3::Z);
    terrain.create(&mut device, &camera)?;

    let created = device.stats();
    let direction = if options.diagonal { Vec3::new(1.0, 1.0, 0.0) } else { Vec3::X };
    let steps = (options.distance / options.step.max(f32::EPSILON)).round() as usize;

    let mut counts: Vec<usize> = terrain.levels().iter().map(|l| l.recenter_count()).collect();
    for step in 1..=steps {
        camera.position = Vec3::new(0.0, 0.0, EYE_HEIGHT) + direction * (step as f32 * options.step);
        terrain.update(&mut device, &camera, &camera)?;

        for (level, count) in terrain.levels().iter().zip(counts.iter_mut()) {
            if level.recenter_count() == *count {
                continue;
            }
            *count = level.recenter_count();

            let min = level.position_min();
            let origin = level.toroidal_origin();
            if options.json {
                println!(
                    "{}",
                    json!({
                        "step": step,
                        "viewer": [camera.position.x, camera.position.y],
                        "level": level.index(),
                        "spacing": level.grid_spacing(),
                        "position_min": [min.x, min.y],
                        "toroidal_origin": [origin.x, origin.y],
                        "trim": format!("{:?}", level.trim_orientation()),
                    })
                );
            } else {
                println!(
                    "step {:>6}  viewer ({:>8.1}, {:>8.1})  level {} (spacing {:>3})  min {}  origin {}  trim {:?}",
                    step,
                    camera.position.x,
                    camera.position.y,
                    level.index(),
                    level.grid_spacing(),
                    min,
                    origin,
                    level.trim_orientation(),
                );
            }
        }
    }

    let stats = device.stats();
    for level in terrain.levels() {
        log::info!(
            "Level {} (spacing {}): {} re-centres, final min {}",
            level.index(),
            level.grid_spacing(),
            level.recenter_count(),
            level.position_min()
        );
    }
    log::info!(
        "{} steps, {} elevation updates, {} texels written after creation ({} updates)",
        steps,
        stats.elevation_updates - created.elevation_updates,
        stats.texels_written - created.texels_written,
        if options.toroidal { "toroidal" } else { "full" }
    );
    Ok(())
}

/// Parse a usize argument from command line
fn parse_usize_arg(args: &[String], name: &str) -> Option<usize> {
    for i in 0..args.len() {
        if args[i] == name {
            if let Some(value) = args.get(i + 1) {
                return value.parse().ok();
            }
        }
    }
    None
}

/// Parse an f32 argument from command line
fn parse_f32_arg(args: &[String], name: &str) -> Option<f32> {
    for i in 0..args.len() {
        if args[i] == name {
            if let Some(value) = args.get(i + 1) {
                return value.parse().ok();
            }
        }
    }
    None
}
