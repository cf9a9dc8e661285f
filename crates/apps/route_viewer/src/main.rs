//! Headless route overlay run: mounts the overlay on a simulated map, feeds
//! it a route and prints what each frame did as JSON.

mod host;

use std::cell::RefCell;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use foundation::GeoPoint;
use foundation::time::Time;
use gpu::command::{CommandBackend, RecordingContext};
use gpu::{GraphicsContext, PipelineState};
use overlay::{DrawOutcome, MapView, OverlayConfig, OverlayError, RoutePath, mount};
use runtime::TickControl;
use scene::components::Tag;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::host::SimulatedMap;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a route overlay against a simulated map")]
struct Args {
    /// Overlay config JSON (falls back to $OVERLAY_CONFIG, then defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Route JSON: an array of {latitude, longitude, altitude?}
    #[arg(long)]
    route: Option<PathBuf>,

    /// Frames to simulate
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Host frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Map zoom level
    #[arg(long, default_value_t = 15.0)]
    zoom: f64,

    /// Lose the graphics context at this frame
    #[arg(long)]
    lose_context_at: Option<u64>,

    /// Frames the context stays lost
    #[arg(long, default_value_t = 10)]
    lost_for: u64,

    /// Include every frame's outcome in the output
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct FrameRecord {
    index: u64,
    time_s: f64,
    tilt_deg: f64,
    outcome: String,
}

fn default_route() -> RoutePath {
    RoutePath::new(vec![
        GeoPoint::lat_lng(22.3035, 114.1599),
        GeoPoint::lat_lng(22.3050, 114.1620),
    ])
}

fn load_config(args: &Args) -> Result<OverlayConfig, OverlayError> {
    let path = args
        .config
        .clone()
        .or_else(|| env::var("OVERLAY_CONFIG").ok().map(PathBuf::from));
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading overlay config");
            OverlayConfig::from_path(path)
        }
        None => Ok(OverlayConfig::default()),
    }
}

fn load_route(args: &Args) -> Result<RoutePath, Box<dyn std::error::Error>> {
    match &args.route {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&json)?)
        }
        None => Ok(default_route()),
    }
}

fn describe(outcome: &DrawOutcome) -> String {
    match outcome {
        DrawOutcome::Rendered(stats) => format!(
            "rendered: {} draws, {} lights, {} uploads",
            stats.draw_calls, stats.lights, stats.uploads
        ),
        DrawOutcome::Skipped(reason) => format!("skipped: {reason}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if !(args.fps.is_finite() && args.fps > 0.0) {
        return Err(format!("--fps must be positive, got {}", args.fps).into());
    }
    let config = load_config(&args)?;
    let route = load_route(&args)?;

    let viewport = (1280, 720);
    let center = route.first().unwrap_or(GeoPoint::lat_lng(22.3193, 114.1694));
    let mut map = SimulatedMap::new(center, args.zoom, viewport);
    let context = Rc::new(RefCell::new(RecordingContext::new(1).with_state(
        PipelineState {
            viewport: [0, 0, viewport.0 as i32, viewport.1 as i32],
            ..PipelineState::default()
        },
    )));
    let host_state = context.borrow().pipeline_state();

    let mounted = mount(&mut map, CommandBackend::default(), config)?;
    map.fire_add();
    map.fire_context_restored(&context);

    let ticket = mounted.begin_route_request();
    let outcome = mounted.complete_route_request(ticket, Ok(route.clone()))?;
    info!(?outcome, points = route.len(), "route submitted");

    let mut records = Vec::new();
    let mut state_leaks = 0u64;
    for index in 0..args.frames {
        let now = Time(index as f64 / args.fps);

        if args.lose_context_at == Some(index) {
            warn!(frame = index, "simulating context loss");
            context.borrow_mut().lose();
            map.fire_context_lost();
        }
        if args
            .lose_context_at
            .is_some_and(|at| index == at + args.lost_for)
        {
            info!(frame = index, "restoring context");
            context.borrow_mut().restore();
            map.fire_context_restored(&context);
        }

        if mounted.tick(now, &mut map) == TickControl::Stop {
            break;
        }
        for outcome in map.fire_draw(&context, now) {
            if context.borrow().pipeline_state() != host_state {
                state_leaks += 1;
            }
            records.push(FrameRecord {
                index,
                time_s: now.seconds(),
                tilt_deg: map.tilt(),
                outcome: describe(&outcome),
            });
        }
    }

    let frame_log = if args.verbose {
        serde_json::to_value(&records)?
    } else {
        serde_json::Value::Null
    };
    let summary = {
        let overlay = mounted.overlay().borrow();
        let stats = overlay.stats();
        let scene = overlay.scene();
        let objects: Vec<_> = scene
            .iter()
            .map(|(id, o)| {
                json!({
                    "id": id.to_string(),
                    "name": o.name,
                    "tag": o.tag.to_string(),
                })
            })
            .collect();
        json!({
            "route_points": route.len(),
            "anchor": overlay.anchor().map(|a| a.point()),
            "frames": {
                "simulated": args.frames,
                "rendered": stats.frames_rendered,
                "skipped": stats.frames_skipped,
                "render_errors": stats.render_errors,
            },
            "scene": {
                "objects": objects,
                "gpu_objects": scene.gpu_object_count(),
                "route_generation": scene.tag_generation(Tag::ROUTE),
            },
            "gpu": {
                "live_buffers": context.borrow().live_buffer_count(),
                "bytes_uploaded": context.borrow().bytes_uploaded(),
                "state_leaks": state_leaks,
            },
            "final_tilt_deg": map.tilt(),
            "frame_log": frame_log,
        })
    };

    mounted.unmount();
    map.fire_remove();
    info!(
        live_buffers = context.borrow().live_buffer_count(),
        "overlay unmounted"
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
