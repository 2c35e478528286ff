//! Locar walk-through
//!
//! Drives the geo marker engine through a full host lifecycle on the
//! simulated AR backend: assets build, the session resumes, tracking is
//! acquired, a plane appears and the device walks north while every marker
//! label is updated. Pauses halfway to exercise resume.
//!
//! Run with: cargo run -p locar_runtime
//!       or: cargo run --bin locar -- scene.json

mod run_config;

use locar_math::Vec3d;
use locar_scene::{FrameOutcome, LocarApp, Placement, RenderEvent, ResumeOutcome};
use locar_xr::sim::{BuildMode, RecordingUi, SimRenderableFactory, SimWorld};
use locar_xr::{GeoFix, TrackingState};
use parking_lot::Mutex;
use run_config::RunConfig;
use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::Arc;

/// Frames spent before tracking is acquired
const WARMUP_FRAMES: u32 = 10;

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = match RunConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config.print_summary();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let world = SimWorld::new(GeoFix::new(config.start, config.heading_deg).with_accuracy(4.0));
    let ui = Arc::new(RecordingUi::new());
    let factory = SimRenderableFactory::new(BuildMode::Threaded);

    let mut app = LocarApp::new(
        config.markers.clone(),
        config.scene.clone(),
        Box::new(world.session_provider()),
        Box::new(world.geo_sensor()),
        ui.clone(),
    )?;

    app.on_create(&factory);
    if app.on_resume() == ResumeOutcome::Finished {
        return Err("session could not be started".into());
    }

    let labels: Arc<Mutex<BTreeMap<String, String>>> = Arc::default();
    let step = Vec3d::new(0.0, 0.0, -config.step_m);
    let pause_at = config.frames / 2;

    for frame in 0..config.frames {
        match frame {
            WARMUP_FRAMES => world.set_tracking(TrackingState::Tracking),
            f if f == WARMUP_FRAMES + 5 => {
                world.detect_plane(TrackingState::Tracking);
            }
            _ => {}
        }
        if frame == pause_at {
            app.on_pause();
            log::info!("Paused at frame {}", frame);
            app.on_resume();
            world.detect_plane(TrackingState::Tracking);
        }

        match app.on_update() {
            FrameOutcome::Updated(summary) => {
                for placement in &summary.placements {
                    watch(&mut app, placement, &labels);
                }
                if summary.loading_hidden {
                    log::info!("Surface found, loading indicator dismissed");
                }
                if summary.tick.failed > 0 {
                    log::warn!("{} markers failed to update", summary.tick.failed);
                }
            }
            FrameOutcome::Released => break,
            outcome => log::trace!("Frame {}: {:?}", frame, outcome),
        }

        if frame % 60 == 0 {
            report(frame, &labels);
        }
        if frame >= WARMUP_FRAMES {
            world.translate_camera(step);
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    report(config.frames, &labels);
    app.on_destroy();
    log::info!(
        "Walk finished, {} anchors left alive, loading shown {} times",
        world.live_anchors(),
        ui.shows()
    );
    Ok(())
}

/// Mirror every label update of a freshly placed record into `labels`
fn watch(app: &mut LocarApp, placement: &Placement, labels: &Arc<Mutex<BTreeMap<String, String>>>) {
    if !placement.created_record() {
        return;
    }
    let (Some(id), Some(scene)) = (placement.record(), app.scene_mut()) else {
        return;
    };

    let sink = Arc::clone(labels);
    let result = scene.on_render_event(id, move |event: &RenderEvent| {
        sink.lock().insert(event.name.clone(), event.label());
    });
    if let Err(e) = result {
        log::warn!("Could not watch {}: {}", id, e);
    }
}

fn report(frame: u32, labels: &Mutex<BTreeMap<String, String>>) {
    let labels = labels.lock();
    if labels.is_empty() {
        return;
    }
    log::info!("Frame {}:", frame);
    for (name, label) in labels.iter() {
        log::info!("  {:<20} {}", name, label);
    }
}
