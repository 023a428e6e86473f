/*
 * Application Module
 *
 * This module defines the viewer model and its update loop. The window is
 * only the frame clock and the input source: every simulation decision
 * happens inside Flock.
 *
 * The flock advances on a fixed timestep, independent of the render rate,
 * with a cap on catch-up steps so a slow frame cannot snowball.
 */

use std::time::Duration;

use nannou::prelude::*;
use nannou_egui::Egui;
use tracing::{error, info, warn};

use crate::debug::DebugInfo;
use crate::flock::Flock;
use crate::params::FlockParams;
use crate::{input, renderer, ui};

const MAX_STEPS_PER_FRAME: u32 = 4;

// Viewer settings adjustable from the UI
pub struct ViewerControls {
    pub paused: bool,
    pub show_debug: bool,
    pub steps_per_second: f32,
}

impl Default for ViewerControls {
    fn default() -> Self {
        Self {
            paused: false,
            show_debug: false,
            steps_per_second: 40.0,
        }
    }
}

// Main model for the application
pub struct Model {
    pub flock: Flock,
    pub egui: Egui,
    pub debug_info: DebugInfo,
    pub controls: ViewerControls,
    pub mouse_position: Vec2,
    pub step_accumulator: Duration,
}

// Config path from the first command line argument, defaults otherwise
fn load_params() -> FlockParams {
    match std::env::args().nth(1) {
        Some(path) => match FlockParams::from_json_file(&path) {
            Ok(params) => {
                info!(%path, "loaded flock config");
                params
            }
            Err(err) => {
                error!(%path, %err, "invalid flock config");
                std::process::exit(1);
            }
        },
        None => FlockParams::default(),
    }
}

// Monitor size is in physical pixels, window sizes are in points
fn initial_window_size(physical_width: u32, physical_height: u32, scale_factor: f64) -> (f32, f32) {
    let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor as f32
    } else {
        1.0
    };
    (
        physical_width as f32 / scale * 0.8,
        physical_height as f32 / scale * 0.8,
    )
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let mut params = load_params();

    // Open at 80% of the monitor when we can tell its size
    let (width, height) = match app.primary_monitor() {
        Some(monitor) => {
            let size = monitor.size();
            initial_window_size(size.width, size.height, monitor.scale_factor())
        }
        None => (params.world_width, params.world_height),
    };

    let window_id = app
        .new_window()
        .title("Fish School")
        .size(width as u32, height as u32)
        .view(renderer::view)
        .mouse_moved(input::mouse_moved)
        .mouse_pressed(input::mouse_pressed)
        .key_pressed(input::key_pressed)
        .resized(input::resized)
        .raw_event(input::raw_window_event)
        .build()
        .unwrap_or_else(|err| {
            error!(?err, "failed to build window");
            std::process::exit(1);
        });

    let window = app.window(window_id).unwrap_or_else(|| {
        error!("window closed during setup");
        std::process::exit(1);
    });
    let egui = Egui::from_window(&window);

    // The world is the window, in points
    let rect = window.rect();
    params.world_width = rect.w();
    params.world_height = rect.h();
    drop(window);

    let flock = Flock::new(params).unwrap_or_else(|err| {
        error!(%err, "cannot start the simulation");
        std::process::exit(1);
    });

    Model {
        flock,
        egui,
        debug_info: DebugInfo::default(),
        controls: ViewerControls::default(),
        mouse_position: Vec2::ZERO,
        step_accumulator: Duration::ZERO,
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    model.debug_info.fps = app.fps();
    model.debug_info.frame_time = update.since_last;

    let actions = ui::update_ui(&mut model.egui, &mut model.controls, &model.debug_info);

    if actions.clear_target {
        model.flock.clear_target();
    }
    if actions.reset_flock {
        reset_flock(model);
    }

    if model.controls.paused {
        model.step_accumulator = Duration::ZERO;
        return;
    }

    let step_size = Duration::from_secs_f32(1.0 / model.controls.steps_per_second);
    model.step_accumulator += update.since_last;

    let mut steps = 0;
    while model.step_accumulator >= step_size && steps < MAX_STEPS_PER_FRAME {
        model.flock.step();
        model.step_accumulator -= step_size;
        steps += 1;
    }
    if steps == MAX_STEPS_PER_FRAME {
        // Drop the backlog instead of chasing it
        model.step_accumulator = Duration::ZERO;
    }

    model.debug_info.frame = *model.flock.stats();
}

// Respawn the whole school with the current parameters
fn reset_flock(model: &mut Model) {
    match Flock::new(model.flock.params().clone()) {
        Ok(flock) => {
            model.flock = flock;
            model.step_accumulator = Duration::ZERO;
        }
        Err(err) => warn!(%err, "reset failed, keeping the current flock"),
    }
}
