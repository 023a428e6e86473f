/*
 * Input Module
 *
 * This module turns window events into flock commands:
 * - Left click sets the target (unless the click lands on the UI)
 * - Space pauses, C clears the target, D toggles debug drawing,
 *   F toggles fullscreen
 * - Resizing the window resizes the wrap-around world
 */

use nannou::prelude::*;
use tracing::warn;

use crate::app::Model;

// Window coordinates (origin at the center) to world coordinates
fn to_world(model: &Model, point: Vec2) -> Point2 {
    let params = model.flock.params();
    point + vec2(params.world_width / 2.0, params.world_height / 2.0)
}

// Mouse moved event handler
pub fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    model.mouse_position = pos;
}

// Mouse pressed event handler
pub fn mouse_pressed(_app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left || model.egui.ctx().is_pointer_over_area() {
        return;
    }
    let target = to_world(model, model.mouse_position);
    model.flock.set_target(target);
}

// Keyboard shortcuts
pub fn key_pressed(app: &App, model: &mut Model, key: Key) {
    match key {
        Key::Space => model.controls.paused = !model.controls.paused,
        Key::C => model.flock.clear_target(),
        Key::D => model.controls.show_debug = !model.controls.show_debug,
        Key::F => {
            let window = app.main_window();
            window.set_fullscreen(!window.is_fullscreen());
        }
        _ => {}
    }
}

// Keep the world the size of the window
pub fn resized(_app: &App, model: &mut Model, size: Vec2) {
    if let Err(err) = model.flock.set_bounds(size.x, size.y) {
        warn!(%err, "ignoring resize");
    }
}

// Handle raw window events for egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
