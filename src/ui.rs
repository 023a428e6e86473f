/*
 * UI Module
 *
 * The egui control panel: pause / step rate controls, target and reset
 * buttons, and the latest frame statistics of the flock.
 */

use nannou_egui::{egui, Egui};

use crate::app::ViewerControls;
use crate::debug::DebugInfo;

/// Buttons pressed this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiActions {
    pub clear_target: bool,
    pub reset_flock: bool,
}

pub fn update_ui(egui: &mut Egui, controls: &mut ViewerControls, debug_info: &DebugInfo) -> UiActions {
    let mut actions = UiActions::default();
    let stats = &debug_info.frame;

    let ctx = egui.begin_frame();

    egui::Window::new("Fish School")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.checkbox(&mut controls.paused, "Pause Simulation");
            ui.checkbox(&mut controls.show_debug, "Show Debug Info");
            ui.add(egui::Slider::new(&mut controls.steps_per_second, 5.0..=120.0).text("Steps per Second"));

            ui.separator();

            ui.label(format!("Boids: {}", stats.boids));
            ui.label(format!("Frame: {}", stats.frame));
            if stats.seeking {
                ui.label(format!("Seeking: {:.0}% arrived, streak {}", stats.arrived * 100.0, stats.streak));
            } else {
                ui.label("Seeking: no target");
            }

            ui.horizontal(|ui| {
                if ui.button("Clear Target").clicked() {
                    actions.clear_target = true;
                }
                if ui.button("Reset School").clicked() {
                    actions.reset_flock = true;
                }
            });

            ui.collapsing("Performance", |ui| {
                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!("Frame time: {:.2} ms", debug_info.frame_time.as_secs_f64() * 1000.0));
                ui.label(format!("Cells used: {}", stats.cells_used));
                ui.label(format!("Largest cell: {}", stats.largest_cell));
                ui.label(format!("Neighbor checks: {}", stats.neighbor_checks));
                if stats.boids > 0 {
                    let per_boid = stats.neighbor_checks as f32 / stats.boids as f32;
                    ui.label(format!("Checks per boid: {:.1}", per_boid));
                }
                ui.label(format!(
                    "Heading force: ({:.3}, {:.3})",
                    stats.heading_force.x, stats.heading_force.y
                ));
            });
        });

    actions
}
