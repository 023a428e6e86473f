/*
 * Renderer Module
 *
 * Draws the school: one triangle per boid, pointing along its velocity, and
 * the target disc while the flock is seeking. The simulation world spans
 * [0, width] x [0, height]; nannou puts the origin at the window center, so
 * everything is shifted by half the world size.
 */

use nannou::prelude::*;
use tracing::error;

use crate::app::Model;
use crate::{BOID_SIZE, TARGET_DISC_DIAMETER};

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let flock = &model.flock;
    let params = flock.params();
    let half = vec2(params.world_width / 2.0, params.world_height / 2.0);

    draw.background().color(rgb(88u8, 185, 188));

    if let Some(target) = flock.target() {
        draw.ellipse()
            .xy(target - half)
            .w_h(TARGET_DISC_DIAMETER, TARGET_DISC_DIAMETER)
            .color(rgb(185u8, 91, 88));
    }

    let points = [
        pt2(BOID_SIZE, 0.0),
        pt2(-BOID_SIZE, BOID_SIZE / 2.0),
        pt2(-BOID_SIZE, -BOID_SIZE / 2.0),
    ];
    for boid in flock.boids() {
        draw.polygon()
            .color(rgb(245u8, 202, 122))
            .points(points)
            .xy(boid.position - half)
            .rotate(boid.heading());
    }

    if model.controls.show_debug {
        if let Some(first) = flock.boids().first() {
            let center = first.position - half;

            // Separation radius
            draw.ellipse()
                .xy(center)
                .radius(first.separation_radius())
                .no_fill()
                .stroke(RED)
                .stroke_weight(1.0);

            // Influence radius (alignment and cohesion)
            draw.ellipse()
                .xy(center)
                .radius(first.influence_radius())
                .no_fill()
                .stroke(BLUE)
                .stroke_weight(1.0);

            // Grid cell the boid is hashed into
            let cell = flock.grid().cell_size();
            let corner = (first.position / cell).floor() * cell;
            draw.rect()
                .xy(corner + vec2(cell, cell) / 2.0 - half)
                .w_h(cell, cell)
                .no_fill()
                .stroke(WHITE)
                .stroke_weight(1.0);

            // Velocity vector
            draw.arrow()
                .start(center)
                .end(center + first.velocity * 5.0)
                .color(YELLOW)
                .stroke_weight(2.0);
        }
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        error!(?err, "failed to draw frame");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        error!(?err, "failed to draw ui");
    }
}
