/*
 * Fish School Flocking Simulation
 *
 * Opens a window and lets a school of boids swim in it. The school drifts
 * along a slowly wandering shared heading; click anywhere to make it swim
 * to that point, and it lets go once enough fish have arrived.
 *
 * Usage: shoal [config.json]
 * Log level through RUST_LOG (default "info").
 */

use shoal::app;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    nannou::app(app::model).update(app::update).run();
}
