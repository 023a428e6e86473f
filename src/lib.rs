/*
 * Fish School Flocking Simulation - Module Definitions
 *
 * The simulation core (fast_math, spatial_grid, boid, wander, target, flock)
 * has no knowledge of windows or drawing. The viewer modules (app, renderer,
 * input, ui) drive it from a nannou window.
 */

// Re-export key components for easier access
pub use boid::Boid;
pub use debug::{DebugInfo, FrameStats};
pub use error::ConfigError;
pub use flock::Flock;
pub use params::{FlockParams, SpawnPattern, UpdateMode};
pub use spatial_grid::{CellHashing, SpatialGrid};
pub use target::{TargetEvent, TargetState, TargetTracker};
pub use wander::{GlobalHeading, NoiseSource, PerlinNoise};
pub use app::Model;

// Define modules
pub mod fast_math;
pub mod spatial_grid;
pub mod boid;
pub mod wander;
pub mod target;
pub mod flock;
pub mod params;
pub mod error;
pub mod debug;
pub mod app;
pub mod renderer;
pub mod input;
pub mod ui;

// Constants
pub const BOID_SIZE: f32 = 6.0;
pub const TARGET_DISC_DIAMETER: f32 = 130.0;
