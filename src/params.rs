/*
 * Simulation Parameters Module
 *
 * This module defines FlockParams, the construction-time configuration of a
 * flock: population, speed and force caps, perception radii, world bounds,
 * spawn pattern, global heading, target behavior and update mode.
 *
 * Parameters are validated once, before any boid exists. Every field has a
 * default, so a config file only needs to name what it changes.
 */

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::spatial_grid::CellHashing;

/// When a boid's new velocity and position become visible to the others.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Integrate each boid right after its forces are computed, in index
    /// order. Later boids see the moved positions of earlier ones.
    Sequential,
    /// Compute every boid's forces against the frame snapshot (in parallel),
    /// then integrate them all. Independent of boid order.
    #[default]
    Deferred,
}

/// How the initial positions are scattered around the spawn origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPattern {
    /// Every boid starts on the origin itself.
    #[default]
    Point,
    /// Uniform in a square of half-width `spread`.
    Uniform,
    /// Normal distribution with standard deviation `spread` on each axis.
    Gaussian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    pub pattern: SpawnPattern,
    /// Spawn origin; the world center when absent.
    pub origin: Option<[f32; 2]>,
    /// Random offset applied once to the origin, uniform in `[-jitter, jitter]`.
    pub origin_jitter: f32,
    pub spread: f32,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            pattern: SpawnPattern::Point,
            origin: None,
            origin_jitter: 500.0,
            spread: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingParams {
    /// Mean direction of the school, before wander is blended in.
    pub base: [f32; 2],
    /// Magnitude of the heading force as a fraction of `max_force`.
    pub intensity: f32,
    /// Share of the wander direction in the blend (0 = base only).
    pub wander_blend: f32,
    /// Noise phase advance per frame.
    pub phase_step: f32,
}

impl Default for HeadingParams {
    fn default() -> Self {
        Self {
            base: [-1.0, 0.0],
            intensity: 0.3,
            wander_blend: 0.95,
            phase_step: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetParams {
    pub arrival_radius: f32,
    /// Fraction of the flock that must be inside `arrival_radius`.
    pub threshold: f32,
    /// Consecutive qualifying frames before the target is released.
    pub required_frames: u32,
    /// Multiplier on the seek force, large enough to beat the heading force.
    pub weight: f32,
}

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            arrival_radius: 30.0,
            threshold: 0.10,
            required_frames: 20,
            weight: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockParams {
    pub num_boids: usize,
    pub max_speed: f32,
    pub max_force: f32,
    pub separation_radius: f32,
    pub influence_radius: f32,
    /// Grid cell size; the largest perception radius when absent.
    pub cell_size: Option<f32>,
    pub hashing: CellHashing,
    pub update_mode: UpdateMode,
    pub world_width: f32,
    pub world_height: f32,
    /// How far past the edge a boid may swim before it wraps around.
    pub wrap_margin: f32,
    pub spawn: SpawnParams,
    pub heading: HeadingParams,
    pub target: TargetParams,
    /// Seed for spawn placement and noise; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            num_boids: 500,
            max_speed: 15.0,
            max_force: 0.9,
            separation_radius: 10.0,
            influence_radius: 10.0,
            cell_size: None,
            hashing: CellHashing::XorPrimes,
            update_mode: UpdateMode::Deferred,
            world_width: 1280.0,
            world_height: 800.0,
            wrap_margin: 100.0,
            spawn: SpawnParams::default(),
            heading: HeadingParams::default(),
            target: TargetParams::default(),
            seed: None,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

impl FlockParams {
    /// Largest perception radius of the flock.
    pub fn max_radius(&self) -> f32 {
        self.separation_radius.max(self.influence_radius)
    }

    /// Cell size the grid will be built with.
    pub fn effective_cell_size(&self) -> f32 {
        self.cell_size.unwrap_or_else(|| self.max_radius())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_boids == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        positive("max_speed", self.max_speed)?;
        positive("max_force", self.max_force)?;
        positive("separation_radius", self.separation_radius)?;
        positive("influence_radius", self.influence_radius)?;
        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        non_negative("wrap_margin", self.wrap_margin)?;

        let cell_size = self.effective_cell_size();
        positive("cell_size", cell_size)?;
        if cell_size < self.max_radius() {
            return Err(ConfigError::CellTooSmall {
                cell_size,
                required: self.max_radius(),
            });
        }

        non_negative("spawn.spread", self.spawn.spread)?;
        non_negative("spawn.origin_jitter", self.spawn.origin_jitter)?;

        non_negative("heading.intensity", self.heading.intensity)?;
        non_negative("heading.wander_blend", self.heading.wander_blend)?;
        non_negative("heading.phase_step", self.heading.phase_step)?;

        positive("target.arrival_radius", self.target.arrival_radius)?;
        non_negative("target.weight", self.target.weight)?;
        let threshold = self.target.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        if self.target.required_frames == 0 {
            return Err(ConfigError::NoArrivalFrames);
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading flock config");
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
