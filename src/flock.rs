/*
 * Flock Module
 *
 * This module owns the boids and drives one simulation step at a time.
 * Per step, in this order:
 * 1. Advance the global heading (one force shared by every boid)
 * 2. Run the target release rule over the current positions
 * 3. Rebuild the spatial grid from the current positions
 * 4. For every boid: heading force, seek force if a target is set, the
 *    three local rules, then integrate and wrap
 *
 * Step 4 runs in one of two modes. Sequential integrates boid by boid, so a
 * boid sees the already moved state of the boids before it. Deferred first
 * computes all forces in parallel against the frame snapshot and only then
 * integrates, which makes the result independent of boid order.
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use std::f32::consts::FRAC_PI_6;
use tracing::{info, trace};

use nannou::prelude::*;

use crate::boid::Boid;
use crate::debug::FrameStats;
use crate::error::ConfigError;
use crate::params::{FlockParams, SpawnPattern, UpdateMode};
use crate::spatial_grid::SpatialGrid;
use crate::target::{TargetEvent, TargetTracker};
use crate::wander::{GlobalHeading, NoiseSource, PerlinNoise};

pub struct Flock {
    params: FlockParams,
    boids: Vec<Boid>,
    grid: SpatialGrid,
    heading: GlobalHeading,
    tracker: TargetTracker,
    stats: FrameStats,
    // Per-boid force and candidate count buffer for the deferred mode
    forces: Vec<(Vec2, usize)>,
}

impl Flock {
    /// Validates `params`, spawns the boids and seeds the wander noise.
    pub fn new(params: FlockParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let boids = spawn_boids(&params, &mut rng)?;
        let noise = PerlinNoise::new(&mut rng);
        let start_phase = rng.gen_range(0.0..1000.0);

        Ok(Self::assemble(params, boids, Box::new(noise), start_phase))
    }

    /// Builds a flock around boids placed by the caller. `num_boids` is taken
    /// from `boids`, and every boid's caps and radii are validated like the
    /// params are.
    pub fn from_boids(
        mut params: FlockParams,
        boids: Vec<Boid>,
        noise: Box<dyn NoiseSource>,
    ) -> Result<Self, ConfigError> {
        params.num_boids = boids.len();
        params.validate()?;

        let cell_size = params.effective_cell_size();
        for boid in &boids {
            for (field, value) in [
                ("max_speed", boid.max_speed),
                ("max_force", boid.max_force),
                ("separation_radius", boid.separation_radius),
                ("influence_radius", boid.influence_radius),
            ] {
                if !(value.is_finite() && value > 0.0) {
                    return Err(ConfigError::NotPositive { field, value });
                }
            }
            let required = boid.separation_radius.max(boid.influence_radius);
            if cell_size < required {
                return Err(ConfigError::CellTooSmall { cell_size, required });
            }
        }

        Ok(Self::assemble(params, boids, noise, 0.0))
    }

    fn assemble(
        params: FlockParams,
        boids: Vec<Boid>,
        noise: Box<dyn NoiseSource>,
        start_phase: f32,
    ) -> Self {
        let grid = SpatialGrid::with_capacity(params.effective_cell_size(), params.hashing, boids.len());
        let heading = GlobalHeading::new(
            vec2(params.heading.base[0], params.heading.base[1]),
            params.heading.intensity * params.max_force,
            params.heading.wander_blend,
            params.heading.phase_step,
            start_phase,
            noise,
        );
        let tracker = TargetTracker::new(params.target.clone());

        info!(
            boids = boids.len(),
            cell_size = grid.cell_size(),
            hashing = ?params.hashing,
            mode = ?params.update_mode,
            "flock created"
        );

        Self {
            forces: Vec::with_capacity(boids.len()),
            stats: FrameStats {
                boids: boids.len(),
                ..FrameStats::default()
            },
            params,
            boids,
            grid,
            heading,
            tracker,
        }
    }

    pub fn params(&self) -> &FlockParams {
        &self.params
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    /// Grid as rebuilt at the start of the last step.
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn target(&self) -> Option<Point2> {
        self.tracker.target()
    }

    pub fn is_seeking(&self) -> bool {
        self.tracker.is_seeking()
    }

    /// Switches to seeking `point` and restarts the arrival streak.
    pub fn set_target(&mut self, point: Point2) {
        self.tracker.set_target(point);
    }

    pub fn clear_target(&mut self) {
        self.tracker.clear();
    }

    /// Resizes the wrap-around world, e.g. after a window resize.
    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<(), ConfigError> {
        for (field, value) in [("world_width", width), ("world_height", height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        self.params.world_width = width;
        self.params.world_height = height;
        Ok(())
    }

    /// Advances the simulation by exactly one tick.
    pub fn step(&mut self) {
        let heading_force = self.heading.advance();
        let event = self.tracker.observe(self.boids.iter().map(|b| b.position));

        self.grid.rebuild(self.boids.iter().map(|b| b.position));

        let seek = self
            .tracker
            .target()
            .map(|target| (target, self.tracker.params().weight));

        let neighbor_checks = match self.params.update_mode {
            UpdateMode::Sequential => self.integrate_sequential(heading_force, seek),
            UpdateMode::Deferred => self.integrate_deferred(heading_force, seek),
        };

        let (arrived, released) = match event {
            TargetEvent::Idle => (0.0, false),
            TargetEvent::Seeking { arrived, .. } => (arrived, false),
            TargetEvent::Released { arrived } => (arrived, true),
        };
        self.stats = FrameStats {
            frame: self.stats.frame + 1,
            boids: self.boids.len(),
            cells_used: self.grid.cells_used(),
            largest_cell: self.grid.largest_cell(),
            neighbor_checks,
            heading_force,
            seeking: self.tracker.is_seeking(),
            arrived,
            streak: self.tracker.streak(),
            released,
        };
        trace!(
            frame = self.stats.frame,
            cells = self.stats.cells_used,
            largest_cell = self.stats.largest_cell,
            neighbor_checks = self.stats.neighbor_checks,
            seeking = self.stats.seeking,
            "step"
        );
    }

    // Integrate each boid as soon as its forces are known.
    // Both integrators return the number of grid candidates visited.
    fn integrate_sequential(&mut self, heading_force: Vec2, seek: Option<(Point2, f32)>) -> usize {
        let (width, height, margin) = self.bounds();
        let mut neighbor_checks = 0;

        for i in 0..self.boids.len() {
            let boid = &self.boids[i];
            let seek_force = seek.map_or(Vec2::ZERO, |(target, weight)| boid.steer_toward(target) * weight);
            let (local, checks) = boid.local_forces(i, &self.boids, &self.grid);
            neighbor_checks += checks;

            let boid = &mut self.boids[i];
            boid.apply_force(heading_force);
            boid.apply_force(seek_force);
            boid.apply_force(local);
            boid.update();
            boid.wrap_edges(width, height, margin);
        }
        neighbor_checks
    }

    // Compute every force against the frozen snapshot, then integrate
    fn integrate_deferred(&mut self, heading_force: Vec2, seek: Option<(Point2, f32)>) -> usize {
        let (width, height, margin) = self.bounds();
        let boids = &self.boids;
        let grid = &self.grid;

        boids
            .par_iter()
            .enumerate()
            .map(|(i, boid)| {
                let seek_force = seek.map_or(Vec2::ZERO, |(target, weight)| boid.steer_toward(target) * weight);
                let (local, checks) = boid.local_forces(i, boids, grid);
                (heading_force + seek_force + local, checks)
            })
            .collect_into_vec(&mut self.forces);

        self.boids
            .par_iter_mut()
            .zip(self.forces.par_iter())
            .for_each(|(boid, &(force, _))| {
                boid.apply_force(force);
                boid.update();
                boid.wrap_edges(width, height, margin);
            });

        self.forces.iter().map(|&(_, checks)| checks).sum()
    }

    fn bounds(&self) -> (f32, f32, f32) {
        (self.params.world_width, self.params.world_height, self.params.wrap_margin)
    }
}

// Initial placement around the spawn origin, heading roughly along the base heading
fn spawn_boids(params: &FlockParams, rng: &mut StdRng) -> Result<Vec<Boid>, ConfigError> {
    let spawn = &params.spawn;
    let mut origin = match spawn.origin {
        Some([x, y]) => pt2(x, y),
        None => pt2(params.world_width / 2.0, params.world_height / 2.0),
    };
    if spawn.origin_jitter > 0.0 {
        let j = spawn.origin_jitter;
        origin += vec2(rng.gen_range(-j..j), rng.gen_range(-j..j));
    }

    let gaussian = Normal::new(0.0f32, spawn.spread).map_err(|_| ConfigError::Negative {
        field: "spawn.spread",
        value: spawn.spread,
    })?;
    let base_angle = params.heading.base[1].atan2(params.heading.base[0]);

    let boids = (0..params.num_boids)
        .map(|_| {
            let offset = match spawn.pattern {
                SpawnPattern::Point => Vec2::ZERO,
                SpawnPattern::Uniform if spawn.spread > 0.0 => {
                    let s = spawn.spread;
                    vec2(rng.gen_range(-s..s), rng.gen_range(-s..s))
                }
                SpawnPattern::Uniform => Vec2::ZERO,
                SpawnPattern::Gaussian => vec2(gaussian.sample(rng), gaussian.sample(rng)),
            };

            let angle = base_angle + rng.gen_range(-FRAC_PI_6..FRAC_PI_6);
            let speed = rng.gen_range(0.5..1.0) * params.max_speed;
            let velocity = vec2(angle.cos(), angle.sin()) * speed;

            Boid::new(origin + offset, velocity, params)
        })
        .collect();

    Ok(boids)
}
