/*
 * Wander Module
 *
 * The shared heading force of the school. Each frame a phase is advanced and
 * fed through smooth 1D noise to get a slowly turning wander direction, which
 * is blended with the base heading and scaled to a small fixed magnitude.
 * Consecutive frames sample nearby phases, so the drift is correlated over
 * time instead of jittering.
 */

use std::f32::consts::TAU;

use nannou::noise::{NoiseFn, Perlin, Seedable};
use nannou::prelude::*;
use rand::Rng;

use crate::fast_math::normalize_to;

/// A smooth noise signal over one dimension.
pub trait NoiseSource: Send {
    /// Value in `[0, 1]`; close inputs give close outputs.
    fn sample(&self, t: f32) -> f32;
}

// The Perlin permutation table repeats every 256 lattice units
const PERIOD: f32 = 256.0;

/// Seeded Perlin noise, read along the x axis of the plane.
pub struct PerlinNoise {
    perlin: Perlin,
}

impl PerlinNoise {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_seed(rng.gen())
    }

    pub fn with_seed(seed: u32) -> Self {
        Self {
            perlin: Perlin::new().set_seed(seed),
        }
    }
}

impl NoiseSource for PerlinNoise {
    fn sample(&self, t: f32) -> f32 {
        let value = self.perlin.get([t as f64, 0.0]) as f32;
        (0.5 + 0.5 * value).clamp(0.0, 1.0)
    }
}

/// Generates the heading force applied to every boid of a flock.
pub struct GlobalHeading {
    base: Vec2,
    magnitude: f32,
    wander_blend: f32,
    phase_step: f32,
    phase: f32,
    noise: Box<dyn NoiseSource>,
}

impl GlobalHeading {
    pub fn new(
        base: Vec2,
        magnitude: f32,
        wander_blend: f32,
        phase_step: f32,
        start_phase: f32,
        noise: Box<dyn NoiseSource>,
    ) -> Self {
        Self {
            base,
            magnitude,
            wander_blend,
            phase_step,
            phase: start_phase.rem_euclid(PERIOD),
            noise,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    /// Advances one frame and returns this frame's heading force.
    pub fn advance(&mut self) -> Vec2 {
        // The noise repeats every PERIOD units, so wrapping keeps f32 precision
        self.phase = (self.phase + self.phase_step).rem_euclid(PERIOD);

        let angle = self.noise.sample(self.phase) * TAU;
        let wander = vec2(angle.cos(), angle.sin());
        let blended = self.base.lerp(wander, self.wander_blend);
        normalize_to(blended.x, blended.y, self.magnitude)
    }
}
