/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each boid follows three local rules, looked up through the spatial grid:
 * 1. Separation: Avoid crowding neighbors
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 *
 * The grid query returns every boid in the surrounding 3x3 cells; each rule
 * then filters by exact squared distance against its own radius. All three
 * rules use the same Reynolds formula, steering = clamp(desired - velocity),
 * and collapse to the zero vector when nobody is in range.
 */

use nannou::prelude::*;

use crate::fast_math::{clamp_magnitude, normalize_to, steer_towards, EPSILON};
use crate::params::FlockParams;
use crate::spatial_grid::SpatialGrid;

pub const SEPARATION_WEIGHT: f32 = 1.5;
pub const ALIGNMENT_WEIGHT: f32 = 0.7;
pub const COHESION_WEIGHT: f32 = 1.0;

/// One fish. Position and velocity are free to change; the caps and radii
/// are fixed when the boid is created, since the flock checks them against
/// the grid cell size only once.
#[derive(Clone, Debug, PartialEq)]
pub struct Boid {
    pub position: Point2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub(crate) max_speed: f32,
    pub(crate) max_force: f32,
    pub(crate) separation_radius: f32,
    pub(crate) influence_radius: f32,
}

impl Boid {
    /// A boid with the caps and radii of `params`.
    pub fn new(position: Point2, velocity: Vec2, params: &FlockParams) -> Self {
        Self {
            position,
            velocity: clamp_magnitude(velocity, params.max_speed),
            acceleration: Vec2::ZERO,
            max_speed: params.max_speed,
            max_force: params.max_force,
            separation_radius: params.separation_radius,
            influence_radius: params.influence_radius,
        }
    }

    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    #[inline]
    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    #[inline]
    pub fn separation_radius(&self) -> f32 {
        self.separation_radius
    }

    #[inline]
    pub fn influence_radius(&self) -> f32 {
        self.influence_radius
    }

    /// Facing angle in radians, derived from the velocity.
    #[inline]
    pub fn heading(&self) -> f32 {
        self.velocity.y.atan2(self.velocity.x)
    }

    // Apply a force to the boid
    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    // Integrate acceleration into velocity and position, then reset it
    pub fn update(&mut self) {
        self.velocity = clamp_magnitude(self.velocity + self.acceleration, self.max_speed);
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
    }

    /// Wraps each axis independently once the boid is more than `margin`
    /// outside `[0, width] x [0, height]`.
    pub fn wrap_edges(&mut self, width: f32, height: f32, margin: f32) {
        if self.position.x < -margin {
            self.position.x = width + margin;
        } else if self.position.x > width + margin {
            self.position.x = -margin;
        }

        if self.position.y < -margin {
            self.position.y = height + margin;
        } else if self.position.y > height + margin {
            self.position.y = -margin;
        }
    }

    /// Seek force towards `target`.
    pub fn steer_toward(&self, target: Point2) -> Vec2 {
        let offset = target - self.position;
        let desired = normalize_to(offset.x, offset.y, self.max_speed);
        steer_towards(desired, self.velocity, self.max_force)
    }

    // Calculate separation force (avoid crowding neighbors)
    pub fn separation(&self, index: usize, boids: &[Boid], grid: &SpatialGrid) -> Vec2 {
        self.separation_scan(index, boids, grid).0
    }

    // Calculate alignment force (steer towards average heading of neighbors)
    pub fn alignment(&self, index: usize, boids: &[Boid], grid: &SpatialGrid) -> Vec2 {
        self.alignment_scan(index, boids, grid).0
    }

    // Calculate cohesion force (steer towards average position of neighbors)
    pub fn cohesion(&self, index: usize, boids: &[Boid], grid: &SpatialGrid) -> Vec2 {
        self.cohesion_scan(index, boids, grid).0
    }

    /// Weighted sum of the three local rules for boid `index`, together with
    /// the number of grid candidates the three queries visited (self included).
    pub fn local_forces(&self, index: usize, boids: &[Boid], grid: &SpatialGrid) -> (Vec2, usize) {
        let (separation, sep_checks) = self.separation_scan(index, boids, grid);
        let (alignment, ali_checks) = self.alignment_scan(index, boids, grid);
        let (cohesion, coh_checks) = self.cohesion_scan(index, boids, grid);

        let force = separation * SEPARATION_WEIGHT + alignment * ALIGNMENT_WEIGHT + cohesion * COHESION_WEIGHT;
        (force, sep_checks + ali_checks + coh_checks)
    }

    // Each scan returns its force and how many candidates the grid handed out

    fn separation_scan(&self, index: usize, boids: &[Boid], grid: &SpatialGrid) -> (Vec2, usize) {
        let limit_sq = self.separation_radius * self.separation_radius;
        let mut push = Vec2::ZERO;
        let mut checks = 0;

        grid.for_each_neighbor(self.position.x, self.position.y, |other| {
            checks += 1;
            if other == index {
                return;
            }
            let away = self.position - boids[other].position;
            let d2 = away.length_squared();
            if d2 > 0.0 && d2 < limit_sq {
                // Unit vector weighted by 1/d, folded into one division
                push += away / d2;
            }
        });

        if push.length_squared() <= EPSILON {
            return (Vec2::ZERO, checks);
        }
        let desired = normalize_to(push.x, push.y, self.max_speed);
        (steer_towards(desired, self.velocity, self.max_force), checks)
    }

    fn alignment_scan(&self, index: usize, boids: &[Boid], grid: &SpatialGrid) -> (Vec2, usize) {
        let limit_sq = self.influence_radius * self.influence_radius;
        let mut heading_sum = Vec2::ZERO;
        let mut checks = 0;

        grid.for_each_neighbor(self.position.x, self.position.y, |other| {
            checks += 1;
            if other == index {
                return;
            }
            let neighbor = &boids[other];
            let d2 = self.position.distance_squared(neighbor.position);
            if d2 > 0.0 && d2 < limit_sq {
                heading_sum += neighbor.velocity;
            }
        });

        // Also covers neighbors whose headings cancel out
        if heading_sum.length_squared() <= EPSILON {
            return (Vec2::ZERO, checks);
        }
        let desired = normalize_to(heading_sum.x, heading_sum.y, self.max_speed);
        (steer_towards(desired, self.velocity, self.max_force), checks)
    }

    fn cohesion_scan(&self, index: usize, boids: &[Boid], grid: &SpatialGrid) -> (Vec2, usize) {
        let limit_sq = self.influence_radius * self.influence_radius;
        let mut position_sum = Vec2::ZERO;
        let mut count = 0u32;
        let mut checks = 0;

        grid.for_each_neighbor(self.position.x, self.position.y, |other| {
            checks += 1;
            if other == index {
                return;
            }
            let neighbor = &boids[other];
            let d2 = self.position.distance_squared(neighbor.position);
            if d2 > 0.0 && d2 < limit_sq {
                position_sum += neighbor.position;
                count += 1;
            }
        });

        if count == 0 {
            return (Vec2::ZERO, checks);
        }
        let centroid = position_sum / count as f32;
        let offset = centroid - self.position;
        let desired = normalize_to(offset.x, offset.y, self.max_speed);
        (steer_towards(desired, self.velocity, self.max_force), checks)
    }
}
