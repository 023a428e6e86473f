/*
 * Debug Information Module
 *
 * This module defines the statistics shown in the UI:
 * - FrameStats, produced by the flock at the end of every step
 * - DebugInfo, the viewer side (FPS, frame time) plus the latest FrameStats
 */

use std::time::Duration;

use nannou::prelude::*;

/// What the last simulation step did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub boids: usize,
    pub cells_used: usize,
    pub largest_cell: usize,
    /// Grid candidates visited by all neighbor queries of the step.
    pub neighbor_checks: usize,
    pub heading_force: Vec2,
    pub seeking: bool,
    /// Fraction of the flock inside the arrival radius (seeking frames only).
    pub arrived: f32,
    pub streak: u32,
    /// The target was released during this frame.
    pub released: bool,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frame: 0,
            boids: 0,
            cells_used: 0,
            largest_cell: 0,
            neighbor_checks: 0,
            heading_force: Vec2::ZERO,
            seeking: false,
            arrived: 0.0,
            streak: 0,
            released: false,
        }
    }
}

// Debug information to display
#[derive(Default)]
pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    pub frame: FrameStats,
}
