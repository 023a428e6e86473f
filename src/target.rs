/*
 * Target Module
 *
 * The target acquisition / release state machine.
 *
 *   Idle --set_target--> Seeking --enough boids arrived for N frames--> Idle
 *
 * While seeking, every frame counts the share of the flock that is inside the
 * arrival radius. Each qualifying frame extends the streak, any other frame
 * resets it, and the target is dropped once the streak reaches the required
 * length.
 */

use nannou::prelude::*;
use tracing::info;

use crate::params::TargetParams;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetState {
    Idle,
    Seeking(Point2),
}

/// What happened to the target during one observed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetEvent {
    /// No target, nothing to do.
    Idle,
    /// Still seeking; `arrived` is the fraction of the flock in range.
    Seeking { arrived: f32, streak: u32 },
    /// The streak completed this frame and the target was cleared.
    Released { arrived: f32 },
}

pub struct TargetTracker {
    params: TargetParams,
    state: TargetState,
    streak: u32,
    last_arrived: f32,
}

impl TargetTracker {
    pub fn new(params: TargetParams) -> Self {
        Self {
            params,
            state: TargetState::Idle,
            streak: 0,
            last_arrived: 0.0,
        }
    }

    pub fn params(&self) -> &TargetParams {
        &self.params
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    pub fn target(&self) -> Option<Point2> {
        match self.state {
            TargetState::Seeking(point) => Some(point),
            TargetState::Idle => None,
        }
    }

    pub fn is_seeking(&self) -> bool {
        matches!(self.state, TargetState::Seeking(_))
    }

    /// Consecutive qualifying frames so far.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Arrival fraction measured on the last seeking frame.
    pub fn last_arrived(&self) -> f32 {
        self.last_arrived
    }

    /// Starts (or restarts) seeking `point`, resetting the streak.
    pub fn set_target(&mut self, point: Point2) {
        info!(x = point.x, y = point.y, "target acquired");
        self.state = TargetState::Seeking(point);
        self.streak = 0;
        self.last_arrived = 0.0;
    }

    pub fn clear(&mut self) {
        if self.is_seeking() {
            info!("target cleared");
        }
        self.state = TargetState::Idle;
        self.streak = 0;
    }

    /// Runs the release rule for one frame over the current positions.
    pub fn observe<I>(&mut self, positions: I) -> TargetEvent
    where
        I: IntoIterator<Item = Point2>,
    {
        let target = match self.state {
            TargetState::Seeking(point) => point,
            TargetState::Idle => return TargetEvent::Idle,
        };

        let radius_sq = self.params.arrival_radius * self.params.arrival_radius;
        let mut total = 0usize;
        let mut near = 0usize;
        for position in positions {
            total += 1;
            if position.distance_squared(target) < radius_sq {
                near += 1;
            }
        }
        let arrived = if total == 0 { 0.0 } else { near as f32 / total as f32 };
        self.last_arrived = arrived;

        if total > 0 && arrived >= self.params.threshold {
            self.streak += 1;
        } else {
            self.streak = 0;
        }

        if self.streak >= self.params.required_frames {
            info!(arrived, frames = self.streak, "target reached, releasing");
            self.state = TargetState::Idle;
            self.streak = 0;
            return TargetEvent::Released { arrived };
        }

        TargetEvent::Seeking {
            arrived,
            streak: self.streak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(required_frames: u32) -> TargetTracker {
        TargetTracker::new(TargetParams {
            arrival_radius: 5.0,
            threshold: 0.5,
            required_frames,
            weight: 2.0,
        })
    }

    // Two of four boids on the target: exactly the 0.5 threshold
    fn qualifying() -> Vec<Point2> {
        vec![pt2(0.0, 0.0), pt2(1.0, 1.0), pt2(50.0, 0.0), pt2(0.0, 50.0)]
    }

    fn not_qualifying() -> Vec<Point2> {
        vec![pt2(0.0, 0.0), pt2(20.0, 0.0), pt2(50.0, 0.0), pt2(0.0, 50.0)]
    }

    #[test]
    fn idle_tracker_does_nothing() {
        let mut t = tracker(3);
        assert_eq!(t.observe(qualifying()), TargetEvent::Idle);
        assert!(!t.is_seeking());
        assert_eq!(t.streak(), 0);
    }

    #[test]
    fn releases_after_exact_streak() {
        let mut t = tracker(3);
        t.set_target(pt2(0.0, 0.0));

        assert_eq!(t.observe(qualifying()), TargetEvent::Seeking { arrived: 0.5, streak: 1 });
        assert_eq!(t.observe(qualifying()), TargetEvent::Seeking { arrived: 0.5, streak: 2 });
        assert!(t.is_seeking());
        assert_eq!(t.observe(qualifying()), TargetEvent::Released { arrived: 0.5 });
        assert!(!t.is_seeking());
        assert_eq!(t.target(), None);
        assert_eq!(t.streak(), 0);
    }

    #[test]
    fn interrupted_streak_starts_over() {
        let mut t = tracker(3);
        t.set_target(pt2(0.0, 0.0));

        t.observe(qualifying());
        t.observe(qualifying());
        assert_eq!(t.observe(not_qualifying()), TargetEvent::Seeking { arrived: 0.25, streak: 0 });
        assert!(t.is_seeking());

        t.observe(qualifying());
        t.observe(qualifying());
        assert!(t.is_seeking(), "released before three consecutive frames");
        assert!(matches!(t.observe(qualifying()), TargetEvent::Released { .. }));
    }

    #[test]
    fn arrival_radius_is_strict() {
        let mut t = tracker(1);
        t.set_target(pt2(0.0, 0.0));
        // Both boids sit exactly on the radius
        let event = t.observe(vec![pt2(5.0, 0.0), pt2(0.0, -5.0)]);
        assert_eq!(event, TargetEvent::Seeking { arrived: 0.0, streak: 0 });
    }

    #[test]
    fn new_target_resets_streak() {
        let mut t = tracker(3);
        t.set_target(pt2(0.0, 0.0));
        t.observe(qualifying());
        t.observe(qualifying());

        t.set_target(pt2(100.0, 100.0));
        assert_eq!(t.streak(), 0);
        assert_eq!(t.target(), Some(pt2(100.0, 100.0)));
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut t = tracker(3);
        t.set_target(pt2(1.0, 2.0));
        t.observe(qualifying());
        t.clear();
        assert_eq!(t.state(), TargetState::Idle);
        assert_eq!(t.streak(), 0);
    }
}
