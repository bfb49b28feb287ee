//! Viewport move between two rooms, advanced one frame at a time.

use bevy::math::Vec2;

use crate::engine::config::TransitionConfig;
use crate::grid::GridCell;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionStep {
    Moving(Vec2),
    /// Final position, already snapped to the target.
    Arrived(Vec2),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub from: Option<GridCell>,
    pub target: GridCell,
    start: Vec2,
    end: Vec2,
    elapsed: f32,
    duration: f32,
    timeout: f32,
    threshold: f32,
}

impl Transition {
    pub fn new(
        from: Option<GridCell>,
        target: GridCell,
        start: Vec2,
        end: Vec2,
        config: &TransitionConfig,
    ) -> Self {
        Self {
            from,
            target,
            start,
            end,
            elapsed: 0.0,
            duration: config.duration,
            timeout: config.timeout,
            threshold: config.position_threshold,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn destination(&self) -> Vec2 {
        self.end
    }

    /// Advance by `dt` seconds. Completes once the interpolated position is
    /// within the threshold of the target, or the timeout has elapsed.
    pub fn advance(&mut self, dt: f32) -> TransitionStep {
        self.elapsed += dt.max(0.0);
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        let position = self.start.lerp(self.end, t);

        if position.distance(self.end) <= self.threshold || self.elapsed >= self.timeout {
            TransitionStep::Arrived(self.end)
        } else {
            TransitionStep::Moving(position)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(config: TransitionConfig) -> Transition {
        Transition::new(
            None,
            GridCell::new(1, 0),
            Vec2::ZERO,
            Vec2::new(16.0, 0.0),
            &config,
        )
    }

    #[test]
    fn test_moves_towards_target() {
        let mut tr = transition(TransitionConfig::default());
        match tr.advance(0.1) {
            TransitionStep::Moving(p) => {
                assert!(p.x > 0.0 && p.x < 16.0);
                assert_eq!(p.y, 0.0);
            }
            other => panic!("expected Moving, got {:?}", other),
        }
    }

    #[test]
    fn test_arrives_after_duration() {
        let mut tr = transition(TransitionConfig::default());
        let mut steps = 0;
        loop {
            steps += 1;
            if let TransitionStep::Arrived(p) = tr.advance(1.0 / 60.0) {
                assert_eq!(p, Vec2::new(16.0, 0.0));
                break;
            }
            assert!(steps < 120, "transition never completed");
        }
        assert!(tr.elapsed() <= 0.35 + 1.0 / 60.0 + f32::EPSILON);
    }

    #[test]
    fn test_timeout_ends_stalled_move() {
        // Duration far beyond the timeout: the threshold is never met in time.
        let mut tr = transition(TransitionConfig {
            duration: 100.0,
            timeout: 0.5,
            position_threshold: 0.0,
        });
        assert!(matches!(tr.advance(0.25), TransitionStep::Moving(_)));
        assert_eq!(tr.advance(0.25), TransitionStep::Arrived(Vec2::new(16.0, 0.0)));
    }

    #[test]
    fn test_zero_distance_arrives_immediately() {
        let mut tr = Transition::new(
            None,
            GridCell::new(0, 0),
            Vec2::ONE,
            Vec2::ONE,
            &TransitionConfig::default(),
        );
        assert_eq!(tr.advance(0.0), TransitionStep::Arrived(Vec2::ONE));
    }

    #[test]
    fn test_negative_dt_ignored() {
        let mut tr = transition(TransitionConfig::default());
        tr.advance(-5.0);
        assert_eq!(tr.elapsed(), 0.0);
    }
}
