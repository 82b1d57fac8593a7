//! Entrance fade followed by an endless levitation loop

use crate::types::{Gravity, Point};

/// One sampled animation state, applied to the surface by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Surface opacity (0.0 to 1.0)
    pub alpha: f32,
    /// Translation added to the surface position
    pub translation: Point,
}

impl AnimationFrame {
    /// Fully visible, not displaced
    pub const REST: AnimationFrame = AnimationFrame {
        alpha: 1.0,
        translation: Point::ZERO,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SequencerState {
    Idle,
    Running { started_at: u64 },
    Cancelled,
}

/// Plays the two animation segments back to back.
///
/// Time is supplied by the host's frame clock in milliseconds; the sequencer
/// keeps no clock of its own.
#[derive(Debug, Clone)]
pub struct AnimationSequencer {
    fade_in_ms: u64,
    levitate_ms: u64,
    amplitude: f32,
    vertical: bool,
    state: SequencerState,
}

impl AnimationSequencer {
    pub fn new(gravity: Gravity, amplitude: f32, fade_in_ms: u64, levitate_ms: u64) -> Self {
        Self {
            fade_in_ms,
            levitate_ms,
            amplitude,
            vertical: gravity.is_vertical(),
            state: SequencerState::Idle,
        }
    }

    /// Begin playing at `now_ms`; ignored unless idle
    pub fn start(&mut self, now_ms: u64) {
        if self.state == SequencerState::Idle {
            self.state = SequencerState::Running { started_at: now_ms };
        }
    }

    /// Stop for good. Later samples return `None` and `start` has no effect.
    pub fn cancel(&mut self) {
        if matches!(self.state, SequencerState::Running { .. }) {
            log::debug!("animation cancelled");
        }
        self.state = SequencerState::Cancelled;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SequencerState::Running { .. })
    }

    /// Frame to display at `now_ms`, `None` when not running
    pub fn sample(&self, now_ms: u64) -> Option<AnimationFrame> {
        let SequencerState::Running { started_at } = self.state else {
            return None;
        };
        let elapsed = now_ms.saturating_sub(started_at);

        if elapsed < self.fade_in_ms {
            let alpha = elapsed as f32 / self.fade_in_ms as f32;
            return Some(AnimationFrame {
                alpha,
                translation: self.along_axis(-self.amplitude),
            });
        }

        Some(AnimationFrame {
            alpha: 1.0,
            translation: self.along_axis(self.levitation(elapsed - self.fade_in_ms)),
        })
    }

    /// Offset `elapsed` ms into the levitation loop
    fn levitation(&self, elapsed: u64) -> f32 {
        if self.levitate_ms == 0 {
            return 0.0;
        }
        let sweep = elapsed / self.levitate_ms;
        let progress = (elapsed % self.levitate_ms) as f32 / self.levitate_ms as f32;
        let eased = accelerate_decelerate(progress);
        let travel = 2.0 * self.amplitude * eased;
        // even sweeps rise from -amplitude, odd sweeps fall back
        if sweep % 2 == 0 {
            -self.amplitude + travel
        } else {
            self.amplitude - travel
        }
    }

    fn along_axis(&self, offset: f32) -> Point {
        if self.vertical {
            Point::new(0.0, offset)
        } else {
            Point::new(offset, 0.0)
        }
    }
}

/// Ease-in-ease-out curve: slow start, fast middle, slow end
pub fn accelerate_decelerate(t: f32) -> f32 {
    ((t + 1.0) * std::f32::consts::PI).cos() / 2.0 + 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_easing_endpoints() {
        assert!(close(accelerate_decelerate(0.0), 0.0));
        assert!(close(accelerate_decelerate(0.5), 0.5));
        assert!(close(accelerate_decelerate(1.0), 1.0));
    }

    #[test]
    fn test_idle_sequencer_yields_nothing() {
        let seq = AnimationSequencer::new(Gravity::Top, 4.0, 150, 800);
        assert_eq!(seq.sample(100), None);
        assert!(!seq.is_running());
    }

    #[test]
    fn test_fade_then_levitate_vertically() {
        let mut seq = AnimationSequencer::new(Gravity::Bottom, 4.0, 100, 800);
        seq.start(1_000);

        let f = seq.sample(1_000).unwrap();
        assert_eq!(f.alpha, 0.0);
        assert_eq!(f.translation, Point::new(0.0, -4.0));

        let f = seq.sample(1_050).unwrap();
        assert!(close(f.alpha, 0.5));

        let f = seq.sample(1_100).unwrap();
        assert_eq!(f.alpha, 1.0);
        assert!(close(f.translation.y, -4.0));

        let f = seq.sample(1_500).unwrap();
        assert!(close(f.translation.y, 0.0));

        // end of first sweep, direction reverses
        let f = seq.sample(1_900).unwrap();
        assert!(close(f.translation.y, 4.0));

        let f = seq.sample(2_300).unwrap();
        assert!(close(f.translation.y, 0.0));

        let f = seq.sample(2_700).unwrap();
        assert!(close(f.translation.y, -4.0));
        assert_eq!(f.translation.x, 0.0);
    }

    #[test]
    fn test_horizontal_axis_for_side_gravity() {
        let mut seq = AnimationSequencer::new(Gravity::End, 3.0, 0, 400);
        seq.start(0);
        let f = seq.sample(400).unwrap();
        assert!(close(f.translation.x, 3.0));
        assert_eq!(f.translation.y, 0.0);
    }

    #[test]
    fn test_cancel_is_final() {
        let mut seq = AnimationSequencer::new(Gravity::Top, 4.0, 150, 800);
        seq.start(0);
        assert!(seq.is_running());
        seq.cancel();
        assert_eq!(seq.sample(10), None);
        seq.start(20);
        assert!(!seq.is_running());
    }
}
