//! Modal machine state replay
//!
//! Each token is overlaid on the current position: omitted axes keep their
//! previous values, and the feed changes only when F is given. Every token
//! yields one [`SegmentMetric`].

use super::tokenizer::ProgramToken;
use reliefkit_core::{AxisWords, MotionKind, Position};
use serde::{Deserialize, Serialize};

/// Modal machine state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MachineState {
    /// Current position
    pub position: Position,
    /// Current feed rate (mm/min)
    pub feed: f64,
}

/// Distance and time attributed to one processed line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetric {
    /// 1-based line number in the program
    pub line_number: usize,
    /// First G-word number, if any
    pub g_word: Option<u32>,
    /// Motion classification; `None` when the line had no G-word
    pub motion: Option<MotionKind>,
    /// Straight-line distance travelled (mm)
    pub distance: f64,
    /// Cutting time (seconds); zero for everything but cuts with a feed
    pub time: f64,
    /// Feed in effect for this line (mm/min)
    pub feed_at_line: f64,
    /// False when the distance was within the tolerance
    pub moved: bool,
    /// Values the line set explicitly
    pub words: AxisWords,
    /// Position after the line
    pub end: Position,
}

/// Replays tokens against a [`MachineState`]
#[derive(Debug, Clone)]
pub struct MachineStateTracker {
    state: MachineState,
    tolerance: f64,
}

impl MachineStateTracker {
    /// Tracker starting at the origin with zero feed
    pub fn new(tolerance: f64) -> Self {
        Self {
            state: MachineState::default(),
            tolerance,
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Back to the origin with zero feed
    pub fn reset(&mut self) {
        self.state = MachineState::default();
    }

    /// Apply one token and return its metric
    pub fn apply(&mut self, token: &ProgramToken, line_number: usize) -> SegmentMetric {
        let start = self.state.position;
        let end = token.words.apply_to(&start);
        let distance = start.distance_to(&end);
        let feed_at_line = token.words.f.unwrap_or(self.state.feed);
        let moved = distance > self.tolerance;

        let time = match token.motion {
            Some(MotionKind::Cut) if moved && feed_at_line > 0.0 => distance / (feed_at_line / 60.0),
            _ => 0.0,
        };

        self.state.position = end;
        if let Some(feed) = token.words.f {
            self.state.feed = feed;
        }

        SegmentMetric {
            line_number,
            g_word: token.g_word,
            motion: token.motion,
            distance,
            time,
            feed_at_line,
            moved,
            words: token.words,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::tokenizer::ProgramTokenizer;

    fn token(line: &str) -> ProgramToken {
        ProgramTokenizer::new().tokenize(line, 1).unwrap()
    }

    #[test]
    fn test_cut_from_origin() {
        let mut tracker = MachineStateTracker::new(1e-6);
        let metric = tracker.apply(&token("G1 X10 Y0 Z-1 F600"), 1);

        assert!((metric.distance - 10.0499).abs() < 1e-4);
        assert!((metric.time - 1.00499).abs() < 1e-5);
        assert_eq!(metric.feed_at_line, 600.0);
        assert_eq!(tracker.state().feed, 600.0);
        assert_eq!(tracker.state().position, Position::new(10.0, 0.0, -1.0));
    }

    #[test]
    fn test_rapid_has_no_time() {
        let mut tracker = MachineStateTracker::new(1e-6);
        let metric = tracker.apply(&token("G0 X3 Y4 F1000"), 1);
        assert!((metric.distance - 5.0).abs() < 1e-12);
        assert_eq!(metric.time, 0.0);
    }

    #[test]
    fn test_cut_without_feed_has_no_time() {
        let mut tracker = MachineStateTracker::new(1e-6);
        let metric = tracker.apply(&token("G1 X5"), 1);
        assert_eq!(metric.distance, 5.0);
        assert_eq!(metric.time, 0.0);
    }

    #[test]
    fn test_modal_axes_and_feed() {
        let mut tracker = MachineStateTracker::new(1e-6);
        tracker.apply(&token("G1 X1 Y2 Z3 F100"), 1);
        let metric = tracker.apply(&token("G1 Y5"), 2);

        assert_eq!(metric.end, Position::new(1.0, 5.0, 3.0));
        assert_eq!(metric.feed_at_line, 100.0);
        assert!((metric.time - 3.0 / (100.0 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_move_is_not_movement_but_updates_state() {
        let mut tracker = MachineStateTracker::new(1e-3);
        let metric = tracker.apply(&token("G1 X0.0001 F600"), 1);
        assert!(!metric.moved);
        assert_eq!(metric.time, 0.0);
        assert_eq!(tracker.state().position.x, 0.0001);
    }

    #[test]
    fn test_non_motion_g_word_advances_state() {
        let mut tracker = MachineStateTracker::new(1e-6);
        let metric = tracker.apply(&token("G90 X7"), 1);
        assert_eq!(metric.motion, Some(MotionKind::Other));
        assert_eq!(metric.distance, 7.0);
        assert_eq!(metric.time, 0.0);
        assert_eq!(tracker.state().position.x, 7.0);
    }

    #[test]
    fn test_reset() {
        let mut tracker = MachineStateTracker::new(1e-6);
        tracker.apply(&token("G1 X1 F10"), 1);
        tracker.reset();
        assert_eq!(*tracker.state(), MachineState::default());
    }
}
