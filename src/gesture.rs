//! Drag gesture state machine for drawing new boxes.

use crate::store::BoundingBox;
use rand::seq::SliceRandom;
use rand::Rng;

/// Both sides of a drawn box must strictly exceed this (display pixels) or
/// the box is discarded at gesture end.
pub const MIN_BOX_SIDE: f32 = 10.0;

/// Cosmetic accents assigned to new boxes, one picked at random per gesture.
pub const PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FECA57", "#FF9FF3", "#A8E6CF", "#FFD93D",
];

/// Uniform palette pick, isolated from the geometry logic.
pub fn pick_color<R: Rng>(palette: &[&'static str], rng: &mut R) -> &'static str {
    palette.choose(rng).copied().unwrap_or("#FF6B6B")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawPhase {
    Idle,
    Drawing,
}

/// Turns raw pointer events into box-drawing sessions.
///
/// At most one ephemeral box exists at a time; it only reaches the store via
/// the value returned from [`GestureTracker::pointer_up`]. Ids are assigned
/// monotonically at gesture start and never reused, so a discarded gesture
/// leaves a gap.
#[derive(Debug)]
pub struct GestureTracker {
    current: Option<BoundingBox>,
    next_id: u64,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self {
            current: None,
            next_id: 1,
        }
    }

    pub fn phase(&self) -> DrawPhase {
        if self.current.is_some() {
            DrawPhase::Drawing
        } else {
            DrawPhase::Idle
        }
    }

    /// The in-progress box, for preview rendering.
    pub fn current_box(&self) -> Option<&BoundingBox> {
        self.current.as_ref()
    }

    /// Starts a drawing session at `(x, y)` with both corners collapsed onto
    /// the start point. A pointer-down while a session is already active is
    /// ignored: the live session keeps its anchor.
    pub fn pointer_down(&mut self, x: f32, y: f32, color: &str) {
        if self.current.is_some() {
            log::debug!("ignoring pointer-down mid-gesture at ({x:.1}, {y:.1})");
            return;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.current = Some(BoundingBox {
            id,
            x1: x,
            y1: y,
            x2: x,
            y2: y,
            label: String::new(),
            color: color.to_string(),
        });
    }

    /// Moves only the second corner; the anchor corner is immutable for the
    /// session. Ignored when idle.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(b) = self.current.as_mut() {
            b.x2 = x;
            b.y2 = y;
        }
    }

    /// Ends the session. Returns the box for committing when both sides
    /// strictly exceed [`MIN_BOX_SIDE`]; otherwise the gesture is silently
    /// discarded. The ephemeral box is cleared either way.
    pub fn pointer_up(&mut self) -> Option<BoundingBox> {
        let b = self.current.take()?;
        if b.width() > MIN_BOX_SIDE && b.height() > MIN_BOX_SIDE {
            Some(b)
        } else {
            log::debug!(
                "discarding {:.1}x{:.1} box below minimum size",
                b.width(),
                b.height()
            );
            None
        }
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(tracker: &mut GestureTracker, from: (f32, f32), to: (f32, f32)) -> Option<BoundingBox> {
        tracker.pointer_down(from.0, from.1, "#FECA57");
        tracker.pointer_move(to.0, to.1);
        tracker.pointer_up()
    }

    #[test]
    fn drag_commits_box_with_unsorted_corners() {
        let mut tracker = GestureTracker::new();
        let b = drag(&mut tracker, (150.0, 150.0), (50.0, 50.0)).unwrap();
        assert_eq!((b.x1, b.y1, b.x2, b.y2), (150.0, 150.0, 50.0, 50.0));
        assert_eq!(b.label, "");
        assert_eq!(b.color, "#FECA57");
        assert_eq!(tracker.phase(), DrawPhase::Idle);
    }

    #[test]
    fn tiny_drag_is_discarded() {
        let mut tracker = GestureTracker::new();
        assert!(drag(&mut tracker, (10.0, 10.0), (15.0, 12.0)).is_none());
        assert!(tracker.current_box().is_none());
    }

    #[test]
    fn threshold_is_strict_per_axis() {
        let mut tracker = GestureTracker::new();
        // Exactly 10 on either axis is not enough.
        assert!(drag(&mut tracker, (0.0, 0.0), (10.0, 50.0)).is_none());
        assert!(drag(&mut tracker, (0.0, 0.0), (50.0, 10.0)).is_none());
        assert!(drag(&mut tracker, (0.0, 0.0), (10.1, 10.1)).is_some());
    }

    #[test]
    fn anchor_corner_is_immutable() {
        let mut tracker = GestureTracker::new();
        tracker.pointer_down(30.0, 40.0, "#FF6B6B");
        tracker.pointer_move(100.0, 90.0);
        tracker.pointer_move(80.0, 70.0);
        let b = tracker.current_box().unwrap();
        assert_eq!((b.x1, b.y1), (30.0, 40.0));
        assert_eq!((b.x2, b.y2), (80.0, 70.0));
    }

    #[test]
    fn second_pointer_down_is_ignored() {
        let mut tracker = GestureTracker::new();
        tracker.pointer_down(10.0, 10.0, "#FF6B6B");
        tracker.pointer_down(500.0, 500.0, "#4ECDC4");
        let b = tracker.current_box().unwrap();
        assert_eq!((b.x1, b.y1), (10.0, 10.0));
        assert_eq!(b.color, "#FF6B6B");
    }

    #[test]
    fn move_and_up_when_idle_are_noops() {
        let mut tracker = GestureTracker::new();
        tracker.pointer_move(5.0, 5.0);
        assert!(tracker.pointer_up().is_none());
        assert_eq!(tracker.phase(), DrawPhase::Idle);
    }

    #[test]
    fn ids_are_monotonic_across_discarded_gestures() {
        let mut tracker = GestureTracker::new();
        let a = drag(&mut tracker, (0.0, 0.0), (50.0, 50.0)).unwrap();
        assert!(drag(&mut tracker, (0.0, 0.0), (2.0, 2.0)).is_none());
        let c = drag(&mut tracker, (0.0, 0.0), (60.0, 60.0)).unwrap();
        assert!(c.id > a.id);
    }

    #[test]
    fn pick_color_comes_from_the_palette() {
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let c = pick_color(&PALETTE, &mut rng);
            assert!(PALETTE.contains(&c));
        }
    }
}
