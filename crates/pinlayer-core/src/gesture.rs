//! Pointer gesture model: hit targets, raw pointer events, and the
//! drag-vs-click state machine.
//!
//! `GestureTracker` follows one pointer session from pointer-down to
//! pointer-up. Movement while a pin is held turns the press into a drag and
//! arms a one-shot guard; the next click evaluation consumes the guard, so
//! the click the platform delivers after releasing a drag is swallowed
//! instead of opening a new-comment popup.

use serde::{Deserialize, Serialize};

use crate::models::Point;

/// What the pointer was over when an event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerTarget {
    /// The canvas itself, not a pin or the popup.
    Canvas,
    /// The pin rendered for the comment at this list index.
    Pin(usize),
    /// The new-comment input popup.
    Popup,
    /// Anywhere else in the document.
    Outside,
}

/// A raw pointer event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { position: Point, target: PointerTarget },
    Move { position: Point },
    Up { position: Point },
    Click { position: Point, target: PointerTarget },
    DoubleClick { target: PointerTarget },
}

/// Active gesture between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    /// No button held on a pin.
    #[default]
    Idle,
    /// Pressed on the pin at `index`; no movement seen yet.
    PotentialDrag { index: usize },
    /// Pin at `index` is following the pointer.
    Dragging { index: usize },
}

impl GestureState {
    /// Index of the pin held by the current gesture, if any.
    #[must_use]
    pub const fn active_index(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::PotentialDrag { index } | Self::Dragging { index } => Some(index),
        }
    }
}

/// Drag-vs-click classifier for a single pointer.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    state: GestureState,
    suppress_next_click: bool,
}

impl GestureTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> GestureState {
        self.state
    }

    /// Whether the next click will be swallowed.
    #[must_use]
    pub const fn click_suppressed(&self) -> bool {
        self.suppress_next_click
    }

    /// Pointer pressed anywhere, starting a new session.
    ///
    /// A guard still armed from a drag released outside the container never
    /// saw its trailing click, so a fresh press disarms it.
    pub fn press(&mut self) {
        self.state = GestureState::Idle;
        self.suppress_next_click = false;
    }

    /// Pointer pressed on the pin at `index`.
    pub fn press_pin(&mut self, index: usize) {
        self.press();
        self.state = GestureState::PotentialDrag { index };
    }

    /// Pointer moved. Returns the index of the pin being dragged.
    pub fn movement(&mut self) -> Option<usize> {
        let index = self.state.active_index()?;
        self.state = GestureState::Dragging { index };
        self.suppress_next_click = true;
        Some(index)
    }

    /// Pointer released. Returns the dragged index when the press became a drag.
    pub fn release(&mut self) -> Option<usize> {
        let previous = std::mem::take(&mut self.state);
        match previous {
            GestureState::Dragging { index } => Some(index),
            GestureState::Idle | GestureState::PotentialDrag { .. } => None,
        }
    }

    /// Consume the one-shot guard. `true` means this click must be ignored.
    pub fn take_click_suppression(&mut self) -> bool {
        std::mem::take(&mut self.suppress_next_click)
    }

    /// Drop any gesture in progress, e.g. when the pin list is replaced.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
        self.suppress_next_click = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_without_movement_is_a_click() {
        let mut tracker = GestureTracker::new();
        tracker.press_pin(1);
        assert_eq!(tracker.state(), GestureState::PotentialDrag { index: 1 });
        assert_eq!(tracker.release(), None);
        assert!(!tracker.take_click_suppression());
    }

    #[test]
    fn movement_promotes_to_drag_and_arms_guard() {
        let mut tracker = GestureTracker::new();
        tracker.press_pin(2);
        assert_eq!(tracker.movement(), Some(2));
        assert_eq!(tracker.state(), GestureState::Dragging { index: 2 });
        assert_eq!(tracker.movement(), Some(2));
        assert_eq!(tracker.release(), Some(2));
        assert_eq!(tracker.state(), GestureState::Idle);
        assert!(tracker.take_click_suppression());
        // one-shot
        assert!(!tracker.take_click_suppression());
    }

    #[test]
    fn movement_while_idle_is_ignored() {
        let mut tracker = GestureTracker::new();
        assert_eq!(tracker.movement(), None);
        assert!(!tracker.click_suppressed());
    }

    #[test]
    fn new_press_disarms_stale_guard() {
        let mut tracker = GestureTracker::new();
        tracker.press_pin(0);
        tracker.movement();
        tracker.release();
        assert!(tracker.click_suppressed());

        tracker.press_pin(0);
        assert!(!tracker.click_suppressed());
    }

    #[test]
    fn press_off_pin_disarms_stale_guard_and_drops_held_pin() {
        let mut tracker = GestureTracker::new();
        tracker.press_pin(1);
        tracker.movement();
        tracker.release();
        tracker.press_pin(1);
        tracker.movement();

        tracker.press();
        assert_eq!(tracker.state(), GestureState::Idle);
        assert!(!tracker.click_suppressed());
        assert_eq!(tracker.movement(), None);
    }

    #[test]
    fn pointer_event_json_shape() {
        let event: PointerEvent = serde_json::from_str(
            r#"{"type":"down","position":{"x":5.0,"y":6.0},"target":{"pin":3}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            PointerEvent::Down {
                position: Point::new(5.0, 6.0),
                target: PointerTarget::Pin(3),
            }
        );

        let click: PointerEvent = serde_json::from_str(
            r#"{"type":"click","position":{"x":1,"y":2},"target":"canvas"}"#,
        )
        .unwrap();
        assert!(matches!(
            click,
            PointerEvent::Click {
                target: PointerTarget::Canvas,
                ..
            }
        ));
    }
}
