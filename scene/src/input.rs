//! Input model: one pointer abstraction for mouse and touch, and the drag
//! gesture state machine.
//!
//! The host translates raw mouse and touch events into `PointerEvent`s in
//! client space (top-left origin). `InputState` is the active gesture being
//! tracked between pointer-down and pointer-up. It carries the grab offset
//! so every move sample can be turned into a proposed scene position.
//! `TapTracker` derives the double-tap-to-edit gesture from the same stream.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::DOUBLE_TAP_MS;
use crate::doc::EntityId;
use crate::viewport::Point;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// Mouse button pressed or finger touched down.
    Down,
    /// Pointer moved, pressed or not.
    Move,
    /// Mouse button released or finger lifted.
    Up,
}

/// A unified mouse/touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    /// Position in client space (top-left origin, y down).
    pub client: Point,
    /// Event timestamp in milliseconds, used for double-tap detection.
    pub time_ms: f64,
    /// The press landed on an embedded control (a slider's range input).
    /// Such presses never start a drag.
    pub on_control: bool,
}

impl PointerEvent {
    #[must_use]
    pub fn new(phase: PointerPhase, x: f64, y: f64, time_ms: f64) -> Self {
        Self { phase, client: Point::new(x, y), time_ms, on_control: false }
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is dragging an entity.
    Dragging {
        /// Id of the entity being dragged.
        id: EntityId,
        /// Pointer offset from the entity's client-space top-left corner.
        grab: Point,
        /// Whether any move sample arrived since pointer-down.
        moved: bool,
    },
}

impl InputState {
    /// Id of the entity currently being dragged, if any.
    #[must_use]
    pub fn dragging(&self) -> Option<EntityId> {
        match self {
            Self::Dragging { id, .. } => Some(*id),
            Self::Idle => None,
        }
    }
}

/// Detects two taps on the same entity within [`DOUBLE_TAP_MS`].
#[derive(Debug, Clone, Default)]
pub struct TapTracker {
    last: Option<(EntityId, f64)>,
}

impl TapTracker {
    /// Record a tap. Returns `true` when it completes a double-tap; the
    /// tracker then resets so a third tap starts a new sequence.
    pub fn register(&mut self, id: EntityId, time_ms: f64) -> bool {
        if let Some((last_id, last_ms)) = self.last {
            let gap = time_ms - last_ms;
            if last_id == id && gap > 0.0 && gap < DOUBLE_TAP_MS {
                self.last = None;
                return true;
            }
        }
        self.last = Some((id, time_ms));
        false
    }

    /// Forget any pending first tap.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
