//! Input model: pointer events and the gesture state machines.
//!
//! [`PointerInput`] is what the host feeds the drawer. [`GestureState`] is
//! the roam gesture being tracked between pointer-down and pointer-up;
//! [`SelectGesture`] tracks whether a pointer-down on a region has turned
//! into a drag, which cancels the click-to-select that would follow it.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::transform::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// A pointer event in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down { pt: Point, button: Button },
    Move { pt: Point },
    Up { pt: Point, button: Button },
    Wheel { pt: Point, delta: WheelDelta },
    PinchStart { center: Point },
    /// `scale` is relative to the previous pinch event.
    Pinch { center: Point, scale: f64 },
    PinchEnd,
}

impl PointerInput {
    /// Screen position the event refers to, if it has one.
    #[must_use]
    pub fn point(&self) -> Option<Point> {
        match *self {
            Self::Down { pt, .. } | Self::Move { pt } | Self::Up { pt, .. } | Self::Wheel { pt, .. } => Some(pt),
            Self::PinchStart { center } | Self::Pinch { center, .. } => Some(center),
            Self::PinchEnd => None,
        }
    }
}

/// Roam gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Primary button is down but the pointer has not moved yet.
    PointerDown {
        /// Screen position of the previous pointer event.
        last: Point,
    },
    /// The pointer moved with the button held; the map is being panned.
    Dragging {
        /// Screen position of the previous pointer event, used to compute the pan delta.
        last: Point,
    },
    /// A two-finger pinch is zooming the map.
    Pinching,
}

/// Click-versus-drag tracking for region selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectGesture {
    #[default]
    Idle,
    /// A pointer-down landed on a selectable region.
    MouseDown,
    /// The map was roamed since the pointer-down.
    Dragging,
}
