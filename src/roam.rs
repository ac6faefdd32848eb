//! Roam: turning pointer gestures into pan and zoom.
//!
//! [`RoamController`] is a small state machine over [`PointerInput`]; it
//! knows nothing about the scene. The drawer applies the events it yields to
//! the roam transform with [`update_view_on_pan`] and [`update_view_on_zoom`].

#[cfg(test)]
#[path = "roam_test.rs"]
mod roam_test;

use crate::consts::WHEEL_ZOOM_FACTOR;
use crate::input::{Button, GestureState, PointerInput};
use crate::options::{RoamMode, ScaleLimit};
use crate::transform::{Point, Transform};

/// A roam step produced by a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoamEvent {
    Pan { dx: f64, dy: f64 },
    /// `scale` is relative to the current zoom.
    Zoom { scale: f64, origin_x: f64, origin_y: f64 },
}

/// Gesture → roam event state machine.
#[derive(Debug, Default)]
pub struct RoamController {
    mode: RoamMode,
    state: GestureState,
    disposed: bool,
}

impl RoamController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the enabled gestures. Any gesture in flight is dropped.
    pub fn enable(&mut self, mode: RoamMode) {
        self.mode = mode;
        self.state = GestureState::Idle;
        self.disposed = false;
    }

    /// Stop producing events until the next [`enable`](Self::enable).
    pub fn dispose(&mut self) {
        self.mode = RoamMode::Off;
        self.state = GestureState::Idle;
        self.disposed = true;
    }

    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Feed one pointer event. `eligible` decides whether a gesture may
    /// start at a screen point; it is consulted on pointer-down, wheel and
    /// pinch-start only, so a drag may leave the map once started.
    pub fn on_input(&mut self, input: &PointerInput, eligible: impl Fn(Point) -> bool) -> Option<RoamEvent> {
        if self.disposed || !self.mode.is_enabled() {
            return None;
        }

        match *input {
            PointerInput::Down { pt, button: Button::Primary } => {
                if self.mode.can_move() && eligible(pt) {
                    self.state = GestureState::PointerDown { last: pt };
                }
                None
            }
            PointerInput::Down { .. } => None,
            PointerInput::Move { pt } => match self.state {
                GestureState::PointerDown { last } | GestureState::Dragging { last } => {
                    self.state = GestureState::Dragging { last: pt };
                    let (dx, dy) = (pt.x - last.x, pt.y - last.y);
                    (dx != 0.0 || dy != 0.0).then_some(RoamEvent::Pan { dx, dy })
                }
                GestureState::Idle | GestureState::Pinching => None,
            },
            PointerInput::Up { .. } => {
                if !matches!(self.state, GestureState::Pinching) {
                    self.state = GestureState::Idle;
                }
                None
            }
            PointerInput::Wheel { pt, delta } => {
                if !self.mode.can_scale() || delta.dy == 0.0 || !eligible(pt) {
                    return None;
                }
                let scale = if delta.dy < 0.0 { WHEEL_ZOOM_FACTOR } else { 1.0 / WHEEL_ZOOM_FACTOR };
                Some(RoamEvent::Zoom { scale, origin_x: pt.x, origin_y: pt.y })
            }
            PointerInput::PinchStart { center } => {
                if self.mode.can_scale() && eligible(center) {
                    self.state = GestureState::Pinching;
                }
                None
            }
            PointerInput::Pinch { center, scale } => {
                let pinching = matches!(self.state, GestureState::Pinching);
                (pinching && scale > 0.0).then_some(RoamEvent::Zoom { scale, origin_x: center.x, origin_y: center.y })
            }
            PointerInput::PinchEnd => {
                if matches!(self.state, GestureState::Pinching) {
                    self.state = GestureState::Idle;
                }
                None
            }
        }
    }
}

/// Translate the roam transform by a screen delta.
pub fn update_view_on_pan(transform: &mut Transform, dx: f64, dy: f64) {
    transform.x += dx;
    transform.y += dy;
}

/// Zoom the roam transform by `scale` about `(origin_x, origin_y)`, keeping
/// the accumulated `zoom` within `limit`. Returns the scale actually applied.
pub fn update_view_on_zoom(
    transform: &mut Transform,
    zoom: &mut f64,
    limit: Option<ScaleLimit>,
    scale: f64,
    origin_x: f64,
    origin_y: f64,
) -> f64 {
    let previous = if *zoom > 0.0 { *zoom } else { 1.0 };
    let mut next = previous * scale;
    if let Some(limit) = limit {
        next = next.max(limit.min.unwrap_or(0.0)).min(limit.max.unwrap_or(f64::INFINITY));
    }
    let applied = next / previous;
    *zoom = next;

    transform.x -= (origin_x - transform.x) * (applied - 1.0);
    transform.y -= (origin_y - transform.y) * (applied - 1.0);
    transform.scale_x *= applied;
    transform.scale_y *= applied;
    applied
}
