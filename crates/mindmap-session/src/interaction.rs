//! Viewport gestures: drag-to-pan, the rubber-band selection box and the wheel.

use mindmap_geometry::{BBox, Point, Viewport};
use tracing::trace;

/// Pans the viewport while the pointer is dragged.
///
/// A press only turns into a pan once the pointer has travelled more than
/// the threshold away from the press point on either axis. Releasing always
/// resets the gesture.
#[derive(Debug, Clone)]
pub struct DragViewportHandler {
    threshold: f64,
    press: Option<Point>,
    last: Option<Point>,
    moving: bool,
}

impl DragViewportHandler {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, press: None, last: None, moving: false }
    }

    pub fn is_active(&self) -> bool {
        self.press.is_some()
    }

    pub fn pointer_down(&mut self, client_x: f64, client_y: f64) {
        let at = Point::new(client_x, client_y);
        self.press = Some(at);
        self.last = Some(at);
        self.moving = false;
    }

    /// Returns whether the viewport was panned
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64, viewport: &mut Viewport) -> bool {
        let (Some(press), Some(last)) = (self.press, self.last) else {
            return false;
        };
        let current = Point::new(client_x, client_y);

        if !self.moving {
            let travelled_x = (current.x - press.x).abs();
            let travelled_y = (current.y - press.y).abs();
            if travelled_x <= self.threshold && travelled_y <= self.threshold {
                return false;
            }
            trace!(travelled_x, travelled_y, "viewport drag started");
            self.moving = true;
        }
        // the first committed move also catches up on the sub-threshold travel
        viewport.translate(last.x - current.x, last.y - current.y);
        self.last = Some(current);
        true
    }

    pub fn pointer_up(&mut self) {
        self.press = None;
        self.last = None;
        self.moving = false;
    }
}

/// Rubber-band rectangle between the press point and the pointer, in world
/// space. The corners may be given in any order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionBox {
    start: Point,
    current: Point,
}

impl SelectionBox {
    pub fn new(start: Point) -> Self {
        Self { start, current: start }
    }

    pub fn update(&mut self, current: Point) {
        self.current = current;
    }

    pub fn bounds(&self) -> BBox {
        let x = self.start.x.min(self.current.x);
        let y = self.start.y.min(self.current.y);
        BBox::new(x, y, (self.start.x - self.current.x).abs(), (self.start.y - self.current.y).abs())
    }

    /// A box with no area selects nothing
    pub fn is_empty(&self) -> bool {
        let b = self.bounds();
        b.width == 0.0 || b.height == 0.0
    }
}

/// One wheel notch (or trackpad scroll) as delivered by the gesture layer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    /// Zoom modifier (ctrl / cmd, or a pinch) held
    pub modifier: bool,
}

impl WheelInput {
    pub fn scroll(delta_x: f64, delta_y: f64) -> Self {
        Self { delta_x, delta_y, modifier: false }
    }

    pub fn zoom(delta_y: f64) -> Self {
        Self { delta_x: 0.0, delta_y, modifier: true }
    }
}

/// Zoom with the modifier held, pan otherwise
pub fn apply_wheel(viewport: &mut Viewport, input: WheelInput, zoom_speed: f64) {
    if input.modifier {
        if input.delta_y != 0.0 {
            viewport.add_scale(-input.delta_y.signum() * zoom_speed);
        }
    } else {
        viewport.translate(input.delta_x, input.delta_y);
    }
}
