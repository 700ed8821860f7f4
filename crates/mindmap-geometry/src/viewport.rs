//! Viewport - the world-space rectangle mapped onto the physical display.
//!
//! The viewport keeps a scale factor and a viewbox. Zooming preserves the
//! visual center of the current view; resizing the physical container keeps
//! the apparent zoom level.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Point, Size};

/// Smallest allowed scale
pub const MIN_SCALE: f64 = 0.25;

/// Largest allowed scale
pub const MAX_SCALE: f64 = 3.0;

/// Scale change per unit passed to [`Viewport::add_scale`]
pub const SCALE_STEP: f64 = 0.1;

/// World-space rectangle currently shown
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewbox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Notifications emitted by the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    /// Scale changed (already clamped)
    ScaleChanged(f64),
    /// Viewbox origin or size changed
    ViewboxChanged(Viewbox),
}

/// Pan/zoom transform between screen and world coordinates
#[derive(Debug)]
pub struct Viewport {
    viewbox: Viewbox,
    /// Physical size of the wrapper element
    wrapper: Size,
    /// Screen position of the wrapper's top-left corner
    screen_origin: Point,
    scale: f64,
    subscribers: Vec<mpsc::Sender<ViewportEvent>>,
}

impl Viewport {
    /// Create a viewport for a wrapper of the given physical size.
    ///
    /// A non-finite `scale` falls back to 1.0; anything else is clamped.
    pub fn new(wrapper: Size, scale: Option<f64>) -> Self {
        let scale = clamp_scale(scale.filter(|s| s.is_finite()).unwrap_or(1.0));
        let mut viewport = Self {
            viewbox: Viewbox::default(),
            wrapper,
            screen_origin: Point::default(),
            scale,
            subscribers: Vec::new(),
        };
        viewport.set_scale(scale);
        viewport
    }

    pub fn viewbox(&self) -> Viewbox {
        self.viewbox
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn wrapper_size(&self) -> Size {
        self.wrapper
    }

    /// Subscribe to viewport notifications
    pub fn subscribe(&mut self) -> mpsc::Receiver<ViewportEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Set the scale, keeping the center of the current view fixed
    pub fn set_scale(&mut self, scale: f64) {
        if !scale.is_finite() {
            return;
        }
        let scale = clamp_scale(scale);

        self.viewbox.width = self.wrapper.width / scale;
        self.viewbox.height = self.wrapper.height / scale;
        self.viewbox.x = anchored_position(self.scale, scale, self.viewbox.x, self.wrapper.width);
        self.viewbox.y = anchored_position(self.scale, scale, self.viewbox.y, self.wrapper.height);
        self.scale = scale;

        trace!(scale, viewbox = ?self.viewbox, "viewport scale set");
        self.emit(ViewportEvent::ScaleChanged(scale));
        self.emit(ViewportEvent::ViewboxChanged(self.viewbox));
    }

    /// Add `delta` steps of [`SCALE_STEP`] to the current scale
    pub fn add_scale(&mut self, delta: f64) {
        self.set_scale(self.scale + delta * SCALE_STEP);
    }

    /// Pan by a screen-space delta
    pub fn translate(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.viewbox.x += dx / self.scale;
        self.viewbox.y += dy / self.scale;
        self.emit(ViewportEvent::ViewboxChanged(self.viewbox));
    }

    /// Move the viewbox origin to a world position
    pub fn translate_to(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.viewbox.x = x;
        self.viewbox.y = y;
        self.emit(ViewportEvent::ViewboxChanged(self.viewbox));
    }

    /// Follow a change of the physical container size; scale is unchanged
    pub fn resize(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return;
        }

        if self.wrapper.width > 0.0 {
            self.viewbox.width *= width / self.wrapper.width;
        } else {
            self.viewbox.width = width / self.scale;
        }
        if self.wrapper.height > 0.0 {
            self.viewbox.height *= height / self.wrapper.height;
        } else {
            self.viewbox.height = height / self.scale;
        }

        self.wrapper = Size::new(width, height);
        self.emit(ViewportEvent::ViewboxChanged(self.viewbox));
    }

    /// Set where the wrapper sits on screen (its client rect origin)
    pub fn set_screen_origin(&mut self, origin: Point) {
        if origin.is_finite() {
            self.screen_origin = origin;
        }
    }

    /// Project a client (screen) point into world space
    pub fn screen_to_world(&self, client_x: f64, client_y: f64) -> Point {
        Point::new(
            self.viewbox.x + (client_x - self.screen_origin.x) / self.scale,
            self.viewbox.y + (client_y - self.screen_origin.y) / self.scale,
        )
    }

    /// Offset of a world point from the wrapper's top-left corner, in screen pixels
    pub fn world_to_screen_offset(&self, x: f64, y: f64) -> Point {
        Point::new((x - self.viewbox.x) * self.scale, (y - self.viewbox.y) * self.scale)
    }

    fn emit(&mut self, event: ViewportEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Shift an axis origin so the view center stays put across a scale change
fn anchored_position(old_scale: f64, new_scale: f64, old_position: f64, wrapper_size: f64) -> f64 {
    old_position + wrapper_size * ((1.0 / old_scale) - (1.0 / new_scale)) / 2.0
}
