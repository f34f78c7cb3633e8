//! Interactive view state: zoom, rotation and pan applied on top of the
//! fit-to-panel projection.
//!
//! The transform maps *base screen* points (panel pixels after fitting the
//! world into the panel) to *final screen* points. It pivots on the panel
//! center: translate to center-relative coordinates, scale, rotate, add the
//! pan offset, translate back.

use roadview_protocol::Point;
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.20;
pub const MAX_ZOOM: f64 = 12.0;
/// Zoom factor per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.12;
/// Radians of rotation per pixel of horizontal secondary-button drag.
pub const DRAG_ROTATE_PER_PX: f64 = 0.01;
/// Radians of rotation per modifier+wheel notch.
pub const WHEEL_ROTATE_PER_NOTCH: f64 = 0.10;
/// Smallest zoom divided by when inverting.
pub const ZOOM_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub zoom: f64,
    /// Radians, any real value; interpreted modulo 2π.
    pub rotation: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

/// Pointer button that started a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    Primary,
    Secondary,
}

/// An interactive input already decoded by the UI toolkit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    /// Pointer moved by `dx, dy` pixels while `button` was held.
    Drag { button: DragButton, dx: f64, dy: f64 },
    /// Scroll by `notches` (positive = towards the user, zooms out) with the
    /// pointer at `cursor`. `modifier` turns the scroll into rotation.
    Wheel {
        notches: f64,
        cursor: Point,
        modifier: bool,
    },
    /// Reset command or double activation.
    Reset,
}

impl ViewTransform {
    pub fn identity() -> Self {
        Self {
            zoom: 1.0,
            rotation: 0.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Map a base screen point to its final screen position.
    pub fn forward(&self, base: Point, center: Point) -> Point {
        let (sin, cos) = self.rotation.sin_cos();
        let sx = (base.x - center.x) * self.zoom;
        let sy = (base.y - center.y) * self.zoom;
        Point::new(
            center.x + sx * cos - sy * sin + self.pan_x,
            center.y + sx * sin + sy * cos + self.pan_y,
        )
    }

    /// Exact inverse of [`forward`](Self::forward) for any zoom above
    /// [`ZOOM_EPSILON`].
    pub fn inverse(&self, screen: Point, center: Point) -> Point {
        let (sin, cos) = self.rotation.sin_cos();
        let dx = screen.x - center.x - self.pan_x;
        let dy = screen.y - center.y - self.pan_y;
        // Rotation by -θ.
        let rx = dx * cos + dy * sin;
        let ry = -dx * sin + dy * cos;
        let zoom = self.zoom.max(ZOOM_EPSILON);
        Point::new(center.x + rx / zoom, center.y + ry / zoom)
    }

    /// Change the zoom while keeping the point under `cursor` fixed on
    /// screen. `new_zoom` is clamped to `[MIN_ZOOM, MAX_ZOOM]` first.
    pub fn anchored_zoom(&mut self, cursor: Point, center: Point, new_zoom: f64) {
        let anchor = self.inverse(cursor, center);
        self.zoom = clamp_zoom(new_zoom);

        // Solve forward(anchor) == cursor for the pan offset.
        let (sin, cos) = self.rotation.sin_cos();
        let sx = (anchor.x - center.x) * self.zoom;
        let sy = (anchor.y - center.y) * self.zoom;
        self.pan_x = cursor.x - center.x - (sx * cos - sy * sin);
        self.pan_y = cursor.y - center.y - (sx * sin + sy * cos);
    }

    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Apply one interaction to the view.
    pub fn apply(&mut self, event: ViewEvent, center: Point) {
        match event {
            ViewEvent::Drag {
                button: DragButton::Primary,
                dx,
                dy,
            } => {
                self.pan_x += dx;
                self.pan_y += dy;
            }
            ViewEvent::Drag {
                button: DragButton::Secondary,
                dx,
                ..
            } => {
                self.rotation += dx * DRAG_ROTATE_PER_PX;
            }
            ViewEvent::Wheel {
                notches,
                modifier: true,
                ..
            } => {
                self.rotation += -notches * WHEEL_ROTATE_PER_NOTCH;
            }
            ViewEvent::Wheel {
                notches,
                cursor,
                modifier: false,
            } => {
                let target = self.zoom * WHEEL_ZOOM_STEP.powf(-notches);
                self.anchored_zoom(cursor, center, target);
            }
            ViewEvent::Reset => self.reset(),
        }
    }

    /// Rotation normalized into `[0, 2π)`, for display.
    pub fn rotation_normalized(&self) -> f64 {
        self.rotation.rem_euclid(std::f64::consts::TAU)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}
