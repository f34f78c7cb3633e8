//! World → base screen → final screen projection.
//!
//! Nothing here is cached: panel size and view state can change between
//! frames, so callers build a mapper per frame from the current inputs.

use roadview_protocol::{Point, Viewport};

use crate::model::Bounds;
use crate::transform::ViewTransform;

/// Smallest panel dimension in pixels used for fitting.
const MIN_PANEL_PX: f64 = 1.0;
/// Smallest world extent in meters used for fitting.
const MIN_WORLD_EXTENT: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper<'a> {
    bounds: &'a Bounds,
    panel_w: f64,
    panel_h: f64,
    view: &'a ViewTransform,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(bounds: &'a Bounds, viewport: Viewport, view: &'a ViewTransform) -> Self {
        Self {
            bounds,
            panel_w: panel_dim(viewport.width),
            panel_h: panel_dim(viewport.height),
            view,
        }
    }

    /// Pixels per world meter before zoom.
    pub fn fit_scale(&self) -> f64 {
        let world_w = self.bounds.width().max(MIN_WORLD_EXTENT);
        let world_h = self.bounds.height().max(MIN_WORLD_EXTENT);
        (self.panel_w / world_w).min(self.panel_h / world_h)
    }

    /// Pixels per world meter after zoom; stroke widths scale with this.
    pub fn current_scale(&self) -> f64 {
        self.fit_scale() * self.view.zoom
    }

    pub fn center(&self) -> Point {
        Point::new(self.panel_w / 2.0, self.panel_h / 2.0)
    }

    /// Fit the world into the panel, center it and flip the vertical axis.
    pub fn world_to_base_screen(&self, world: Point) -> Point {
        let fit = self.fit_scale();
        let (x_pad, y_pad) = self.padding(fit);
        Point::new(
            x_pad + (world.x - self.bounds.min_x) * fit,
            self.panel_h - (y_pad + (world.y - self.bounds.min_y) * fit),
        )
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.view
            .forward(self.world_to_base_screen(world), self.center())
    }

    /// Inverse of [`world_to_screen`](Self::world_to_screen), e.g. for
    /// showing the world coordinate under the pointer.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        let base = self.view.inverse(screen, self.center());
        let fit = self.fit_scale();
        let (x_pad, y_pad) = self.padding(fit);
        Point::new(
            self.bounds.min_x + (base.x - x_pad) / fit,
            self.bounds.min_y + (self.panel_h - base.y - y_pad) / fit,
        )
    }

    fn padding(&self, fit: f64) -> (f64, f64) {
        let content_w = self.bounds.width() * fit;
        let content_h = self.bounds.height() * fit;
        (
            (self.panel_w - content_w) / 2.0,
            (self.panel_h - content_h) / 2.0,
        )
    }
}

fn panel_dim(v: f64) -> f64 {
    if v.is_finite() { v.max(MIN_PANEL_PX) } else { MIN_PANEL_PX }
}
