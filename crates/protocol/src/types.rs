use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }
}

/// Pixel size of the panel a view is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Center of the panel, the pivot for zoom and rotation.
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether both dimensions are positive and finite.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// This viewport if drawable, otherwise `fallback`.
    ///
    /// Used by export paths where the live panel may not have been laid out
    /// yet (zero size) and a fixed canvas size must be substituted.
    pub fn or_fallback(self, fallback: Viewport) -> Viewport {
        if self.is_drawable() { self } else { fallback }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_fallback_only_when_not_drawable() {
        let fallback = Viewport::new(900.0, 320.0);
        assert_eq!(Viewport::new(640.0, 480.0).or_fallback(fallback).width, 640.0);
        assert_eq!(Viewport::new(0.0, 480.0).or_fallback(fallback), fallback);
        assert_eq!(Viewport::new(640.0, -1.0).or_fallback(fallback), fallback);
        assert_eq!(Viewport::new(f64::NAN, 10.0).or_fallback(fallback), fallback);
    }

    #[test]
    fn rect_contains_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 5.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(30.0, 15.0)));
        assert!(!r.contains(Point::new(31.0, 12.0)));
    }

    #[test]
    fn point_distance() {
        let d = Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < f64::EPSILON);
    }
}
