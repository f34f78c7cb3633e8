use roadview_protocol::Point;
use serde::{Deserialize, Serialize};

/// Width assumed for a lane whose `width` attribute is missing or unparsable.
pub const DEFAULT_LANE_WIDTH: f64 = 3.2;

/// The polyline shape and metadata of one lane within one road edge.
///
/// Built once per parse and never mutated; the parsed lanes are kept in
/// document order so draw order is stable between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneGeometry {
    pub edge_id: String,
    pub lane_index: u32,
    /// Junction-internal connector (edge id starts with `:` or the edge has
    /// `function="internal"`).
    pub internal: bool,
    pub width_meters: f64,
    /// World coordinates, at least two points.
    pub points: Vec<Point>,
}

impl LaneGeometry {
    /// Total polyline length in meters.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    /// Point at `distance` meters along the polyline, clamped to its ends,
    /// together with the heading of the segment it falls on (radians).
    pub fn point_at(&self, distance: f64) -> Option<(Point, f64)> {
        let first = *self.points.first()?;
        let mut remaining = distance.max(0.0);
        let mut last = (first, 0.0);
        for w in self.points.windows(2) {
            let seg = w[0].distance(w[1]);
            let heading = (w[1].y - w[0].y).atan2(w[1].x - w[0].x);
            if seg > 0.0 && remaining <= seg {
                let t = remaining / seg;
                let p = Point::new(
                    w[0].x + (w[1].x - w[0].x) * t,
                    w[0].y + (w[1].y - w[0].y) * t,
                );
                return Some((p, heading));
            }
            remaining -= seg;
            last = (w[1], heading);
        }
        Some(last)
    }
}

/// Which lanes the network parser keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneParsePolicy {
    /// Keep lanes of junction-internal edges.
    pub include_internal: bool,
    /// Keep every lane index, not just index 0.
    pub include_all_lanes: bool,
}

impl Default for LaneParsePolicy {
    fn default() -> Self {
        Self {
            include_internal: true,
            include_all_lanes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane(points: &[(f64, f64)]) -> LaneGeometry {
        LaneGeometry {
            edge_id: "e".into(),
            lane_index: 0,
            internal: false,
            width_meters: DEFAULT_LANE_WIDTH,
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    #[test]
    fn length_sums_segments() {
        let l = lane(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert!((l.length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn point_at_interpolates_and_clamps() {
        let l = lane(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);

        let (p, heading) = l.point_at(15.0).unwrap_or_default();
        assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
        assert!((heading - std::f64::consts::FRAC_PI_2).abs() < 1e-9);

        let (end, _) = l.point_at(99.0).unwrap_or_default();
        assert_eq!(end, Point::new(10.0, 10.0));

        let (start, _) = l.point_at(-5.0).unwrap_or_default();
        assert_eq!(start, Point::new(0.0, 0.0));
    }
}
