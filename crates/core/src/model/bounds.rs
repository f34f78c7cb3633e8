use serde::{Deserialize, Serialize};

/// Fraction of each axis added on both sides of a parsed extent.
pub const DEFAULT_PADDING: f64 = 0.03;

/// Axis-aligned world extent in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Extent used whenever no sane extent could be parsed.
    pub const FALLBACK: Bounds = Bounds {
        min_x: -100.0,
        min_y: -100.0,
        max_x: 100.0,
        max_y: 100.0,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A bounds is sane when both axes have positive extent. NaN fails.
    pub fn sane(&self) -> bool {
        self.max_x > self.min_x && self.max_y > self.min_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Expand both axes symmetrically by `frac` of their extent.
    pub fn with_padding(&self, frac: f64) -> Bounds {
        let dx = self.width() * frac;
        let dy = self.height() * frac;
        Bounds::new(
            self.min_x - dx,
            self.min_y - dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// The extent handed to everything downstream of parsing: the padded
    /// parse result when it is sane, otherwise [`Bounds::FALLBACK`].
    pub fn resolve(parsed: Option<Bounds>) -> Bounds {
        match parsed {
            Some(b) if b.sane() => {
                let padded = b.with_padding(DEFAULT_PADDING);
                // A huge extent can overflow to infinity when padded.
                if padded.sane() && padded.width().is_finite() && padded.height().is_finite() {
                    padded
                } else {
                    Bounds::FALLBACK
                }
            }
            _ => Bounds::FALLBACK,
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::FALLBACK
    }
}
