use roadview_protocol::Point;
use serde::{Deserialize, Serialize};

/// Vehicle category as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleKind {
    Car,
    Truck,
    Bus,
    Other,
}

impl VehicleKind {
    /// Classify a simulator type string. Unknown strings map to `Other`.
    pub fn from_type_str(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("car") {
            VehicleKind::Car
        } else if raw.eq_ignore_ascii_case("truck") {
            VehicleKind::Truck
        } else if raw.eq_ignore_ascii_case("bus") {
            VehicleKind::Bus
        } else {
            VehicleKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleKind::Car => "car",
            VehicleKind::Truck => "truck",
            VehicleKind::Bus => "bus",
            VehicleKind::Other => "other",
        }
    }
}

/// One live vehicle as seen by a single render frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEntity {
    pub id: String,
    pub position: Point,
    pub kind: VehicleKind,
    /// Meters per second, never negative.
    pub speed: f64,
}

/// The standard vehicle-visibility predicate exposed as viewer toggles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleFilter {
    pub show_cars: bool,
    pub show_trucks: bool,
    pub show_buses: bool,
    pub min_speed_mps: f64,
}

impl VehicleFilter {
    /// Whether a vehicle of `kind` moving at `speed` m/s should be drawn.
    /// Kinds without a toggle are always shown.
    pub fn allows(&self, kind: VehicleKind, speed: f64) -> bool {
        let kind_shown = match kind {
            VehicleKind::Car => self.show_cars,
            VehicleKind::Truck => self.show_trucks,
            VehicleKind::Bus => self.show_buses,
            VehicleKind::Other => true,
        };
        kind_shown && speed >= self.min_speed_mps
    }
}

impl Default for VehicleFilter {
    fn default() -> Self {
        Self {
            show_cars: true,
            show_trucks: true,
            show_buses: true,
            min_speed_mps: 0.0,
        }
    }
}
