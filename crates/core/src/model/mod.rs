pub mod bounds;
pub mod lane;
pub mod signal;
pub mod snapshot;
pub mod vehicle;

pub use bounds::Bounds;
pub use lane::{LaneGeometry, LaneParsePolicy};
pub use signal::{SignalLabels, SignalPositions, label_signals};
pub use snapshot::{NetworkSnapshot, NetworkStore};
pub use vehicle::{VehicleEntity, VehicleFilter, VehicleKind};
