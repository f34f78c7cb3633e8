//! State shared between a simulation producer thread and the render loop.

pub mod synthetic;
pub mod trends;
pub mod vehicles;

pub use synthetic::{FeedHandle, SyntheticTraffic, spawn_feed};
pub use trends::{DEFAULT_TREND_CAPACITY, MIN_TREND_CAPACITY, TrendSeriesBuffer, TrendSnapshot};
pub use vehicles::{LiveVehicleState, VehicleGeneration};
