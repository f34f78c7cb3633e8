//! Road network visualization core: network parsing, view transforms,
//! coordinate mapping, and the render pipeline for the map and trend chart.

pub mod export;
pub mod live;
pub mod mapper;
pub mod model;
pub mod parsers;
pub mod settings;
pub mod svg;
pub mod transform;
pub mod views;

pub use mapper::CoordinateMapper;
pub use parsers::NetworkError;
pub use settings::{SettingsError, ViewerSettings};
pub use transform::{DragButton, ViewEvent, ViewTransform};
