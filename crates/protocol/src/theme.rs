use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    MapBackground,

    // Roads
    RoadOutline,
    RoadShoulder,
    RoadSurface,
    RoadInternal,
    LaneMarking,

    // Traffic signals
    SignalFill,
    SignalBorder,
    LabelBackground,
    LabelBorder,
    LabelText,

    // Vehicles
    VehicleShadow,
    CarBody,
    TruckBody,
    TruckCargo,
    BusBody,
    Wheel,

    // Trend chart
    ChartBackground,
    ChartBorder,
    ChartText,
    SeriesWait,
    SeriesThroughput,
    SeriesCongestion,
}
