pub mod road_map;
pub mod trend_chart;

pub use road_map::{MapScene, RoadStyle, render_road_map};
pub use trend_chart::{SeriesRange, normalize, render_trend_chart};
