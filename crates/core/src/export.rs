//! Static snapshots of the current composites for reporting.

use roadview_protocol::Viewport;
use tracing::debug;

use crate::live::TrendSnapshot;
use crate::svg::render_svg;
use crate::views::{MapScene, render_road_map, render_trend_chart};

pub const EXPORT_BACKGROUND: &str = "#ffffff";

/// Render the map at the current panel size, or at `fallback` when the
/// panel has not been laid out.
pub fn export_map_svg(scene: &MapScene<'_>, current: Viewport, fallback: Viewport) -> String {
    let viewport = current.or_fallback(fallback);
    debug!(width = viewport.width, height = viewport.height, "exporting map");
    let commands = render_road_map(scene, &viewport);
    render_svg(&commands, viewport.width, viewport.height, EXPORT_BACKGROUND)
}

pub fn export_trend_svg(snapshot: &TrendSnapshot, current: Viewport, fallback: Viewport) -> String {
    let viewport = current.or_fallback(fallback);
    debug!(width = viewport.width, height = viewport.height, "exporting trend chart");
    let commands = render_trend_chart(snapshot, &viewport);
    render_svg(&commands, viewport.width, viewport.height, EXPORT_BACKGROUND)
}
