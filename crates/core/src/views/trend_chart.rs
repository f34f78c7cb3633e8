//! Live trend chart: three normalized series over a shared horizontal axis.

use roadview_protocol::{LineCap, Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::live::TrendSnapshot;

const PAD: f64 = 10.0;
/// Inset of the plot area inside the border.
const PLOT_INSET: f64 = 3.0;
const BORDER_RADIUS: f64 = 5.0;
const LINE_WIDTH: f64 = 2.0;
const LEGEND_FONT_SIZE: f64 = 11.0;
const MESSAGE_FONT_SIZE: f64 = 12.0;
const LEGEND_STEP: f64 = 14.0;
const RANGE_EPSILON: f64 = 1e-9;

/// Min and range of the finite values of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRange {
    pub min: f64,
    /// `max - min`, or `1.0` when the series is flat.
    pub range: f64,
}

impl SeriesRange {
    /// Map `value` into `[0, 1]` relative to this range.
    pub fn unit(&self, value: f64) -> f64 {
        (value - self.min) / self.range
    }
}

/// Scaling for one series, or `None` if it holds no finite value.
pub fn normalize(series: &[f64]) -> Option<SeriesRange> {
    let (min, max) = series
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    let range = max - min;
    Some(SeriesRange {
        min,
        range: if range.abs() < RANGE_EPSILON { 1.0 } else { range },
    })
}

/// Render the trend chart for one frame.
pub fn render_trend_chart(snapshot: &TrendSnapshot, viewport: &Viewport) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(8);

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
        color: ThemeToken::ChartBackground,
        border_color: None,
        corner_radius: 0.0,
    });

    let chart = Rect::new(
        PAD,
        PAD,
        (viewport.width - 2.0 * PAD).max(0.0),
        (viewport.height - 2.0 * PAD).max(0.0),
    );
    commands.push(RenderCommand::DrawRect {
        rect: chart,
        color: ThemeToken::ChartBackground,
        border_color: Some(ThemeToken::ChartBorder),
        corner_radius: BORDER_RADIUS,
    });

    if snapshot.len() < 2 {
        commands.push(RenderCommand::DrawText {
            position: Point::new(chart.x + 10.0, chart.y + 14.0),
            text: "Live Trends (need data)...".to_string(),
            color: ThemeToken::ChartText,
            font_size: MESSAGE_FONT_SIZE,
            align: TextAlign::Left,
        });
        return commands;
    }

    let colors = [
        ThemeToken::SeriesWait,
        ThemeToken::SeriesThroughput,
        ThemeToken::SeriesCongestion,
    ];
    for (i, ((name, series), color)) in snapshot.series().into_iter().zip(colors).enumerate() {
        let Some(range) = normalize(series) else {
            continue;
        };
        commands.push(RenderCommand::BeginGroup {
            id: format!("series-{name}"),
            label: Some(name.to_string()),
        });
        commands.push(RenderCommand::DrawPolyline {
            points: series_points(series, range, &chart),
            color,
            width: LINE_WIDTH,
            cap: LineCap::Round,
            dash: None,
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(chart.x + 12.0, chart.y + 14.0 + LEGEND_STEP * i as f64),
            text: name.to_string(),
            color,
            font_size: LEGEND_FONT_SIZE,
            align: TextAlign::Left,
        });
        commands.push(RenderCommand::EndGroup);
    }

    commands
}

/// Evenly spaced points. Non-finite samples are dropped but keep their slot.
fn series_points(series: &[f64], range: SeriesRange, chart: &Rect) -> Vec<Point> {
    let n = series.len();
    let step = if n > 1 {
        (chart.w - 2.0 * PLOT_INSET) / (n - 1) as f64
    } else {
        0.0
    };
    let plot_h = (chart.h - 2.0 * PLOT_INSET).max(0.0);
    let bottom = chart.y + chart.h - PLOT_INSET;

    series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| {
            Point::new(
                chart.x + PLOT_INSET + i as f64 * step,
                bottom - range.unit(*v) * plot_h,
            )
        })
        .collect()
}
