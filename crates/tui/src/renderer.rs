use std::io::stdout;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line as TextLine, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph,
        canvas::{Canvas, Circle, Context, Line, Rectangle},
    },
};
use roadview_core::export::{export_map_svg, export_trend_svg};
use roadview_core::live::{
    FeedHandle, LiveVehicleState, SyntheticTraffic, TrendSeriesBuffer, spawn_feed,
};
use roadview_core::model::{NetworkSnapshot, NetworkStore, VehicleFilter, VehicleKind};
use roadview_core::parsers::network_path_from_config;
use roadview_core::views::{MapScene, render_road_map, render_trend_chart};
use roadview_core::{ViewTransform, ViewerSettings};
use roadview_protocol::{RenderCommand, ThemeToken, Viewport};
use tracing::{info, warn};

use crate::input::{Action, CellMapping, PointerState, key_action};

/// Virtual pixels per terminal cell. Cells are about twice as tall as wide.
const PX_PER_COL: f64 = 4.0;
const PX_PER_ROW: f64 = 8.0;

const MAP_EXPORT: &str = "roadview-map.svg";
const TREND_EXPORT: &str = "roadview-trends.svg";

pub struct Shared<'a> {
    pub store: &'a NetworkStore,
    pub vehicles: &'a Arc<LiveVehicleState>,
    pub trends: &'a Arc<TrendSeriesBuffer>,
    pub settings: &'a ViewerSettings,
}

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::MapBackground => Color::Black,
        ThemeToken::RoadOutline | ThemeToken::RoadShoulder => Color::DarkGray,
        ThemeToken::RoadSurface => Color::Gray,
        ThemeToken::RoadInternal => Color::Rgb(90, 100, 115),
        ThemeToken::LaneMarking => Color::White,
        ThemeToken::SignalFill | ThemeToken::SignalBorder => Color::LightGreen,
        ThemeToken::LabelBackground | ThemeToken::LabelBorder => Color::DarkGray,
        ThemeToken::LabelText => Color::White,
        ThemeToken::VehicleShadow | ThemeToken::Wheel => Color::DarkGray,
        ThemeToken::CarBody => Color::Rgb(251, 146, 60),
        ThemeToken::TruckBody => Color::Rgb(148, 163, 184),
        ThemeToken::TruckCargo => Color::Rgb(253, 230, 138),
        ThemeToken::BusBody => Color::Rgb(250, 204, 21),
        ThemeToken::ChartBackground => Color::Black,
        ThemeToken::ChartBorder => Color::DarkGray,
        ThemeToken::ChartText => Color::Gray,
        ThemeToken::SeriesWait => Color::Rgb(34, 197, 94),
        ThemeToken::SeriesThroughput => Color::Rgb(59, 130, 246),
        ThemeToken::SeriesCongestion => Color::Rgb(239, 68, 68),
    }
}

/// Paint commands onto a canvas whose bounds match `viewport`. Canvas y
/// grows upward, so every y is flipped. Widths and dashes are ignored.
fn paint_commands(ctx: &mut Context<'_>, commands: &[RenderCommand], viewport: &Viewport) {
    let flip = |y: f64| viewport.height - y;
    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect { rect, color, .. } => {
                // Full-panel fills are left to the terminal background.
                if rect.w >= viewport.width && rect.h >= viewport.height {
                    continue;
                }
                ctx.draw(&Rectangle {
                    x: rect.x,
                    y: flip(rect.y + rect.h),
                    width: rect.w,
                    height: rect.h,
                    color: theme_to_color(*color),
                });
            }
            RenderCommand::DrawEllipse { center, radius, color, .. } => {
                if *color == ThemeToken::VehicleShadow {
                    continue;
                }
                ctx.draw(&Circle {
                    x: center.x,
                    y: flip(center.y),
                    radius: radius.x.max(radius.y),
                    color: theme_to_color(*color),
                });
            }
            RenderCommand::DrawPolyline { points, color, .. } => {
                let color = theme_to_color(*color);
                for w in points.windows(2) {
                    ctx.draw(&Line::new(w[0].x, flip(w[0].y), w[1].x, flip(w[1].y), color));
                }
            }
            RenderCommand::DrawText { position, text, color, .. } => {
                ctx.print(
                    position.x,
                    flip(position.y),
                    Span::styled(text.clone(), Style::default().fg(theme_to_color(*color))),
                );
            }
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

fn canvas_viewport(area: Rect) -> Viewport {
    Viewport::new(
        f64::from(area.width.max(1)) * PX_PER_COL,
        f64::from(area.height.max(1)) * PX_PER_ROW,
    )
}

fn draw_canvas(frame: &mut Frame<'_>, area: Rect, title: &str, commands: &[RenderCommand], viewport: Viewport) {
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .marker(Marker::Braille)
        .background_color(Color::Black)
        .x_bounds([0.0, viewport.width])
        .y_bounds([0.0, viewport.height])
        .paint(|ctx| paint_commands(ctx, commands, &viewport));
    frame.render_widget(canvas, area);
}

/// Inner area of a bordered block.
fn inner(area: Rect) -> Rect {
    Rect::new(
        area.x + 1,
        area.y + 1,
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    )
}

struct Layouts {
    header: Rect,
    map: Rect,
    chart: Rect,
    signals: Rect,
    footer: Rect,
}

fn layout(area: Rect) -> Layouts {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5), Constraint::Length(1)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(rows[1]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(3)])
        .split(cols[1]);
    Layouts {
        header: rows[0],
        map: cols[0],
        chart: side[0],
        signals: side[1],
        footer: rows[2],
    }
}

struct ViewerState {
    view: ViewTransform,
    filter: VehicleFilter,
    status: String,
    feed: Option<FeedHandle>,
}

impl ViewerState {
    fn new() -> Self {
        Self {
            view: ViewTransform::identity(),
            filter: VehicleFilter::default(),
            status: String::from("ready"),
            feed: None,
        }
    }

    fn toggle(&mut self, kind: VehicleKind) {
        let flag = match kind {
            VehicleKind::Car => &mut self.filter.show_cars,
            VehicleKind::Truck => &mut self.filter.show_trucks,
            VehicleKind::Bus => &mut self.filter.show_buses,
            VehicleKind::Other => return,
        };
        *flag = !*flag;
        self.status = format!("{} {}", kind.as_str(), if *flag { "shown" } else { "hidden" });
    }
}

fn export(shared: &Shared<'_>, state: &ViewerState, map_vp: Viewport, chart_vp: Viewport) -> Result<String> {
    let network = shared.store.current();
    let generation = shared.vehicles.snapshot();
    let filter = state.filter;
    let allows = move |kind: VehicleKind, speed: f64| filter.allows(kind, speed);
    let scene = MapScene {
        network: &network,
        vehicles: &generation.vehicles,
        filter: &allows,
        view: &state.view,
        style: shared.settings.road_style,
    };
    let map = export_map_svg(&scene, map_vp, shared.settings.map_export_fallback.viewport());
    let chart = export_trend_svg(
        &shared.trends.snapshot(),
        chart_vp,
        shared.settings.trend_export_fallback.viewport(),
    );
    std::fs::write(MAP_EXPORT, map)?;
    std::fs::write(TREND_EXPORT, chart)?;
    info!(map = MAP_EXPORT, trends = TREND_EXPORT, "exported snapshots");
    Ok(format!("exported {MAP_EXPORT} and {TREND_EXPORT}"))
}

/// Re-resolve the configuration, publish the parsed network and restart the
/// vehicle feed over it. Trend history and the view start over as well.
fn reload_network(shared: &Shared<'_>, state: &mut ViewerState) -> Result<Arc<NetworkSnapshot>> {
    // Dropping the handle joins the old producer, which clears its vehicles.
    state.feed = None;
    shared.trends.clear();

    let net_path = network_path_from_config(&shared.settings.config_path);
    let snapshot = shared.store.reload(&net_path, shared.settings.lane_policy);
    state.view.reset();
    state.feed = Some(spawn_feed(
        SyntheticTraffic::new(&snapshot, shared.settings.feed_vehicles),
        Arc::clone(shared.vehicles),
        Arc::clone(shared.trends),
        shared.settings.feed_tick(),
    )?);
    state.status = format!("loaded {}", display_name(&net_path));
    info!(net = %net_path.display(), lanes = snapshot.lanes.len(), "network loaded");
    Ok(snapshot)
}

pub fn run_tui(shared: Shared<'_>) -> Result<()> {
    let mut state = ViewerState::new();
    reload_network(&shared, &mut state)?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &shared, &mut state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    shared: &Shared<'_>,
    state: &mut ViewerState,
) -> Result<()> {
    let mut pointer = PointerState::default();

    loop {
        let size = terminal.size()?;
        let areas = layout(Rect::new(0, 0, size.width, size.height));
        let map_area = inner(areas.map);
        let map_vp = canvas_viewport(map_area);
        let chart_vp = canvas_viewport(inner(areas.chart));

        // One consistent view of shared state per frame.
        let network = shared.store.current();
        let generation = shared.vehicles.snapshot();
        let trend = shared.trends.snapshot();

        let filter = state.filter;
        let allows = move |kind: VehicleKind, speed: f64| filter.allows(kind, speed);
        let scene = MapScene {
            network: &network,
            vehicles: &generation.vehicles,
            filter: &allows,
            view: &state.view,
            style: shared.settings.road_style,
        };
        let map_cmds = render_road_map(&scene, &map_vp);
        let chart_cmds = render_trend_chart(&trend, &chart_vp);

        terminal.draw(|frame| {
            let header = Paragraph::new(format!(
                " roadview | {} lanes | {} signals | {} vehicles (gen {}) | zoom {:.2} rot {:.0}° ",
                network.lanes.len(),
                network.signal_positions.len(),
                generation.len(),
                generation.generation,
                state.view.zoom,
                state.view.rotation_normalized().to_degrees(),
            ))
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(header, areas.header);

            draw_canvas(frame, areas.map, " Map ", &map_cmds, map_vp);
            draw_canvas(frame, areas.chart, " Live Trends ", &chart_cmds, chart_vp);

            let items: Vec<ListItem<'_>> = network
                .signal_entries()
                .into_iter()
                .map(|(id, label)| {
                    ListItem::new(TextLine::from(vec![
                        Span::styled(format!("{label:>4} "), Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(id.to_string()),
                    ]))
                })
                .collect();
            let signals = List::new(items).block(Block::default().borders(Borders::ALL).title(" Signals "));
            frame.render_widget(signals, areas.signals);

            let flags = |on: bool| if on { "on" } else { "off" };
            let footer = Paragraph::new(format!(
                " arrows pan | +/- zoom | [/] rotate | r reset | c/t/b cars {} trucks {} buses {} | e export | o reload | q quit | {}",
                flags(state.filter.show_cars),
                flags(state.filter.show_trucks),
                flags(state.filter.show_buses),
                state.status,
            ))
            .style(Style::default().fg(Color::Gray));
            frame.render_widget(footer, areas.footer);
        })?;

        if !event::poll(std::time::Duration::from_millis(50))? {
            continue;
        }
        let mapping = CellMapping {
            area: map_area,
            px_per_col: PX_PER_COL,
            px_per_row: PX_PER_ROW,
        };
        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                key_action(key.code, key.modifiers, map_vp.center())
            }
            Event::Mouse(mouse) => pointer.mouse_action(mouse, &mapping),
            _ => None,
        };

        match action {
            Some(Action::Quit) => break,
            Some(Action::View(event)) => state.view.apply(event, map_vp.center()),
            Some(Action::ToggleCars) => state.toggle(VehicleKind::Car),
            Some(Action::ToggleTrucks) => state.toggle(VehicleKind::Truck),
            Some(Action::ToggleBuses) => state.toggle(VehicleKind::Bus),
            Some(Action::Export) => {
                state.status = export(shared, state, map_vp, chart_vp).unwrap_or_else(|e| {
                    warn!("export failed: {e:#}");
                    format!("export failed: {e}")
                });
            }
            Some(Action::Reload) => {
                if let Err(e) = reload_network(shared, state) {
                    warn!("reload failed: {e:#}");
                    state.status = format!("reload failed: {e}");
                }
            }
            None => {}
        }
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use roadview_protocol::Point;

    fn single_lane_net(shape: &str) -> String {
        format!(
            r#"<net>
    <location convBoundary="0.00,0.00,300.00,300.00"/>
    <edge id="e1" from="a" to="b">
        <lane id="e1_0" index="0" speed="13.89" shape="{shape}"/>
    </edge>
</net>"#
        )
    }

    fn wait_until(mut ready: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if ready() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        p.distance(Point::new(a.x + t * dx, a.y + t * dy))
    }

    fn on_lane(p: Point, network: &NetworkSnapshot) -> bool {
        network.lanes.iter().any(|lane| {
            lane.points
                .windows(2)
                .any(|w| distance_to_segment(p, w[0], w[1]) < 1e-6)
        })
    }

    #[test]
    fn reload_moves_vehicles_onto_the_new_network() {
        let dir = std::env::temp_dir().join(format!("roadview-tui-reload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let cfg = dir.join("sim.sumocfg");
        std::fs::write(
            &cfg,
            r#"<configuration><input><net-file value="city.net.xml"/></input></configuration>"#,
        )
        .unwrap();
        std::fs::write(dir.join("city.net.xml"), single_lane_net("0.00,0.00 100.00,0.00")).unwrap();

        let settings = ViewerSettings {
            config_path: cfg,
            feed_vehicles: 6,
            feed_tick_ms: 2,
            ..ViewerSettings::default()
        };
        let store = NetworkStore::default();
        let vehicles = Arc::new(LiveVehicleState::new());
        let trends = Arc::new(TrendSeriesBuffer::new(settings.trend_capacity));
        let shared = Shared {
            store: &store,
            vehicles: &vehicles,
            trends: &trends,
            settings: &settings,
        };
        let mut state = ViewerState::new();

        let first = reload_network(&shared, &mut state).unwrap();
        assert_eq!(first.lanes.len(), 1);
        assert!(wait_until(|| trends.snapshot().len() == trends.capacity()));
        state.view.zoom = 4.0;

        std::fs::write(
            dir.join("city.net.xml"),
            single_lane_net("200.00,100.00 200.00,250.00 260.00,250.00"),
        )
        .unwrap();
        let second = reload_network(&shared, &mut state).unwrap();
        assert!(Arc::ptr_eq(&second, &store.current()));
        assert_eq!(state.view, ViewTransform::identity());
        assert!(trends.snapshot().len() < trends.capacity());
        assert!(state.feed.as_ref().is_some_and(FeedHandle::is_running));

        // The old producer was joined before the new one started, so every
        // non-empty generation from here on comes from the new network.
        let mut checked = 0;
        let mut last_generation = 0;
        assert!(wait_until(|| {
            let generation = vehicles.snapshot();
            if generation.is_empty() || generation.generation == last_generation {
                return false;
            }
            last_generation = generation.generation;
            for vehicle in &generation.vehicles {
                assert!(on_lane(vehicle.position, &second), "{vehicle:?} is off the new lane");
                assert!(!on_lane(vehicle.position, &first), "{vehicle:?} is still on the old lane");
            }
            checked += 1;
            checked >= 5
        }));

        drop(state);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
