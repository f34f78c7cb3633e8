use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use roadview_core::export::{export_map_svg, export_trend_svg};
use roadview_core::live::{
    FeedHandle, LiveVehicleState, SyntheticTraffic, TrendSeriesBuffer, spawn_feed,
};
use roadview_core::model::{NetworkSnapshot, NetworkStore, VehicleFilter, VehicleKind};
use roadview_core::parsers::network_path_from_config;
use roadview_core::views::{MapScene, render_road_map, render_trend_chart};
use roadview_core::{CoordinateMapper, DragButton, ViewEvent, ViewTransform, ViewerSettings};
use roadview_protocol::{Point, Viewport};
use tracing::{info, warn};

use crate::renderer;
use crate::theme::ThemeMode;

/// Scroll distance, in points, that counts as one wheel notch.
const SCROLL_PER_NOTCH: f32 = 40.0;
const CHART_HEIGHT: f32 = 180.0;
const SIDE_PANEL_WIDTH: f32 = 300.0;
const MAX_SPEED_FILTER_MPS: f64 = 30.0;

/// Pointer and keyboard state over the map for one frame.
#[derive(Debug, Clone, Copy, Default)]
struct MapInput {
    primary_drag: egui::Vec2,
    secondary_drag: egui::Vec2,
    scroll: egui::Vec2,
    shift: bool,
    /// Pointer position relative to the map's top-left corner.
    hover: Option<egui::Pos2>,
    reset: bool,
}

/// Egui scroll is positive away from the user, which zooms in.
fn scroll_to_notches(delta: f32) -> f64 {
    f64::from(-delta / SCROLL_PER_NOTCH)
}

fn map_events(input: &MapInput) -> Vec<ViewEvent> {
    let mut events = Vec::new();
    if input.reset {
        events.push(ViewEvent::Reset);
    }
    for (button, delta) in [
        (DragButton::Primary, input.primary_drag),
        (DragButton::Secondary, input.secondary_drag),
    ] {
        if delta != egui::Vec2::ZERO {
            events.push(ViewEvent::Drag {
                button,
                dx: f64::from(delta.x),
                dy: f64::from(delta.y),
            });
        }
    }
    // Some platforms turn shift+wheel into horizontal scroll.
    let scroll = if input.shift {
        input.scroll.x + input.scroll.y
    } else {
        input.scroll.y
    };
    if let Some(hover) = input.hover
        && scroll != 0.0
    {
        events.push(ViewEvent::Wheel {
            notches: scroll_to_notches(scroll),
            cursor: Point::new(f64::from(hover.x), f64::from(hover.y)),
            modifier: input.shift,
        });
    }
    events
}

/// Network file for a user-picked path: configurations are resolved,
/// anything else is taken as the network itself.
fn network_path_for(picked: &Path) -> PathBuf {
    let is_config = picked
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sumocfg"));
    if is_config {
        network_path_from_config(picked)
    } else {
        picked.to_path_buf()
    }
}

/// `city.svg` → `city-trends.svg`, in the same directory.
fn trend_path_beside(map_path: &Path) -> PathBuf {
    let stem = map_path
        .file_stem()
        .map_or_else(|| "roadview".into(), |s| s.to_string_lossy());
    map_path.with_file_name(format!("{stem}-trends.svg"))
}

/// Pan so that `world` lands in the middle of the map panel.
fn center_on(view: &mut ViewTransform, network: &NetworkSnapshot, viewport: Viewport, world: Point) {
    let mapper = CoordinateMapper::new(&network.bounds, viewport, view);
    let screen = mapper.world_to_screen(world);
    let center = mapper.center();
    view.pan_x += center.x - screen.x;
    view.pan_y += center.y - screen.y;
}

/// Main application state.
pub struct RoadviewApp {
    settings: ViewerSettings,
    store: NetworkStore,
    vehicles: Arc<LiveVehicleState>,
    trends: Arc<TrendSeriesBuffer>,
    feed: Option<FeedHandle>,
    view: ViewTransform,
    filter: VehicleFilter,
    theme_mode: ThemeMode,
    selected_signal: Option<String>,
    /// Last drawn panel sizes, used as the export size.
    map_viewport: Viewport,
    chart_viewport: Viewport,
    status: Option<String>,
    error: Option<String>,
}

impl RoadviewApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: ViewerSettings) -> Self {
        let theme_mode = ThemeMode::default();
        cc.egui_ctx.set_visuals(theme_mode.visuals());

        let trends = Arc::new(TrendSeriesBuffer::new(settings.trend_capacity));
        let mut app = Self {
            map_viewport: settings.map_export_fallback.viewport(),
            chart_viewport: settings.trend_export_fallback.viewport(),
            settings,
            store: NetworkStore::default(),
            vehicles: Arc::new(LiveVehicleState::new()),
            trends,
            feed: None,
            view: ViewTransform::identity(),
            filter: VehicleFilter::default(),
            theme_mode,
            selected_signal: None,
            status: None,
            error: None,
        };
        let net_path = network_path_from_config(&app.settings.config_path);
        app.load_network(&net_path);
        app
    }

    /// Parse `net_path`, publish it and restart the vehicle feed on it.
    fn load_network(&mut self, net_path: &Path) {
        // Dropping the old handle stops its thread and clears the vehicles.
        self.feed = None;
        self.trends.clear();

        let network = self.store.reload(net_path, self.settings.lane_policy);
        self.view.reset();
        self.selected_signal = None;
        if network.is_empty() {
            self.error = Some(format!("no road geometry in {}", net_path.display()));
        } else {
            self.error = None;
            self.status = Some(format!("loaded {}", net_path.display()));
        }

        match spawn_feed(
            SyntheticTraffic::new(&network, self.settings.feed_vehicles),
            Arc::clone(&self.vehicles),
            Arc::clone(&self.trends),
            self.settings.feed_tick(),
        ) {
            Ok(handle) => self.feed = Some(handle),
            Err(e) => {
                warn!("vehicle feed not started: {e}");
                self.error = Some(format!("vehicle feed not started: {e}"));
            }
        }
    }

    fn open_dialog(&mut self) {
        let Some(picked) = rfd::FileDialog::new()
            .add_filter("SUMO", &["sumocfg", "xml"])
            .pick_file()
        else {
            return;
        };
        let net_path = network_path_for(&picked);
        info!(picked = %picked.display(), net = %net_path.display(), "opening network");
        self.load_network(&net_path);
    }

    fn export_dialog(&mut self) {
        let Some(map_path) = rfd::FileDialog::new()
            .add_filter("SVG", &["svg"])
            .set_file_name("roadview-map.svg")
            .save_file()
        else {
            return;
        };
        let trend_path = trend_path_beside(&map_path);
        match self.export(&map_path, &trend_path) {
            Ok(()) => {
                info!(map = %map_path.display(), trends = %trend_path.display(), "exported snapshots");
                self.status = Some(format!("exported {}", map_path.display()));
            }
            Err(e) => {
                warn!("export failed: {e}");
                self.error = Some(format!("export failed: {e}"));
            }
        }
    }

    fn export(&self, map_path: &Path, trend_path: &Path) -> std::io::Result<()> {
        let network = self.store.current();
        let generation = self.vehicles.snapshot();
        let filter = self.filter;
        let allows = move |kind: VehicleKind, speed: f64| filter.allows(kind, speed);
        let scene = MapScene {
            network: &network,
            vehicles: &generation.vehicles,
            filter: &allows,
            view: &self.view,
            style: self.settings.road_style,
        };
        let map = export_map_svg(&scene, self.map_viewport, self.settings.map_export_fallback.viewport());
        let chart = export_trend_svg(
            &self.trends.snapshot(),
            self.chart_viewport,
            self.settings.trend_export_fallback.viewport(),
        );
        std::fs::write(map_path, map)?;
        std::fs::write(trend_path, chart)
    }

    fn toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("roadview");
            ui.separator();

            if ui.button("Open…").clicked() {
                self.open_dialog();
            }
            if ui.button("Reset view").clicked() {
                self.view.reset();
            }
            if ui.button("Export SVG").clicked() {
                self.export_dialog();
            }

            ui.separator();

            let theme_label = match self.theme_mode {
                ThemeMode::Dark => "Night",
                ThemeMode::Light => "Day",
            };
            if ui.button(theme_label).clicked() {
                self.theme_mode = self.theme_mode.toggled();
                ctx.set_visuals(self.theme_mode.visuals());
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!(
                    "{:.0}%  {:.0}°",
                    self.view.zoom * 100.0,
                    self.view.rotation_normalized().to_degrees()
                ));
            });
        });
    }

    fn side_panel(&mut self, ui: &mut egui::Ui, network: &NetworkSnapshot) {
        ui.heading("Vehicles");
        ui.checkbox(&mut self.filter.show_cars, "Cars");
        ui.checkbox(&mut self.filter.show_trucks, "Trucks");
        ui.checkbox(&mut self.filter.show_buses, "Buses");
        ui.add(
            egui::Slider::new(&mut self.filter.min_speed_mps, 0.0..=MAX_SPEED_FILTER_MPS)
                .text("min speed (m/s)"),
        );

        ui.separator();
        ui.heading("Live trends");
        let width = ui.available_width().max(1.0);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(width, CHART_HEIGHT), egui::Sense::hover());
        self.chart_viewport = Viewport::new(f64::from(rect.width()), f64::from(rect.height()));
        let chart = render_trend_chart(&self.trends.snapshot(), &self.chart_viewport);
        renderer::render_commands(&ui.painter_at(rect), &chart, rect.min, self.theme_mode);

        ui.separator();
        ui.heading("Signals");
        let entries = network.signal_entries();
        if entries.is_empty() {
            ui.weak("no traffic lights");
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (id, label) in entries {
                let selected = self.selected_signal.as_deref() == Some(id);
                if ui.selectable_label(selected, format!("{label}   {id}")).clicked() {
                    self.selected_signal = Some(id.to_string());
                    if let Some(pos) = network.signal_positions.get(id) {
                        center_on(&mut self.view, network, self.map_viewport, *pos);
                    }
                }
            }
        });
    }

    fn map_panel(&mut self, ui: &mut egui::Ui, network: &NetworkSnapshot) {
        let available = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(available, egui::Sense::click_and_drag());
        self.map_viewport = Viewport::new(f64::from(available.width()), f64::from(available.height()));

        let drag_by = |button| {
            if response.dragged_by(button) {
                response.drag_delta()
            } else {
                egui::Vec2::ZERO
            }
        };
        let hovered = response.hovered();
        let (raw_scroll, shift, reset_key) = ui.input(|i| {
            (i.raw_scroll_delta, i.modifiers.shift, i.key_pressed(egui::Key::R))
        });
        let input = MapInput {
            primary_drag: drag_by(egui::PointerButton::Primary),
            secondary_drag: drag_by(egui::PointerButton::Secondary),
            scroll: if hovered { raw_scroll } else { egui::Vec2::ZERO },
            shift,
            hover: response.hover_pos().map(|p| (p - available.min).to_pos2()),
            reset: response.double_clicked() || (hovered && reset_key),
        };
        let center = self.map_viewport.center();
        for event in map_events(&input) {
            self.view.apply(event, center);
        }

        let generation = self.vehicles.snapshot();
        let filter = self.filter;
        let allows = move |kind: VehicleKind, speed: f64| filter.allows(kind, speed);
        let scene = MapScene {
            network,
            vehicles: &generation.vehicles,
            filter: &allows,
            view: &self.view,
            style: self.settings.road_style,
        };
        let commands = render_road_map(&scene, &self.map_viewport);
        renderer::render_commands(&ui.painter_at(available), &commands, available.min, self.theme_mode);

        if let Some(pos) = response.hover_pos() {
            let regions = renderer::hit_regions(&commands, available.min);
            if let Some(hit) = renderer::region_at(&regions, pos) {
                let id = hit.id.strip_prefix("vehicle-").unwrap_or(&hit.id);
                let speed = generation
                    .vehicles
                    .iter()
                    .find(|v| v.id == id)
                    .map_or(0.0, |v| v.speed);
                response.on_hover_text_at_pointer(format!("{id} ({}, {speed:.1} m/s)", hit.label));
            }
        }
    }
}

impl eframe::App for RoadviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let network = self.store.current();

        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ctx, ui));

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                } else if let Some(status) = &self.status {
                    ui.label(status);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let generation = self.vehicles.snapshot();
                    let shown = generation
                        .vehicles
                        .iter()
                        .filter(|v| self.filter.allows(v.kind, v.speed))
                        .count();
                    ui.label(format!(
                        "Lanes: {} | Signals: {} | Vehicles: {shown}/{}",
                        network.lanes.len(),
                        network.signal_positions.len(),
                        generation.len(),
                    ));
                });
            });
        });

        egui::SidePanel::right("side")
            .default_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| self.side_panel(ui, &network));

        // Central panel: road map
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.map_panel(ui, &network));

        if self.feed.as_ref().is_some_and(FeedHandle::is_running) {
            ctx.request_repaint_after(self.settings.feed_tick().max(Duration::from_millis(16)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadview_core::model::Bounds;

    #[test]
    fn scrolling_up_zooms_in() {
        assert!(scroll_to_notches(40.0) < 0.0);
        assert!((scroll_to_notches(-80.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn drags_map_to_buttons() {
        let input = MapInput {
            primary_drag: egui::vec2(3.0, -4.0),
            secondary_drag: egui::vec2(10.0, 0.0),
            ..MapInput::default()
        };
        assert_eq!(
            map_events(&input),
            vec![
                ViewEvent::Drag { button: DragButton::Primary, dx: 3.0, dy: -4.0 },
                ViewEvent::Drag { button: DragButton::Secondary, dx: 10.0, dy: 0.0 },
            ]
        );
    }

    #[test]
    fn wheel_needs_a_hovered_pointer() {
        let mut input = MapInput {
            scroll: egui::vec2(0.0, 40.0),
            ..MapInput::default()
        };
        assert!(map_events(&input).is_empty());

        input.hover = Some(egui::pos2(120.0, 80.0));
        assert_eq!(
            map_events(&input),
            vec![ViewEvent::Wheel {
                notches: -1.0,
                cursor: Point::new(120.0, 80.0),
                modifier: false,
            }]
        );
    }

    #[test]
    fn shift_wheel_accepts_horizontal_scroll() {
        let input = MapInput {
            scroll: egui::vec2(-40.0, 0.0),
            shift: true,
            hover: Some(egui::pos2(0.0, 0.0)),
            ..MapInput::default()
        };
        assert!(matches!(
            map_events(&input).as_slice(),
            [ViewEvent::Wheel { modifier: true, notches, .. }] if (*notches - 1.0).abs() < 1e-9
        ));
    }

    #[test]
    fn reset_comes_first() {
        let input = MapInput {
            primary_drag: egui::vec2(1.0, 1.0),
            reset: true,
            ..MapInput::default()
        };
        assert_eq!(map_events(&input).first(), Some(&ViewEvent::Reset));
    }

    #[test]
    fn picked_files_resolve_to_networks() {
        let net = Path::new("/data/city.net.xml");
        assert_eq!(network_path_for(net), net);
        let resolved = network_path_for(Path::new("/nonexistent/roadview/sim.SUMOCFG"));
        assert!(resolved.starts_with("/nonexistent/roadview"));
    }

    #[test]
    fn trend_export_sits_beside_map_export() {
        assert_eq!(
            trend_path_beside(Path::new("/tmp/out/city.svg")),
            Path::new("/tmp/out/city-trends.svg")
        );
    }

    #[test]
    fn centering_moves_point_to_panel_middle() {
        let mut network = NetworkSnapshot::empty();
        network.bounds = Bounds::new(0.0, 0.0, 200.0, 100.0);
        let viewport = Viewport::new(800.0, 600.0);
        let mut view = ViewTransform::identity();
        view.zoom = 3.0;
        view.rotation = 0.7;

        let target = Point::new(150.0, 20.0);
        center_on(&mut view, &network, viewport, target);
        let mapper = CoordinateMapper::new(&network.bounds, viewport, &view);
        let screen = mapper.world_to_screen(target);
        assert!((screen.x - 400.0).abs() < 1e-6);
        assert!((screen.y - 300.0).abs() < 1e-6);
    }
}
