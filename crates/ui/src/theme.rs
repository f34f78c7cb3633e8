use roadview_protocol::ThemeToken;

/// Resolved RGBA color for egui rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ResolvedColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    Dark,
    #[default]
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Self::Dark => dark_visuals(),
            Self::Light => light_visuals(),
        }
    }
}

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> egui::Color32 {
    match mode {
        ThemeMode::Dark => resolve_dark(token),
        ThemeMode::Light => resolve_light(token),
    }
    .to_color32()
}

/// Night palette: dim ground, lighter asphalt so roads still read as roads.
fn resolve_dark(token: ThemeToken) -> ResolvedColor {
    match token {
        ThemeToken::MapBackground => ResolvedColor::rgb(0x11, 0x11, 0x1b),
        ThemeToken::RoadOutline => ResolvedColor::rgb(0x00, 0x00, 0x00),
        ThemeToken::RoadShoulder => ResolvedColor::rgb(0x45, 0x47, 0x5a),
        ThemeToken::RoadSurface => ResolvedColor::rgb(0x31, 0x32, 0x44),
        ThemeToken::RoadInternal => ResolvedColor::rgb(0x3b, 0x3d, 0x52),
        ThemeToken::LaneMarking => ResolvedColor::rgba(0xcd, 0xd6, 0xf4, 150),

        ThemeToken::SignalFill => ResolvedColor::rgba(0xa6, 0xe3, 0xa1, 220),
        ThemeToken::SignalBorder => ResolvedColor::rgb(0x1e, 0x1e, 0x2e),
        ThemeToken::LabelBackground => ResolvedColor::rgba(0x1e, 0x1e, 0x2e, 220),
        ThemeToken::LabelBorder => ResolvedColor::rgb(0x58, 0x5b, 0x70),
        ThemeToken::LabelText => ResolvedColor::rgb(0xcd, 0xd6, 0xf4),

        ThemeToken::VehicleShadow => ResolvedColor::rgba(0, 0, 0, 110),
        ThemeToken::CarBody => ResolvedColor::rgb(0xfa, 0xb3, 0x87),
        ThemeToken::TruckBody => ResolvedColor::rgb(0xa6, 0xad, 0xc8),
        ThemeToken::TruckCargo => ResolvedColor::rgb(0xf9, 0xe2, 0xaf),
        ThemeToken::BusBody => ResolvedColor::rgb(0xf9, 0xd9, 0x4a),
        ThemeToken::Wheel => ResolvedColor::rgb(0x11, 0x11, 0x1b),

        ThemeToken::ChartBackground => ResolvedColor::rgb(0x18, 0x18, 0x25),
        ThemeToken::ChartBorder => ResolvedColor::rgba(0xcd, 0xd6, 0xf4, 40),
        ThemeToken::ChartText => ResolvedColor::rgba(0xcd, 0xd6, 0xf4, 140),
        ThemeToken::SeriesWait => ResolvedColor::rgba(0xa6, 0xe3, 0xa1, 200),
        ThemeToken::SeriesThroughput => ResolvedColor::rgba(0x89, 0xb4, 0xfa, 200),
        ThemeToken::SeriesCongestion => ResolvedColor::rgba(0xf3, 0x8b, 0xa8, 200),
    }
}

/// Day palette, matching the SVG export colors.
fn resolve_light(token: ThemeToken) -> ResolvedColor {
    match token {
        ThemeToken::MapBackground => ResolvedColor::rgb(0xf3, 0xf4, 0xf6),
        ThemeToken::RoadOutline => ResolvedColor::rgb(0x0b, 0x0f, 0x14),
        ThemeToken::RoadShoulder => ResolvedColor::rgb(0x2a, 0x2f, 0x36),
        ThemeToken::RoadSurface => ResolvedColor::rgb(0x11, 0x18, 0x27),
        ThemeToken::RoadInternal => ResolvedColor::rgb(0x1f, 0x29, 0x37),
        ThemeToken::LaneMarking => ResolvedColor::rgba(255, 255, 255, 180),

        ThemeToken::SignalFill => ResolvedColor::rgba(255, 255, 255, 220),
        ThemeToken::SignalBorder | ThemeToken::LabelBorder | ThemeToken::LabelText => {
            ResolvedColor::rgb(0, 0, 0)
        }
        ThemeToken::LabelBackground => ResolvedColor::rgba(255, 255, 255, 200),

        ThemeToken::VehicleShadow => ResolvedColor::rgba(0, 0, 0, 70),
        ThemeToken::CarBody => ResolvedColor::rgb(0xfb, 0x92, 0x3c),
        ThemeToken::TruckBody => ResolvedColor::rgb(0x94, 0xa3, 0xb8),
        ThemeToken::TruckCargo => ResolvedColor::rgb(0xfd, 0xe6, 0x8a),
        ThemeToken::BusBody => ResolvedColor::rgb(0xfa, 0xcc, 0x15),
        ThemeToken::Wheel => ResolvedColor::rgb(0x11, 0x18, 0x27),

        ThemeToken::ChartBackground => ResolvedColor::rgb(0x0b, 0x12, 0x20),
        ThemeToken::ChartBorder => ResolvedColor::rgba(255, 255, 255, 40),
        ThemeToken::ChartText => ResolvedColor::rgba(255, 255, 255, 120),
        ThemeToken::SeriesWait => ResolvedColor::rgba(0x22, 0xc5, 0x5e, 170),
        ThemeToken::SeriesThroughput => ResolvedColor::rgba(0x3b, 0x82, 0xf6, 170),
        ThemeToken::SeriesCongestion => ResolvedColor::rgba(0xef, 0x44, 0x44, 170),
    }
}

// ── egui visual presets ────────────────────────────────────────────────────

fn rounded(mut v: egui::Visuals) -> egui::Visuals {
    v.window_corner_radius = egui::CornerRadius::same(6);
    v.menu_corner_radius = egui::CornerRadius::same(6);
    v.widgets.noninteractive.corner_radius = egui::CornerRadius::same(5);
    v.widgets.inactive.corner_radius = egui::CornerRadius::same(5);
    v.widgets.hovered.corner_radius = egui::CornerRadius::same(5);
    v.widgets.active.corner_radius = egui::CornerRadius::same(5);
    v.widgets.open.corner_radius = egui::CornerRadius::same(5);
    v
}

fn dark_visuals() -> egui::Visuals {
    let mut v = egui::Visuals::dark();
    v.panel_fill = egui::Color32::from_rgb(0x18, 0x18, 0x25);
    v.window_fill = egui::Color32::from_rgb(0x1e, 0x1e, 0x2e);
    v.extreme_bg_color = egui::Color32::from_rgb(0x11, 0x11, 0x1b);
    v.faint_bg_color = egui::Color32::from_rgb(0x1e, 0x1e, 0x2e);
    v.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(0x31, 0x32, 0x44);
    v.widgets.noninteractive.fg_stroke =
        egui::Stroke::new(1.0, egui::Color32::from_rgb(0xba, 0xc2, 0xde));
    v.widgets.inactive.bg_fill = egui::Color32::from_rgb(0x45, 0x47, 0x5a);
    v.widgets.hovered.bg_fill = egui::Color32::from_rgb(0x58, 0x5b, 0x70);
    v.widgets.active.bg_fill = egui::Color32::from_rgb(0x89, 0xb4, 0xfa);
    v.selection.bg_fill = egui::Color32::from_rgba_unmultiplied(0x89, 0xb4, 0xfa, 60);
    v.selection.stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(0x89, 0xb4, 0xfa));
    v.warn_fg_color = egui::Color32::from_rgb(0xf9, 0xe2, 0xaf);
    v.error_fg_color = egui::Color32::from_rgb(0xf3, 0x8b, 0xa8);
    rounded(v)
}

fn light_visuals() -> egui::Visuals {
    let mut v = egui::Visuals::light();
    v.panel_fill = egui::Color32::from_rgb(250, 250, 252);
    v.window_fill = egui::Color32::from_rgb(255, 255, 255);
    v.faint_bg_color = egui::Color32::from_rgb(245, 245, 248);
    v.widgets.noninteractive.bg_stroke =
        egui::Stroke::new(1.0, egui::Color32::from_rgb(210, 210, 215));
    v.widgets.inactive.bg_fill = egui::Color32::from_rgb(230, 230, 235);
    v.widgets.hovered.bg_fill = egui::Color32::from_rgb(220, 220, 228);
    v.widgets.active.bg_fill = egui::Color32::from_rgb(50, 110, 220);
    v.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
    v.selection.bg_fill = egui::Color32::from_rgba_unmultiplied(50, 110, 220, 50);
    v.selection.stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(50, 110, 220));
    rounded(v)
}
