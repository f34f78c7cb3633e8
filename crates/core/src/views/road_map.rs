//! Layered map composite: background, roads, signal markers, vehicles.
//!
//! Output is a flat command list; later commands occlude earlier ones.

use roadview_protocol::{Dash, LineCap, Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};
use serde::{Deserialize, Serialize};

use crate::mapper::CoordinateMapper;
use crate::model::{LaneGeometry, NetworkSnapshot, VehicleEntity, VehicleKind};
use crate::transform::ViewTransform;

const OUTLINE_EXTRA_PX: f64 = 6.0;
const SHOULDER_EXTRA_PX: f64 = 2.0;
const INTERNAL_MIN_PX: f64 = 3.0;
const INTERNAL_WIDTH_FACTOR: f64 = 0.70;

const SIGNAL_RADIUS: f64 = 5.0;
const BADGE_OFFSET_X: f64 = 8.0;
const BADGE_PAD_X: f64 = 6.0;
const BADGE_PAD_Y: f64 = 3.0;
const BADGE_RADIUS: f64 = 5.0;
const BADGE_FONT_SIZE: f64 = 12.0;
const BADGE_GAP_Y: f64 = 2.0;
/// Average advance width of a label glyph, in ems. Stands in for font
/// metrics, which are not available when building commands.
const GLYPH_ADVANCE_EM: f64 = 0.6;
/// Ascent of the label font, in ems.
const FONT_ASCENT_EM: f64 = 0.8;

/// Stroke sizing for roads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadStyle {
    pub thickness_multiplier: f64,
    pub min_pixel_width: f64,
    pub lane_markings: bool,
}

impl Default for RoadStyle {
    fn default() -> Self {
        Self {
            thickness_multiplier: 1.25,
            min_pixel_width: 6.0,
            lane_markings: true,
        }
    }
}

/// Everything one map frame is drawn from.
pub struct MapScene<'a> {
    pub network: &'a NetworkSnapshot,
    pub vehicles: &'a [VehicleEntity],
    /// Vehicle-visibility predicate over `(kind, speed)`.
    pub filter: &'a dyn Fn(VehicleKind, f64) -> bool,
    pub view: &'a ViewTransform,
    pub style: RoadStyle,
}

/// Render the map composite for one frame.
pub fn render_road_map(scene: &MapScene<'_>, viewport: &Viewport) -> Vec<RenderCommand> {
    let mapper = CoordinateMapper::new(&scene.network.bounds, *viewport, scene.view);
    let mut commands = Vec::with_capacity(
        2 + scene.network.lanes.len() * 4
            + scene.network.signal_positions.len() * 4
            + scene.vehicles.len() * 6,
    );

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
        color: ThemeToken::MapBackground,
        border_color: None,
        corner_radius: 0.0,
    });

    render_roads(&mut commands, scene, &mapper);
    render_signals(&mut commands, scene.network, &mapper);
    render_vehicles(&mut commands, scene, &mapper);

    commands
}

fn lane_px(lane: &LaneGeometry, scale: f64, style: &RoadStyle) -> f64 {
    let px = (lane.width_meters * scale * style.thickness_multiplier).max(style.min_pixel_width);
    if lane.internal {
        (px * INTERNAL_WIDTH_FACTOR).max(INTERNAL_MIN_PX)
    } else {
        px
    }
}

fn render_roads(out: &mut Vec<RenderCommand>, scene: &MapScene<'_>, mapper: &CoordinateMapper<'_>) {
    let lanes: Vec<(&LaneGeometry, Vec<Point>)> = scene
        .network
        .lanes
        .iter()
        .filter(|lane| lane.points.len() >= 2)
        .map(|lane| {
            let points = lane.points.iter().map(|p| mapper.world_to_screen(*p)).collect();
            (lane, points)
        })
        .collect();
    if lanes.is_empty() {
        return;
    }

    let scale = mapper.current_scale();
    let style = &scene.style;

    out.push(RenderCommand::BeginGroup {
        id: "roads".into(),
        label: None,
    });

    for pass in [
        RoadPass::Outline,
        RoadPass::Shoulder,
        RoadPass::Surface,
        RoadPass::Marking,
    ] {
        if pass == RoadPass::Marking && !style.lane_markings {
            continue;
        }
        for (lane, points) in &lanes {
            if let Some(command) = road_stroke(pass, lane, points, lane_px(lane, scale, style)) {
                out.push(command);
            }
        }
    }

    out.push(RenderCommand::EndGroup);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoadPass {
    Outline,
    Shoulder,
    Surface,
    Marking,
}

fn road_stroke(pass: RoadPass, lane: &LaneGeometry, points: &[Point], px: f64) -> Option<RenderCommand> {
    let (color, width) = match pass {
        RoadPass::Outline => (ThemeToken::RoadOutline, px + OUTLINE_EXTRA_PX),
        RoadPass::Shoulder => (ThemeToken::RoadShoulder, px + SHOULDER_EXTRA_PX),
        RoadPass::Surface if lane.internal => (ThemeToken::RoadInternal, px),
        RoadPass::Surface => (ThemeToken::RoadSurface, px),
        RoadPass::Marking => {
            if lane.internal || lane.lane_index != 0 {
                return None;
            }
            return Some(RenderCommand::DrawPolyline {
                points: points.to_vec(),
                color: ThemeToken::LaneMarking,
                width: (px * 0.10).max(1.5),
                cap: LineCap::Butt,
                dash: Some(Dash {
                    on: (px * 1.4).max(12.0),
                    off: (px * 1.1).max(10.0),
                }),
            });
        }
    };
    Some(RenderCommand::DrawPolyline {
        points: points.to_vec(),
        color,
        width,
        cap: LineCap::Round,
        dash: None,
    })
}

fn render_signals(out: &mut Vec<RenderCommand>, network: &NetworkSnapshot, mapper: &CoordinateMapper<'_>) {
    if network.signal_positions.is_empty() {
        return;
    }

    out.push(RenderCommand::BeginGroup {
        id: "signals".into(),
        label: None,
    });

    for (id, world) in &network.signal_positions {
        let s = mapper.world_to_screen(*world);
        if !s.is_finite() {
            continue;
        }
        let tag = network.signal_label(id);

        out.push(RenderCommand::DrawEllipse {
            center: s,
            radius: Point::new(SIGNAL_RADIUS, SIGNAL_RADIUS),
            color: ThemeToken::SignalFill,
            border_color: Some(ThemeToken::SignalBorder),
        });

        let badge = badge_rect(s, tag);
        out.push(RenderCommand::DrawRect {
            rect: badge,
            color: ThemeToken::LabelBackground,
            border_color: Some(ThemeToken::LabelBorder),
            corner_radius: BADGE_RADIUS,
        });
        out.push(RenderCommand::DrawText {
            position: Point::new(badge.x + BADGE_PAD_X, badge.y + badge.h / 2.0),
            text: tag.to_string(),
            color: ThemeToken::LabelText,
            font_size: BADGE_FONT_SIZE,
            align: TextAlign::Left,
        });
    }

    out.push(RenderCommand::EndGroup);
}

/// Label badge beside a signal marker at `anchor`: offset to the right, with
/// the text's ascent ending just above the marker center.
fn badge_rect(anchor: Point, tag: &str) -> Rect {
    let text_w = tag.chars().count() as f64 * BADGE_FONT_SIZE * GLYPH_ADVANCE_EM;
    let ascent = BADGE_FONT_SIZE * FONT_ASCENT_EM;
    Rect::new(
        anchor.x + BADGE_OFFSET_X,
        anchor.y - ascent - BADGE_GAP_Y,
        text_w + BADGE_PAD_X * 2.0,
        ascent + BADGE_PAD_Y * 2.0,
    )
}

fn render_vehicles(out: &mut Vec<RenderCommand>, scene: &MapScene<'_>, mapper: &CoordinateMapper<'_>) {
    for vehicle in scene.vehicles {
        if !(scene.filter)(vehicle.kind, vehicle.speed) {
            continue;
        }
        let s = mapper.world_to_screen(vehicle.position);
        if !s.is_finite() {
            continue;
        }
        out.push(RenderCommand::BeginGroup {
            id: format!("vehicle-{}", vehicle.id),
            label: Some(vehicle.kind.as_str().to_string()),
        });
        vehicle_shape(out, s, vehicle.kind);
        out.push(RenderCommand::EndGroup);
    }
}

fn body(x: f64, y: f64, w: f64, h: f64, radius: f64, color: ThemeToken) -> RenderCommand {
    RenderCommand::DrawRect {
        rect: Rect::new(x, y, w, h),
        color,
        border_color: None,
        corner_radius: radius,
    }
}

fn wheel(x: f64, y: f64) -> RenderCommand {
    RenderCommand::DrawEllipse {
        center: Point::new(x, y),
        radius: Point::new(2.0, 2.0),
        color: ThemeToken::Wheel,
        border_color: None,
    }
}

/// Silhouette centered at `s`, shadow first.
fn vehicle_shape(out: &mut Vec<RenderCommand>, s: Point, kind: VehicleKind) {
    out.push(RenderCommand::DrawEllipse {
        center: Point::new(s.x, s.y + 6.0),
        radius: Point::new(8.0, 4.0),
        color: ThemeToken::VehicleShadow,
        border_color: None,
    });

    match kind {
        VehicleKind::Truck => {
            out.push(body(s.x - 12.0, s.y - 6.0, 24.0, 12.0, 2.0, ThemeToken::TruckBody));
            out.push(body(s.x + 2.0, s.y - 6.0, 10.0, 12.0, 1.5, ThemeToken::TruckCargo));
            out.push(wheel(s.x - 8.0, s.y + 7.0));
            out.push(wheel(s.x + 8.0, s.y + 7.0));
        }
        VehicleKind::Bus => {
            out.push(body(s.x - 14.0, s.y - 6.0, 28.0, 12.0, 3.0, ThemeToken::BusBody));
            out.push(wheel(s.x - 10.0, s.y + 7.0));
            out.push(wheel(s.x + 10.0, s.y + 7.0));
        }
        VehicleKind::Car | VehicleKind::Other => {
            out.push(body(s.x - 7.0, s.y - 5.0, 14.0, 10.0, 3.0, ThemeToken::CarBody));
            out.push(wheel(s.x - 4.0, s.y + 6.0));
            out.push(wheel(s.x + 4.0, s.y + 6.0));
        }
    }
}
