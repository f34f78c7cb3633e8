use egui::{Align2, CornerRadius, FontId, Pos2, Rect, Shape, Stroke, StrokeKind, Vec2};
use roadview_protocol::{Dash, LineCap, Point, RenderCommand, TextAlign};

use crate::theme::{self, ThemeMode};

/// Screen area covered by one labelled group, for hover lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub rect: Rect,
    pub id: String,
    pub label: String,
}

fn to_pos(p: Point, offset: Pos2) -> Pos2 {
    Pos2::new(offset.x + p.x as f32, offset.y + p.y as f32)
}

fn align2(align: TextAlign) -> Align2 {
    match align {
        TextAlign::Left => Align2::LEFT_CENTER,
        TextAlign::Center => Align2::CENTER_CENTER,
        TextAlign::Right => Align2::RIGHT_CENTER,
    }
}

fn corner(radius: f64) -> CornerRadius {
    CornerRadius::same(radius.round().clamp(0.0, 255.0) as u8)
}

/// Screen-space extent of a drawing command, `None` for text and markers.
fn command_extent(cmd: &RenderCommand, offset: Pos2) -> Option<Rect> {
    match cmd {
        RenderCommand::DrawRect { rect, .. } => Some(Rect::from_min_size(
            to_pos(Point::new(rect.x, rect.y), offset),
            Vec2::new(rect.w as f32, rect.h as f32),
        )),
        RenderCommand::DrawEllipse { center, radius, .. } => Some(Rect::from_center_size(
            to_pos(*center, offset),
            Vec2::new(2.0 * radius.x as f32, 2.0 * radius.y as f32),
        )),
        RenderCommand::DrawPolyline { points, width, .. } => {
            let pts: Vec<Pos2> = points.iter().map(|p| to_pos(*p, offset)).collect();
            (!pts.is_empty()).then(|| Rect::from_points(&pts).expand(*width as f32 / 2.0))
        }
        RenderCommand::DrawText { .. }
        | RenderCommand::BeginGroup { .. }
        | RenderCommand::EndGroup => None,
    }
}

/// Collect one hit region per labelled group that drew anything.
///
/// Regions come out in paint order, so the last region containing a point is
/// the one on top.
pub fn hit_regions(commands: &[RenderCommand], offset: Pos2) -> Vec<HitRegion> {
    let mut open: Vec<(Option<(&str, &str)>, Option<Rect>)> = Vec::new();
    let mut regions = Vec::new();

    for cmd in commands {
        match cmd {
            RenderCommand::BeginGroup { id, label } => {
                open.push((label.as_deref().map(|l| (id.as_str(), l)), None));
            }
            RenderCommand::EndGroup => {
                if let Some((Some((id, label)), Some(rect))) = open.pop() {
                    regions.push(HitRegion {
                        rect,
                        id: id.to_string(),
                        label: label.to_string(),
                    });
                }
            }
            other => {
                let Some(extent) = command_extent(other, offset) else {
                    continue;
                };
                if let Some((_, bounds)) = open.last_mut() {
                    *bounds = Some(bounds.map_or(extent, |b| b.union(extent)));
                }
            }
        }
    }
    regions
}

/// The topmost region under `pos`.
pub fn region_at(regions: &[HitRegion], pos: Pos2) -> Option<&HitRegion> {
    regions.iter().rev().find(|r| r.rect.contains(pos))
}

fn stroke_polyline(
    painter: &egui::Painter,
    points: Vec<Pos2>,
    stroke: Stroke,
    cap: LineCap,
    dash: Option<Dash>,
) {
    if points.len() < 2 {
        return;
    }
    match dash {
        Some(d) => {
            painter.extend(Shape::dashed_line(&points, stroke, d.on as f32, d.off as f32));
        }
        None => {
            // egui strokes with butt ends; discs at every vertex give round
            // caps and round joins.
            if cap == LineCap::Round && stroke.width > 2.0 {
                let r = stroke.width / 2.0;
                for p in &points {
                    painter.circle_filled(*p, r, stroke.color);
                }
            }
            painter.add(Shape::line(points, stroke));
        }
    }
}

/// Paint a list of `RenderCommand` into an egui `Painter`.
///
/// `offset` is the top-left pixel position of the rendering area; command
/// coordinates are relative to it.
pub fn render_commands(
    painter: &egui::Painter,
    commands: &[RenderCommand],
    offset: Pos2,
    mode: ThemeMode,
) {
    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                corner_radius,
            } => {
                let r = Rect::from_min_size(
                    to_pos(Point::new(rect.x, rect.y), offset),
                    Vec2::new(rect.w as f32, rect.h as f32),
                );
                let rounding = corner(*corner_radius);
                painter.rect_filled(r, rounding, theme::resolve(*color, mode));
                if let Some(border) = border_color {
                    painter.rect_stroke(
                        r,
                        rounding,
                        Stroke::new(1.0, theme::resolve(*border, mode)),
                        StrokeKind::Inside,
                    );
                }
            }
            RenderCommand::DrawEllipse {
                center,
                radius,
                color,
                border_color,
            } => {
                let c = to_pos(*center, offset);
                let radius = Vec2::new(radius.x as f32, radius.y as f32);
                painter.add(Shape::ellipse_filled(c, radius, theme::resolve(*color, mode)));
                if let Some(border) = border_color {
                    painter.add(Shape::ellipse_stroke(
                        c,
                        radius,
                        Stroke::new(1.0, theme::resolve(*border, mode)),
                    ));
                }
            }
            RenderCommand::DrawPolyline {
                points,
                color,
                width,
                cap,
                dash,
            } => {
                let pts: Vec<Pos2> = points.iter().map(|p| to_pos(*p, offset)).collect();
                let stroke = Stroke::new(*width as f32, theme::resolve(*color, mode));
                stroke_polyline(painter, pts, stroke, *cap, *dash);
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                painter.text(
                    to_pos(*position, offset),
                    align2(*align),
                    text,
                    FontId::proportional(*font_size as f32),
                    theme::resolve(*color, mode),
                );
            }
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadview_protocol::ThemeToken;

    fn group(id: &str, label: Option<&str>, body: Vec<RenderCommand>) -> Vec<RenderCommand> {
        let mut out = vec![RenderCommand::BeginGroup {
            id: id.to_string(),
            label: label.map(String::from),
        }];
        out.extend(body);
        out.push(RenderCommand::EndGroup);
        out
    }

    fn dot(x: f64, y: f64, r: f64) -> RenderCommand {
        RenderCommand::DrawEllipse {
            center: Point::new(x, y),
            radius: Point::new(r, r),
            color: ThemeToken::CarBody,
            border_color: None,
        }
    }

    #[test]
    fn labelled_groups_become_regions() {
        let mut cmds = group("roads", None, vec![dot(0.0, 0.0, 50.0)]);
        cmds.extend(group("vehicle-c1", Some("car"), vec![dot(10.0, 10.0, 2.0), dot(14.0, 10.0, 2.0)]));

        let regions = hit_regions(&cmds, Pos2::new(100.0, 0.0));
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, "vehicle-c1");
        assert_eq!(regions[0].label, "car");
        assert_eq!(regions[0].rect, Rect::from_min_max(Pos2::new(108.0, 8.0), Pos2::new(116.0, 12.0)));
    }

    #[test]
    fn empty_groups_are_skipped() {
        let cmds = group("vehicle-x", Some("bus"), vec![RenderCommand::DrawText {
            position: Point::new(0.0, 0.0),
            text: "x".into(),
            color: ThemeToken::LabelText,
            font_size: 12.0,
            align: TextAlign::Left,
        }]);
        assert!(hit_regions(&cmds, Pos2::ZERO).is_empty());
    }

    #[test]
    fn topmost_region_wins() {
        let mut cmds = group("vehicle-a", Some("car"), vec![dot(10.0, 10.0, 5.0)]);
        cmds.extend(group("vehicle-b", Some("truck"), vec![dot(12.0, 10.0, 5.0)]));
        let regions = hit_regions(&cmds, Pos2::ZERO);
        let hit = region_at(&regions, Pos2::new(11.0, 10.0));
        assert_eq!(hit.map(|r| r.id.as_str()), Some("vehicle-b"));
        assert!(region_at(&regions, Pos2::new(40.0, 40.0)).is_none());
    }

    #[test]
    fn polyline_extent_includes_stroke_width() {
        let cmd = RenderCommand::DrawPolyline {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            color: ThemeToken::RoadSurface,
            width: 4.0,
            cap: LineCap::Round,
            dash: None,
        };
        let extent = command_extent(&cmd, Pos2::ZERO);
        assert_eq!(extent, Some(Rect::from_min_max(Pos2::new(-2.0, -2.0), Pos2::new(12.0, 2.0))));
    }

    #[test]
    fn text_alignment_maps_to_anchor() {
        assert_eq!(align2(TextAlign::Left), Align2::LEFT_CENTER);
        assert_eq!(align2(TextAlign::Right), Align2::RIGHT_CENTER);
        assert_eq!(corner(300.0), CornerRadius::same(255));
    }
}
