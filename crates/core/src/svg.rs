//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use std::fmt::Write;

use roadview_protocol::{LineCap, RenderCommand, TextAlign, ThemeToken};

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions. `background` is
/// painted underneath everything, e.g. `"#ffffff"` for exports.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, background: &str) -> String {
    let mut svg = String::with_capacity(commands.len() * 120 + 256);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif">"#,
    );
    let _ = write!(
        svg,
        r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
        escape_xml(background),
    );

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                corner_radius,
            } => {
                let (fill, fill_opacity) = resolve_color(*color);
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}""#,
                    rect.x, rect.y, rect.w, rect.h,
                );
                push_opacity(&mut svg, "fill-opacity", fill_opacity);
                if *corner_radius > 0.0 {
                    let _ = write!(svg, r#" rx="{corner_radius}""#);
                }
                push_border(&mut svg, *border_color);
                svg.push_str("/>");
            }
            RenderCommand::DrawEllipse {
                center,
                radius,
                color,
                border_color,
            } => {
                let (fill, fill_opacity) = resolve_color(*color);
                let _ = write!(
                    svg,
                    r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" fill="{fill}""#,
                    center.x, center.y, radius.x, radius.y,
                );
                push_opacity(&mut svg, "fill-opacity", fill_opacity);
                push_border(&mut svg, *border_color);
                svg.push_str("/>");
            }
            RenderCommand::DrawPolyline {
                points,
                color,
                width: line_width,
                cap,
                dash,
            } => {
                if points.len() < 2 {
                    continue;
                }
                let (stroke, opacity) = resolve_color(*color);
                svg.push_str(r#"<polyline points=""#);
                for (i, p) in points.iter().enumerate() {
                    if i > 0 {
                        svg.push(' ');
                    }
                    let _ = write!(svg, "{},{}", p.x, p.y);
                }
                let (cap, join) = match cap {
                    LineCap::Round => ("round", "round"),
                    LineCap::Butt => ("butt", "round"),
                };
                let _ = write!(
                    svg,
                    r#"" fill="none" stroke="{stroke}" stroke-width="{line_width}" stroke-linecap="{cap}" stroke-linejoin="{join}""#,
                );
                push_opacity(&mut svg, "stroke-opacity", opacity);
                if let Some(dash) = dash {
                    let _ = write!(svg, r#" stroke-dasharray="{} {}""#, dash.on, dash.off);
                }
                svg.push_str("/>");
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let (fill, opacity) = resolve_color(*color);
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" fill="{fill}" font-size="{font_size}" font-weight="bold" text-anchor="{anchor}" dominant-baseline="central""#,
                    position.x, position.y,
                );
                push_opacity(&mut svg, "fill-opacity", opacity);
                let _ = write!(svg, ">{}</text>", escape_xml(text));
            }
            RenderCommand::BeginGroup { id, label } => {
                let _ = write!(svg, r#"<g id="{}">"#, escape_xml(id));
                if let Some(label) = label {
                    let _ = write!(svg, "<title>{}</title>", escape_xml(label));
                }
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn push_opacity(svg: &mut String, attr: &str, opacity: f64) {
    if opacity < 1.0 {
        let _ = write!(svg, r#" {attr}="{opacity:.3}""#);
    }
}

fn push_border(svg: &mut String, border: Option<ThemeToken>) {
    if let Some(token) = border {
        let (stroke, opacity) = resolve_color(token);
        let _ = write!(svg, r#" stroke="{stroke}" stroke-width="1""#);
        push_opacity(svg, "stroke-opacity", opacity);
    }
}

/// Export palette: hex color plus opacity.
fn resolve_color(token: ThemeToken) -> (&'static str, f64) {
    match token {
        ThemeToken::MapBackground => ("#F3F4F6", 1.0),
        ThemeToken::RoadOutline => ("#0B0F14", 1.0),
        ThemeToken::RoadShoulder => ("#2A2F36", 1.0),
        ThemeToken::RoadSurface | ThemeToken::Wheel => ("#111827", 1.0),
        ThemeToken::RoadInternal => ("#1F2937", 1.0),
        ThemeToken::LaneMarking => ("#FFFFFF", 180.0 / 255.0),
        ThemeToken::SignalFill => ("#FFFFFF", 220.0 / 255.0),
        ThemeToken::LabelBackground => ("#FFFFFF", 200.0 / 255.0),
        ThemeToken::SignalBorder | ThemeToken::LabelBorder | ThemeToken::LabelText => {
            ("#111827", 220.0 / 255.0)
        }
        ThemeToken::VehicleShadow => ("#000000", 70.0 / 255.0),
        ThemeToken::CarBody => ("#FB923C", 1.0),
        ThemeToken::TruckBody => ("#94A3B8", 1.0),
        ThemeToken::TruckCargo => ("#FDE68A", 1.0),
        ThemeToken::BusBody => ("#FACC15", 1.0),
        ThemeToken::ChartBackground => ("#0B1220", 1.0),
        ThemeToken::ChartBorder => ("#FFFFFF", 40.0 / 255.0),
        ThemeToken::ChartText => ("#FFFFFF", 120.0 / 255.0),
        ThemeToken::SeriesWait => ("#22C55E", 170.0 / 255.0),
        ThemeToken::SeriesThroughput => ("#3B82F6", 170.0 / 255.0),
        ThemeToken::SeriesCongestion => ("#EF4444", 170.0 / 255.0),
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
