use roadview_protocol::Point;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

use super::{NetworkError, is_internal_edge, parse_document, parse_f64};
use crate::model::lane::DEFAULT_LANE_WIDTH;
use crate::model::{LaneGeometry, LaneParsePolicy};

/// Extract every lane shape from a network description.
///
/// Lanes whose shape has fewer than two valid points are dropped. A missing
/// or unparsable `width` falls back to 3.2 m and a missing or unparsable
/// `index` to 0, without discarding the lane.
pub fn parse_lane_geometries(data: &[u8], policy: LaneParsePolicy) -> Vec<LaneGeometry> {
    match parse_document(data) {
        Ok(doc) => lanes_from(&doc, policy),
        Err(e) => {
            warn!("road geometry load failed, continuing without roads: {e}");
            Vec::new()
        }
    }
}

pub(crate) fn lanes_from(doc: &Document<'_>, policy: LaneParsePolicy) -> Vec<LaneGeometry> {
    let mut out = Vec::new();

    for edge in doc.descendants().filter(|n| n.has_tag_name("edge")) {
        let edge_id = edge.attribute("id").unwrap_or_default();
        let internal = is_internal_edge(edge_id, edge.attribute("function"));
        if internal && !policy.include_internal {
            continue;
        }

        for lane in edge.descendants().filter(|n| n.has_tag_name("lane")) {
            if !policy.include_all_lanes && !is_first_lane(&lane) {
                continue;
            }

            let Some(shape) = lane.attribute("shape").filter(|s| !s.trim().is_empty()) else {
                continue;
            };
            let points = parse_shape(shape);
            if points.len() < 2 {
                debug!("skipping lane of edge {edge_id:?}: fewer than two valid points");
                continue;
            }

            out.push(LaneGeometry {
                edge_id: edge_id.to_string(),
                lane_index: lane_index(&lane),
                internal,
                width_meters: lane_width(&lane),
                points,
            });
        }
    }

    out
}

/// Parse a whitespace-separated list of `x,y` pairs. Pairs that do not have
/// exactly two finite components are skipped.
pub fn parse_shape(shape: &str) -> Vec<Point> {
    shape
        .split_whitespace()
        .filter_map(|pair| {
            let (x, y) = pair.split_once(',')?;
            if y.contains(',') {
                return None;
            }
            let p = Point::new(x.parse().ok()?, y.parse().ok()?);
            p.is_finite().then_some(p)
        })
        .collect()
}

/// A lane is "first" unless it declares a non-zero index.
fn is_first_lane(lane: &Node<'_, '_>) -> bool {
    match lane.attribute("index").map(str::trim) {
        Some(idx) if !idx.is_empty() => idx == "0",
        _ => true,
    }
}

fn lane_width(lane: &Node<'_, '_>) -> f64 {
    let Some(raw) = lane.attribute("width").filter(|s| !s.trim().is_empty()) else {
        return DEFAULT_LANE_WIDTH;
    };
    match parse_f64("width", raw) {
        Ok(w) if w.is_finite() && w > 0.0 => w,
        Ok(_) => {
            debug!("non-positive lane width {raw:?}, using default");
            DEFAULT_LANE_WIDTH
        }
        Err(e) => {
            debug!("{e}, using default");
            DEFAULT_LANE_WIDTH
        }
    }
}

fn lane_index(lane: &Node<'_, '_>) -> u32 {
    let Some(raw) = lane.attribute("index").filter(|s| !s.trim().is_empty()) else {
        return 0;
    };
    raw.trim().parse::<u32>().unwrap_or_else(|_| {
        debug!(
            "{}, using 0",
            NetworkError::MalformedField {
                field: "index",
                value: raw.to_string(),
            }
        );
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(body: &str) -> Vec<u8> {
        format!(r#"<?xml version="1.0"?><net>{body}</net>"#).into_bytes()
    }

    #[test]
    fn lane_without_width_uses_default() {
        let data = net(r#"<edge id="e1"><lane id="e1_0" shape="0,0 10,0 10,10"/></edge>"#);
        let lanes = parse_lane_geometries(&data, LaneParsePolicy::default());
        assert_eq!(lanes.len(), 1);
        let lane = &lanes[0];
        assert_eq!(lane.points.len(), 3);
        assert_eq!(lane.points[2], Point::new(10.0, 10.0));
        assert!((lane.width_meters - 3.2).abs() < f64::EPSILON);
        assert_eq!(lane.lane_index, 0);
        assert_eq!(lane.edge_id, "e1");
        assert!(!lane.internal);
    }

    #[test]
    fn unparsable_shape_excludes_lane() {
        let data = net(r#"<edge id="e1"><lane shape="abc"/><lane shape="1,1"/></edge>"#);
        assert!(parse_shape("abc").is_empty());
        assert!(parse_lane_geometries(&data, LaneParsePolicy::default()).is_empty());
    }

    #[test]
    fn bad_pairs_are_skipped_individually() {
        let pts = parse_shape("0,0 x,1 2,2,2 3,3 4,nan 5,5");
        assert_eq!(
            pts,
            vec![Point::new(0.0, 0.0), Point::new(3.0, 3.0), Point::new(5.0, 5.0)]
        );
    }

    #[test]
    fn bad_width_and_index_fall_back_without_dropping_lane() {
        let data = net(
            r#"<edge id="e1">
                <lane index="two" width="wide" shape="0,0 1,1"/>
                <lane index="-1" width="-3" shape="0,0 1,1"/>
                <lane index=" 2 " width=" 4.5 " shape="0,0 1,1"/>
            </edge>"#,
        );
        let lanes = parse_lane_geometries(&data, LaneParsePolicy::default());
        assert_eq!(lanes.len(), 3);
        assert_eq!((lanes[0].lane_index, lanes[0].width_meters), (0, 3.2));
        assert_eq!((lanes[1].lane_index, lanes[1].width_meters), (0, 3.2));
        assert_eq!((lanes[2].lane_index, lanes[2].width_meters), (2, 4.5));
    }

    #[test]
    fn internal_classification_and_policy() {
        let data = net(
            r#"<edge id=":j1_0" function="internal"><lane index="0" shape="0,0 1,0"/></edge>
               <edge id="c1" function="INTERNAL"><lane index="0" shape="0,0 1,0"/></edge>
               <edge id="e1"><lane index="0" shape="0,0 9,0"/><lane index="1" shape="0,3 9,3"/></edge>"#,
        );

        let all = parse_lane_geometries(&data, LaneParsePolicy::default());
        assert_eq!(all.len(), 4);
        assert!(all[0].internal && all[1].internal);
        assert!(!all[2].internal);

        let no_internal = parse_lane_geometries(
            &data,
            LaneParsePolicy {
                include_internal: false,
                include_all_lanes: true,
            },
        );
        assert_eq!(no_internal.len(), 2);
        assert!(no_internal.iter().all(|l| l.edge_id == "e1"));

        let first_only = parse_lane_geometries(
            &data,
            LaneParsePolicy {
                include_internal: true,
                include_all_lanes: false,
            },
        );
        assert_eq!(first_only.len(), 3);
        assert!(first_only.iter().all(|l| l.lane_index == 0));
    }

    #[test]
    fn keeps_document_order() {
        let data = net(
            r#"<edge id="b"><lane shape="0,0 1,0"/></edge>
               <edge id="a"><lane shape="0,0 1,0"/></edge>
               <edge id="c"><lane shape="0,0 1,0"/></edge>"#,
        );
        let ids: Vec<String> = parse_lane_geometries(&data, LaneParsePolicy::default())
            .into_iter()
            .map(|l| l.edge_id)
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn malformed_document_yields_no_lanes() {
        assert!(parse_lane_geometries(b"<net><edge>", LaneParsePolicy::default()).is_empty());
    }
}
