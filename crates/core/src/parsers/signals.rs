use std::collections::HashMap;

use roadview_protocol::Point;
use roxmltree::Document;
use tracing::warn;

use super::{is_internal_edge, parse_document, parse_f64};
use crate::model::SignalPositions;

/// Locate every traffic signal in a network description.
///
/// A signal sits at the junction its controlled connections lead into:
/// the `to` junction of the first connection's `from` edge wins. Signal
/// programs not reached through any connection fall back to treating the
/// program id as a junction id. Signals with no resolvable junction
/// position are omitted.
pub fn parse_signal_positions(data: &[u8]) -> SignalPositions {
    match parse_document(data) {
        Ok(doc) => signals_from(&doc),
        Err(e) => {
            warn!("failed to load signal positions: {e}");
            SignalPositions::new()
        }
    }
}

pub(crate) fn signals_from(doc: &Document<'_>) -> SignalPositions {
    let junctions = junction_positions(doc);
    let edge_targets = edge_destinations(doc);

    let mut signal_junction: HashMap<String, String> = HashMap::new();
    for conn in doc.descendants().filter(|n| n.has_tag_name("connection")) {
        let Some(tl) = non_blank(conn.attribute("tl")) else {
            continue;
        };
        let Some(junction) = non_blank(conn.attribute("from")).and_then(|e| edge_targets.get(e))
        else {
            continue;
        };
        signal_junction
            .entry(tl.to_string())
            .or_insert_with(|| junction.clone());
    }

    for logic in doc.descendants().filter(|n| n.has_tag_name("tlLogic")) {
        if let Some(id) = non_blank(logic.attribute("id")) {
            signal_junction
                .entry(id.to_string())
                .or_insert_with(|| id.to_string());
        }
    }

    signal_junction
        .into_iter()
        .filter_map(|(signal, junction)| {
            let pos = junctions
                .get(junction.as_str())
                .or_else(|| junctions.get(signal.as_str()))?;
            Some((signal, *pos))
        })
        .collect()
}

fn junction_positions<'a>(doc: &'a Document<'_>) -> HashMap<&'a str, Point> {
    doc.descendants()
        .filter(|n| n.has_tag_name("junction"))
        .filter_map(|j| {
            let id = non_blank(j.attribute("id"))?;
            let x = parse_f64("x", j.attribute("x")?).ok()?;
            let y = parse_f64("y", j.attribute("y")?).ok()?;
            Some((id, Point::new(x, y)))
        })
        .collect()
}

/// Non-internal edge id → id of the junction the edge leads into.
fn edge_destinations<'a>(doc: &'a Document<'_>) -> HashMap<&'a str, String> {
    doc.descendants()
        .filter(|n| n.has_tag_name("edge"))
        .filter_map(|e| {
            let id = non_blank(e.attribute("id"))?;
            if is_internal_edge(id, e.attribute("function")) {
                return None;
            }
            let to = non_blank(e.attribute("to"))?;
            Some((id, to.to_string()))
        })
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(body: &str) -> Vec<u8> {
        format!("<net>{body}</net>").into_bytes()
    }

    #[test]
    fn connection_resolves_through_from_edge_destination() {
        let data = net(
            r#"<edge id="e1" from="j0" to="j1"/>
               <junction id="j0" x="0" y="0"/>
               <junction id="j1" x="5" y="5"/>
               <connection from="e1" to="e2" tl="X"/>"#,
        );
        let positions = parse_signal_positions(&data);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions["X"], Point::new(5.0, 5.0));
    }

    #[test]
    fn first_connection_per_signal_wins() {
        let data = net(
            r#"<edge id="a" to="ja"/><edge id="b" to="jb"/>
               <junction id="ja" x="1" y="1"/><junction id="jb" x="2" y="2"/>
               <connection from="a" tl="S"/>
               <connection from="b" tl="S"/>"#,
        );
        assert_eq!(parse_signal_positions(&data)["S"], Point::new(1.0, 1.0));
    }

    #[test]
    fn program_without_connections_falls_back_to_junction_id() {
        let data = net(
            r#"<tlLogic id="j7" type="static" programID="0" offset="0"/>
               <tlLogic id="ghost" type="static" programID="0" offset="0"/>
               <junction id="j7" x="70" y="-7"/>"#,
        );
        let positions = parse_signal_positions(&data);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions["j7"], Point::new(70.0, -7.0));
    }

    #[test]
    fn internal_edges_do_not_resolve_signals() {
        let data = net(
            r#"<edge id=":j1_0" function="internal" to="j1"/>
               <junction id="j1" x="5" y="5"/>
               <connection from=":j1_0" tl="X"/>"#,
        );
        assert!(parse_signal_positions(&data).is_empty());
    }

    #[test]
    fn unresolved_junction_falls_back_to_signal_id_position() {
        let data = net(
            r#"<edge id="e1" to="nowhere"/>
               <junction id="X" x="3" y="4"/>
               <connection from="e1" tl="X"/>"#,
        );
        assert_eq!(parse_signal_positions(&data)["X"], Point::new(3.0, 4.0));
    }

    #[test]
    fn junctions_with_bad_coordinates_are_skipped() {
        let data = net(
            r#"<edge id="e1" to="j1"/>
               <junction id="j1" x="five" y="5"/>
               <connection from="e1" tl="X"/>"#,
        );
        assert!(parse_signal_positions(&data).is_empty());
    }

    #[test]
    fn malformed_document_yields_empty_map() {
        assert!(parse_signal_positions(b"<net").is_empty());
    }
}
