pub mod bounds;
pub mod lanes;
pub mod signals;
pub mod sumocfg;

use std::path::{Path, PathBuf};

use roxmltree::{Document, ParsingOptions};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{Bounds, LaneParsePolicy, NetworkSnapshot, label_signals};

pub use bounds::parse_bounds;
pub use lanes::{parse_lane_geometries, parse_shape};
pub use signals::parse_signal_positions;
pub use sumocfg::{DEFAULT_NET_FILE, net_file_from_config, network_path_from_config, resolve_net_path};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("cannot read {}: {source}", path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] roxmltree::Error),
    #[error("malformed `{field}` value {value:?}")]
    MalformedField { field: &'static str, value: String },
    #[error("missing <{0}>")]
    MissingElement(&'static str),
    #[error("bounds {0:?} have no positive extent")]
    InsaneBounds(Bounds),
}

/// Read a source file into memory.
pub fn read_source(path: &Path) -> Result<Vec<u8>, NetworkError> {
    std::fs::read(path).map_err(|source| NetworkError::FileUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse raw bytes into an XML document.
///
/// DTDs are rejected outright, so a network file can never make the parser
/// resolve an external entity or fetch an external DTD.
pub fn parse_document(data: &[u8]) -> Result<Document<'_>, NetworkError> {
    let text = std::str::from_utf8(data)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut options = ParsingOptions::default();
    options.allow_dtd = false;
    Ok(Document::parse_with_options(text, options)?)
}

/// Parse a network description file into a complete snapshot.
///
/// Never fails: an unreadable or malformed file is logged and yields
/// [`NetworkSnapshot::empty`]. The file is read and parsed once and bounds,
/// lanes and signals are all extracted from the same document.
pub fn load_network(path: &Path, policy: LaneParsePolicy) -> NetworkSnapshot {
    let data = match read_source(path) {
        Ok(data) => data,
        Err(e) => {
            warn!("network unavailable, rendering empty map: {e}");
            return NetworkSnapshot::empty();
        }
    };
    let mut snapshot = network_from_bytes(&data, policy);
    snapshot.source = Some(path.to_path_buf());
    info!(
        "network loaded from {}: {} lane shapes, {} signals",
        path.display(),
        snapshot.lanes.len(),
        snapshot.signal_positions.len(),
    );
    snapshot
}

/// Build a snapshot from an in-memory network description.
///
/// Bounds that parse but have no positive extent are replaced by
/// [`Bounds::FALLBACK`]. Lanes and signals from the same document are still
/// loaded; they are drawn against the −100..100 fallback extent, so geometry
/// far from the origin can land off-panel.
pub fn network_from_bytes(data: &[u8], policy: LaneParsePolicy) -> NetworkSnapshot {
    let doc = match parse_document(data) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("network description rejected, rendering empty map: {e}");
            return NetworkSnapshot::empty();
        }
    };

    let parsed = match bounds::bounds_from(&doc) {
        Ok(b) if b.sane() => Some(b),
        Ok(b) => {
            warn!("{}; using fallback extent", NetworkError::InsaneBounds(b));
            None
        }
        Err(e) => {
            warn!("no usable convBoundary ({e}); using fallback extent");
            None
        }
    };

    let lanes = lanes::lanes_from(&doc, policy);
    let signal_positions = signals::signals_from(&doc);
    let signal_labels = label_signals(signal_positions.keys().map(String::as_str));

    NetworkSnapshot {
        bounds: Bounds::resolve(parsed),
        lanes,
        signal_positions,
        signal_labels,
        source: None,
    }
}

/// Parse a float attribute value, reporting the field name on failure.
pub(crate) fn parse_f64(field: &'static str, raw: &str) -> Result<f64, NetworkError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| NetworkError::MalformedField {
            field,
            value: raw.to_string(),
        })
}

/// Whether an edge is a junction-internal connector.
pub(crate) fn is_internal_edge(id: &str, function: Option<&str>) -> bool {
    id.starts_with(':') || function.is_some_and(|f| f.trim().eq_ignore_ascii_case("internal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<net version="1.16">
    <location netOffset="0.00,0.00" convBoundary="0.00,0.00,100.00,50.00"/>
    <edge id=":j1_0" function="internal">
        <lane id=":j1_0_0" index="0" speed="13.89" length="4.0" shape="48.0,25.0 52.0,25.0"/>
    </edge>
    <edge id="e1" from="j0" to="j1" priority="1">
        <lane id="e1_0" index="0" speed="13.89" length="48.0" width="3.5" shape="0.0,25.0 48.0,25.0"/>
        <lane id="e1_1" index="1" speed="13.89" length="48.0" shape="0.0,28.2 48.0,28.2"/>
    </edge>
    <tlLogic id="j1" type="static" programID="0" offset="0">
        <phase duration="42" state="GGrr"/>
    </tlLogic>
    <junction id="j0" type="dead_end" x="0.00" y="25.00"/>
    <junction id="j1" type="traffic_light" x="50.00" y="25.00"/>
    <connection from="e1" to="e2" fromLane="0" toLane="0" tl="j1" linkIndex="0"/>
</net>
"#;

    #[test]
    fn builds_complete_snapshot() {
        let snap = network_from_bytes(NET, LaneParsePolicy::default());
        assert!(snap.bounds.sane());
        assert!((snap.bounds.min_x + 3.0).abs() < 1e-9);
        assert!((snap.bounds.max_y - 51.5).abs() < 1e-9);
        assert_eq!(snap.lanes.len(), 3);
        assert_eq!(snap.signal_positions.len(), 1);
        assert_eq!(snap.signal_labels["j1"], "t1");
    }

    #[test]
    fn malformed_xml_yields_empty_snapshot() {
        let snap = network_from_bytes(b"<net><edge id=\"e1\">", LaneParsePolicy::default());
        assert!(snap.is_empty());
        assert_eq!(snap.bounds, Bounds::FALLBACK);
    }

    #[test]
    fn dtd_declarations_are_rejected() {
        let hostile = br#"<?xml version="1.0"?>
<!DOCTYPE net [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<net><location convBoundary="0,0,10,10"/><edge id="&xxe;"/></net>"#;
        assert!(matches!(
            parse_document(hostile),
            Err(NetworkError::MalformedDocument(_))
        ));
        let snap = network_from_bytes(hostile, LaneParsePolicy::default());
        assert!(snap.is_empty());
    }

    #[test]
    fn insane_bounds_keep_geometry_but_use_fallback() {
        let data = br#"<net>
            <location convBoundary="10,10,10,20"/>
            <edge id="e1"><lane index="0" shape="0,0 5,5"/></edge>
            <edge id="far"><lane index="0" shape="500,500 600,500"/></edge>
        </net>"#;
        let snap = network_from_bytes(data, LaneParsePolicy::default());
        assert_eq!(snap.bounds, Bounds::FALLBACK);
        assert_eq!(snap.lanes.len(), 2);
        // Kept even though it lies outside the extent it is drawn against.
        let far = &snap.lanes[1];
        assert_eq!(far.edge_id, "far");
        assert!(far.points.iter().all(|p| p.x > Bounds::FALLBACK.max_x));
    }

    #[test]
    fn missing_file_is_reported_as_unavailable() {
        let err = read_source(Path::new("/nonexistent/roadview/net.xml"));
        assert!(matches!(err, Err(NetworkError::FileUnavailable { .. })));
        let snap = load_network(
            Path::new("/nonexistent/roadview/net.xml"),
            LaneParsePolicy::default(),
        );
        assert!(snap.is_empty());
        assert!(snap.source.is_none());
    }

    #[test]
    fn internal_edge_detection() {
        assert!(is_internal_edge(":j1_0", None));
        assert!(is_internal_edge("c1", Some("Internal")));
        assert!(!is_internal_edge("e1", Some("normal")));
        assert!(!is_internal_edge("e1", None));
    }
}
