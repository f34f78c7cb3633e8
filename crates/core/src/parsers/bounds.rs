use roxmltree::Document;
use tracing::warn;

use super::{NetworkError, parse_document, parse_f64};
use crate::model::Bounds;

/// Read the network extent from `<location convBoundary="minX,minY,maxX,maxY">`.
///
/// Any malformed coordinate invalidates the whole attempt: the result is
/// `None`, never a partially filled extent. A well-formed but degenerate
/// boundary is returned as-is; callers check [`Bounds::sane`].
pub fn parse_bounds(data: &[u8]) -> Option<Bounds> {
    let result = parse_document(data).and_then(|doc| bounds_from(&doc));
    match result {
        Ok(b) => Some(b),
        Err(e) => {
            warn!("failed reading convBoundary: {e}");
            None
        }
    }
}

pub(crate) fn bounds_from(doc: &Document<'_>) -> Result<Bounds, NetworkError> {
    let location = doc
        .descendants()
        .find(|n| n.has_tag_name("location"))
        .ok_or(NetworkError::MissingElement("location"))?;
    let raw = location
        .attribute("convBoundary")
        .filter(|s| !s.trim().is_empty())
        .ok_or(NetworkError::MissingElement("location convBoundary"))?;
    parse_boundary(raw)
}

fn parse_boundary(raw: &str) -> Result<Bounds, NetworkError> {
    let parts: Vec<&str> = raw.split(',').collect();
    let [min_x, min_y, max_x, max_y] = parts.as_slice() else {
        return Err(NetworkError::MalformedField {
            field: "convBoundary",
            value: raw.to_string(),
        });
    };
    Ok(Bounds::new(
        parse_f64("convBoundary", min_x)?,
        parse_f64("convBoundary", min_y)?,
        parse_f64("convBoundary", max_x)?,
        parse_f64("convBoundary", max_y)?,
    ))
}
