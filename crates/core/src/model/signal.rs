use std::collections::BTreeMap;

use roadview_protocol::Point;

/// Signal id → world position of the junction it controls.
pub type SignalPositions = BTreeMap<String, Point>;

/// Signal id → short display tag (`t1`, `t2`, …).
pub type SignalLabels = BTreeMap<String, String>;

/// Assign deterministic short labels to signal ids.
///
/// Ids are de-duplicated and sorted lexicographically, then tagged
/// `"t" + rank` (1-based), so the result depends only on the set of ids and
/// never on the order they were discovered in.
pub fn label_signals<'a, I>(ids: I) -> SignalLabels
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = ids.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), format!("t{}", i + 1)))
        .collect()
}
