use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::model::{Bounds, LaneGeometry, LaneParsePolicy, SignalLabels, SignalPositions};
use crate::parsers;

/// Immutable result of parsing one network description.
///
/// Shared read-only between the renderer and its collaborators. A new
/// network is published by building a whole new snapshot and swapping it
/// into a [`NetworkStore`], never by editing one in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Always sane: padded parse result or the fallback extent.
    pub bounds: Bounds,
    pub lanes: Vec<LaneGeometry>,
    pub signal_positions: SignalPositions,
    pub signal_labels: SignalLabels,
    /// File this snapshot was parsed from, if any.
    pub source: Option<PathBuf>,
}

impl NetworkSnapshot {
    /// A snapshot with the fallback extent and no geometry.
    pub fn empty() -> Self {
        Self {
            bounds: Bounds::FALLBACK,
            lanes: Vec::new(),
            signal_positions: SignalPositions::new(),
            signal_labels: SignalLabels::new(),
            source: None,
        }
    }

    /// Display label for a signal, falling back to its raw id.
    pub fn signal_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.signal_labels.get(id).map_or(id, String::as_str)
    }

    /// `(id, label)` pairs in label-rank order (`t1`, `t2`, …).
    pub fn signal_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .signal_labels
            .iter()
            .map(|(id, label)| (id.as_str(), label.as_str()))
            .collect();
        entries.sort_by_key(|(_, label)| label_rank(label));
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty() && self.signal_positions.is_empty()
    }
}

impl Default for NetworkSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

fn label_rank(label: &str) -> u64 {
    label
        .strip_prefix('t')
        .and_then(|n| n.parse().ok())
        .unwrap_or(u64::MAX)
}

/// Publication point for the current [`NetworkSnapshot`].
///
/// Readers clone the inner `Arc` once per frame and keep a consistent
/// network for the whole frame even if a reload lands mid-draw.
#[derive(Debug, Default)]
pub struct NetworkStore {
    current: RwLock<Arc<NetworkSnapshot>>,
}

impl NetworkStore {
    pub fn new(snapshot: NetworkSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot published most recently.
    pub fn current(&self) -> Arc<NetworkSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Atomically replace the published snapshot.
    pub fn replace(&self, snapshot: NetworkSnapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }

    /// Re-parse `net_path` and publish the result. Parsing happens before
    /// the lock is taken so readers are never blocked on file IO.
    pub fn reload(&self, net_path: &Path, policy: LaneParsePolicy) -> Arc<NetworkSnapshot> {
        let snapshot = Arc::new(parsers::load_network(net_path, policy));
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&snapshot);
        snapshot
    }
}
