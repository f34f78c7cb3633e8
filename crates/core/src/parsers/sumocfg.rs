use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{parse_document, read_source};

/// Network file assumed when the configuration does not name one.
pub const DEFAULT_NET_FILE: &str = "final.net.xml";

/// Read the `value` of the first `<net-file>` element of a simulation
/// configuration document.
pub fn net_file_from_config(data: &[u8]) -> Option<String> {
    let doc = match parse_document(data) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("failed reading net-file from configuration: {e}");
            return None;
        }
    };
    doc.descendants()
        .find(|n| n.has_tag_name("net-file"))
        .and_then(|n| n.attribute("value"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Resolve the network file named by a configuration document.
///
/// Absolute paths are used as-is. Relative paths are tried against the
/// configuration file's directory first, then the working directory. When
/// neither exists the configuration-relative candidate is returned, so the
/// subsequent load reports the path the user most likely meant.
pub fn resolve_net_path(config_path: &Path, value: Option<&str>) -> PathBuf {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(DEFAULT_NET_FILE);
    let named = PathBuf::from(value);
    if named.is_absolute() {
        return named;
    }

    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let beside_config = base.join(&named);
    if beside_config.exists() {
        return beside_config;
    }
    if named.exists() {
        return named;
    }
    debug!(
        "network file {} not found beside {} or in the working directory",
        value,
        config_path.display()
    );
    beside_config
}

/// Network path for a configuration file. Never fails: an unreadable
/// configuration resolves the default file name.
pub fn network_path_from_config(config_path: &Path) -> PathBuf {
    let value = match read_source(config_path) {
        Ok(data) => net_file_from_config(&data),
        Err(e) => {
            warn!("{e}; assuming {DEFAULT_NET_FILE}");
            None
        }
    };
    resolve_net_path(config_path, value.as_deref())
}
