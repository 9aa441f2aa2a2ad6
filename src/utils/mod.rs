//! Shared utilities

pub mod logger;

use std::path::Path;

/// Whether a path names a YAML document; everything else is read as JSON
pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "YAML" | "YML")
    )
}
