use anyhow::Context;
use std::path::Path;
use tracing::info;

use super::provider::{Manifest, StaticMetadata};

/// Parse a YAML manifest.
pub fn manifest_from_yaml_str(content: &str) -> anyhow::Result<StaticMetadata> {
    let manifest: Manifest = serde_yaml::from_str(content)?;
    Ok(StaticMetadata::from_manifest(manifest))
}

/// Parse a JSON manifest.
pub fn manifest_from_json_str(content: &str) -> anyhow::Result<StaticMetadata> {
    let manifest: Manifest = serde_json::from_str(content)?;
    Ok(StaticMetadata::from_manifest(manifest))
}

/// Load a controller manifest from disk.
///
/// `.yaml`/`.yml` files are parsed as YAML, anything else as JSON.
pub fn load_manifest(path: impl AsRef<Path>) -> anyhow::Result<StaticMetadata> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let meta = if is_yaml {
        manifest_from_yaml_str(&content)
    } else {
        manifest_from_json_str(&content)
    }
    .with_context(|| format!("failed to parse manifest {}", path.display()))?;

    info!(
        manifest = %path.display(),
        controllers = meta.len(),
        "Controller manifest loaded"
    );
    Ok(meta)
}
