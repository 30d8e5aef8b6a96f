//! Loading JSON inputs and platform configuration.

use std::fs;
use std::path::Path;

use anyhow::Context;
use pgplatform_core::PlatformConfig;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Reads and deserializes a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), "loaded input");
    Ok(value)
}

/// Builds the platform configuration from an optional JSON file, then
/// applies command-line overrides.
pub fn load_config(path: Option<&Path>, boolean_strings: Option<bool>) -> anyhow::Result<PlatformConfig> {
    let mut config = match path {
        Some(path) => read_json(path)?,
        None => PlatformConfig::default(),
    };
    if let Some(flag) = boolean_strings {
        config = config.boolean_strings(flag);
    }
    Ok(config)
}

/// Renders statements one per line, each terminated by `;`.
pub fn render_statements(statements: &[String]) -> String {
    statements
        .iter()
        .map(|s| format!("{s};\n"))
        .collect()
}
