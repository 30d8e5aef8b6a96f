//! Construction-time platform configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::LogicalType;

/// Settings fixed when a [`PostgresPlatform`](crate::PostgresPlatform) is
/// built. The platform exposes no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Encode boolean literals as `'true'`/`'false'` instead of `1`/`0`.
    pub use_boolean_true_false_strings: bool,
    /// Additional native spellings recognised by the type map.
    pub extra_type_mappings: BTreeMap<String, LogicalType>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            use_boolean_true_false_strings: true,
            extra_type_mappings: BTreeMap::new(),
        }
    }
}

impl PlatformConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the boolean literal encoding.
    #[must_use]
    pub fn boolean_strings(mut self, enabled: bool) -> Self {
        self.use_boolean_true_false_strings = enabled;
        self
    }

    /// Registers an extra native spelling.
    #[must_use]
    pub fn type_mapping(mut self, native: impl Into<String>, logical: LogicalType) -> Self {
        self.extra_type_mappings.insert(native.into(), logical);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_boolean_strings() {
        let config = PlatformConfig::new();
        assert!(config.use_boolean_true_false_strings);
        assert!(config.extra_type_mappings.is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PlatformConfig =
            serde_json::from_str(r#"{"extra_type_mappings": {"citext": "text"}}"#).unwrap();
        assert!(config.use_boolean_true_false_strings);
        assert_eq!(config.extra_type_mappings.get("citext"), Some(&LogicalType::Text));
    }

    #[test]
    fn test_builder() {
        let config = PlatformConfig::new()
            .boolean_strings(false)
            .type_mapping("ltree", LogicalType::Text);
        assert!(!config.use_boolean_true_false_strings);
        assert_eq!(config.extra_type_mappings.len(), 1);
    }
}
