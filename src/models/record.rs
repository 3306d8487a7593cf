//! Persisted site rows and their opaque payloads.

use super::{SiteId, VariantId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Site configuration blob.
///
/// The core only reads `variant_id` and `external`; everything else a
/// variant stores here is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Which built-in variant backs this site.
    #[serde(rename = "classId")]
    pub variant_id: VariantId,
    /// Whether the site was defined outside the built-in set.
    #[serde(default)]
    pub external: bool,
    /// Variant-owned fields, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SiteConfig {
    /// Config for a built-in variant created by the user.
    #[must_use]
    pub fn for_variant(variant_id: VariantId) -> Self {
        Self {
            variant_id,
            external: false,
            extra: serde_json::Map::new(),
        }
    }
}

/// Opaque per-site user settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSettings(serde_json::Map<String, serde_json::Value>);

impl UserSettings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a setting value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Sets a setting value, returning the previous one.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.0.insert(key.into(), value)
    }

    /// Sets a value only when the key is absent.
    pub fn set_default(&mut self, key: &str, value: serde_json::Value) {
        self.0.entry(key.to_string()).or_insert(value);
    }

    /// Returns a boolean setting, if present and boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(serde_json::Value::as_bool)
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for UserSettings {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

/// A site row that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSiteRecord {
    /// Config blob.
    pub config: SiteConfig,
    /// User settings blob.
    pub user_settings: UserSettings,
}

/// A persisted site row.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    /// Gateway-assigned key.
    pub id: SiteId,
    /// Config blob.
    pub config: SiteConfig,
    /// User settings blob.
    pub user_settings: UserSettings,
}

impl SiteRecord {
    /// Returns the variant this record instantiates.
    #[must_use]
    pub const fn variant_id(&self) -> VariantId {
        self.config.variant_id
    }
}

/// Persisted display order: site ID to rank, lower ranks first.
pub type Ordering = HashMap<SiteId, u32>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_preserves_unknown_fields() {
        let raw = r#"{"classId":3,"external":false,"domain":"example.org"}"#;
        let config: SiteConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.variant_id, VariantId::new(3));
        assert_eq!(config.extra.get("domain"), Some(&json!("example.org")));

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["domain"], json!("example.org"));
        assert_eq!(back["classId"], json!(3));
    }

    #[test]
    fn test_config_external_defaults_false() {
        let config: SiteConfig = serde_json::from_str(r#"{"classId":0}"#).unwrap();
        assert!(!config.external);
    }

    #[test]
    fn test_settings_set_default_keeps_existing() {
        let mut settings = UserSettings::new();
        settings.set("last_board", json!("g"));
        settings.set_default("last_board", json!("a"));
        settings.set_default("enabled", json!(true));

        assert_eq!(settings.get("last_board"), Some(&json!("g")));
        assert_eq!(settings.get_bool("enabled"), Some(true));
        assert_eq!(settings.len(), 2);
    }
}
