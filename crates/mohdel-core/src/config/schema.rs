//! Configuration schema.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default HTTP request timeout for vendor calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.mohdel/config.json` + env vars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Model used when a caller does not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Curated catalog file (defaults to `~/.mohdel/curated.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
    /// Per-provider connection overrides, keyed by provider name.
    pub providers: HashMap<String, ProviderSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_model: None,
            catalog_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            providers: HashMap::new(),
        }
    }
}

impl Config {
    /// Configured API base for a provider, if overridden.
    pub fn api_base(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_base.as_deref())
            .filter(|b| !b.is_empty())
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Connection overrides for a single provider.
///
/// Secrets never live here; they come from the provider's env var.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// Custom API base URL (overrides the registry default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 120);
        assert!(config.default_model.is_none());
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_api_base_lookup() {
        let config: Config = serde_json::from_str(
            r#"{"providers": {"xai": {"apiBase": "https://proxy.local/v1"}, "groq": {"apiBase": ""}}}"#,
        )
        .unwrap();
        assert_eq!(config.api_base("xai"), Some("https://proxy.local/v1"));
        assert_eq!(config.api_base("groq"), None);
        assert_eq!(config.api_base("openai"), None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut config = Config::default();
        config.default_model = Some("openai/o3".into());
        let raw = serde_json::to_value(&config).unwrap();
        assert_eq!(raw["defaultModel"], "openai/o3");
        assert!(raw.get("timeoutSecs").is_some());
        assert!(raw.get("default_model").is_none());
    }
}
