//! Provider registry: static specs for every supported vendor.
//!
//! Each `ProviderSpec` describes how to reach one vendor: the env var that
//! holds its key, the default API base, which adapter family speaks its wire
//! format, and how to read its errors. The dispatcher receives a
//! [`ProviderRegistry`] at construction; nothing reads [`PROVIDERS`] behind
//! its back.

use std::collections::HashMap;
use std::fmt;

use mohdel_core::config::Config;

use crate::errors::{interpret_anthropic, interpret_gemini, interpret_openai, InterpretFn};

// ─────────────────────────────────────────────
// Adapter kinds
// ─────────────────────────────────────────────

/// Closed set of vendor request-shape families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Single-turn message arrays (`/v1/messages`).
    Messages,
    /// Structured input/output objects (`/responses`).
    Responses,
    /// OpenAI-compatible `/chat/completions`.
    Chat,
    /// `:generateContent` with style-driven sampling.
    Generation,
}

impl AdapterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AdapterKind::Messages => "messages",
            AdapterKind::Responses => "responses",
            AdapterKind::Chat => "chat",
            AdapterKind::Generation => "generation",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one vendor.
#[derive(Clone, Copy)]
pub struct ProviderSpec {
    /// Internal name, the prefix of canonical ids (e.g. `"anthropic"`).
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"Anthropic"`.
    pub display_name: &'static str,
    /// Environment variable holding the API key. E.g. `"ANTHROPIC_API_SK"`.
    pub env_key: &'static str,
    /// Wire family used to talk to this vendor.
    pub adapter: AdapterKind,
    /// Default API base URL, without trailing slash.
    pub default_api_base: &'static str,
    /// Name of the generated-token cap in the request body. The chat
    /// adapter writes its cap under this name; the other families send a
    /// fixed field and the entry here records it for `mohdel status`.
    pub budget_field: &'static str,
    /// Vendor error envelope → message + retry class.
    pub interpret_error: InterpretFn,
}

impl fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("name", &self.name)
            .field("env_key", &self.env_key)
            .field("adapter", &self.adapter)
            .field("default_api_base", &self.default_api_base)
            .field("budget_field", &self.budget_field)
            .finish()
    }
}

// ─────────────────────────────────────────────
// Built-in providers (sorted by name)
// ─────────────────────────────────────────────

/// Complete list of built-in provider specifications.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "anthropic",
        display_name: "Anthropic",
        env_key: "ANTHROPIC_API_SK",
        adapter: AdapterKind::Messages,
        default_api_base: "https://api.anthropic.com",
        budget_field: "max_tokens",
        interpret_error: interpret_anthropic,
    },
    ProviderSpec {
        name: "deepseek",
        display_name: "DeepSeek",
        env_key: "DEEPSEEK_API_SK",
        adapter: AdapterKind::Chat,
        default_api_base: "https://api.deepseek.com",
        budget_field: "max_tokens",
        interpret_error: interpret_openai,
    },
    ProviderSpec {
        name: "gemini",
        display_name: "Gemini",
        env_key: "GEMINI_API_SK",
        adapter: AdapterKind::Generation,
        default_api_base: "https://generativelanguage.googleapis.com",
        budget_field: "maxOutputTokens",
        interpret_error: interpret_gemini,
    },
    ProviderSpec {
        name: "groq",
        display_name: "Groq",
        env_key: "GROQ_API_SK",
        adapter: AdapterKind::Chat,
        default_api_base: "https://api.groq.com/openai/v1",
        budget_field: "max_completion_tokens",
        interpret_error: interpret_openai,
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_SK",
        adapter: AdapterKind::Responses,
        default_api_base: "https://api.openai.com/v1",
        budget_field: "max_output_tokens",
        interpret_error: interpret_openai,
    },
    ProviderSpec {
        name: "xai",
        display_name: "xAI",
        env_key: "XAI_API_SK",
        adapter: AdapterKind::Chat,
        default_api_base: "https://api.x.ai/v1",
        budget_field: "max_tokens",
        interpret_error: interpret_openai,
    },
];

/// Find a built-in provider spec by name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|s| s.name == name)
}

// ─────────────────────────────────────────────
// ProviderRegistry: the injected, immutable table
// ─────────────────────────────────────────────

/// Immutable provider table handed to the dispatcher.
///
/// Wraps the static specs plus per-deployment API base overrides, so the
/// statics themselves never change.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    specs: Vec<ProviderSpec>,
    api_bases: HashMap<String, String>,
}

impl ProviderRegistry {
    /// Registry with every built-in provider.
    pub fn builtin() -> Self {
        Self::new(PROVIDERS.iter().copied())
    }

    /// Registry from an explicit spec list. Later duplicates replace earlier ones.
    pub fn new(specs: impl IntoIterator<Item = ProviderSpec>) -> Self {
        let mut registry = Self::default();
        for spec in specs {
            registry.specs.retain(|s| s.name != spec.name);
            registry.specs.push(spec);
        }
        registry
    }

    /// Built-ins with the API base overrides found in `config.providers`.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::builtin();
        for spec in PROVIDERS {
            if let Some(base) = config.api_base(spec.name) {
                registry = registry.with_api_base(spec.name, base);
            }
        }
        registry
    }

    /// Point one provider at a different base URL (proxy, mock server...).
    pub fn with_api_base(mut self, name: impl Into<String>, api_base: impl Into<String>) -> Self {
        let base: String = api_base.into();
        self.api_bases
            .insert(name.into(), base.trim_end_matches('/').to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ProviderSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Effective API base for a provider: override, else the spec default.
    pub fn api_base(&self, name: &str) -> Option<&str> {
        self.api_bases
            .get(name)
            .map(String::as_str)
            .or_else(|| self.get(name).map(|s| s.default_api_base))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mohdel_core::config::ProviderSettings;

    #[test]
    fn test_find_by_name() {
        let spec = find_by_name("deepseek").unwrap();
        assert_eq!(spec.display_name, "DeepSeek");
        assert_eq!(spec.env_key, "DEEPSEEK_API_SK");
        assert_eq!(spec.adapter, AdapterKind::Chat);
    }

    #[test]
    fn test_find_by_name_unknown() {
        assert!(find_by_name("openrouter").is_none());
    }

    #[test]
    fn test_adapter_per_provider() {
        assert_eq!(find_by_name("anthropic").unwrap().adapter, AdapterKind::Messages);
        assert_eq!(find_by_name("openai").unwrap().adapter, AdapterKind::Responses);
        assert_eq!(find_by_name("gemini").unwrap().adapter, AdapterKind::Generation);
        assert_eq!(find_by_name("xai").unwrap().adapter, AdapterKind::Chat);
    }

    #[test]
    fn test_groq_uses_completion_tokens_field() {
        assert_eq!(find_by_name("groq").unwrap().budget_field, "max_completion_tokens");
        assert_eq!(find_by_name("xai").unwrap().budget_field, "max_tokens");
    }

    #[test]
    fn test_fixed_family_budget_fields_match_wire_names() {
        // messages.rs, responses.rs and generation.rs serialize these names.
        assert_eq!(find_by_name("anthropic").unwrap().budget_field, "max_tokens");
        assert_eq!(find_by_name("openai").unwrap().budget_field, "max_output_tokens");
        assert_eq!(find_by_name("gemini").unwrap().budget_field, "maxOutputTokens");
    }

    #[test]
    fn test_all_providers_have_unique_names() {
        let names: Vec<&str> = PROVIDERS.iter().map(|s| s.name).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len(), "Duplicate provider names found");
    }

    #[test]
    fn test_provider_count() {
        assert_eq!(PROVIDERS.len(), 6);
        assert_eq!(ProviderRegistry::builtin().len(), 6);
    }

    #[test]
    fn test_registry_api_base_override() {
        let registry = ProviderRegistry::builtin().with_api_base("xai", "http://127.0.0.1:9999/");
        assert_eq!(registry.api_base("xai"), Some("http://127.0.0.1:9999"));
        assert_eq!(registry.api_base("groq"), Some("https://api.groq.com/openai/v1"));
        assert_eq!(registry.api_base("nope"), None);
    }

    #[test]
    fn test_registry_from_config() {
        let mut config = Config::default();
        config.providers.insert(
            "deepseek".into(),
            ProviderSettings {
                api_base: Some("https://ds.proxy".into()),
            },
        );
        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(registry.api_base("deepseek"), Some("https://ds.proxy"));
        assert_eq!(registry.api_base("openai"), Some("https://api.openai.com/v1"));
    }

    #[test]
    fn test_registry_custom_specs_replace_duplicates() {
        let mut acme = *find_by_name("xai").unwrap();
        acme.name = "acme";
        let mut acme_v2 = acme;
        acme_v2.env_key = "ACME_V2_SK";

        let registry = ProviderRegistry::new([acme, acme_v2]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("acme").unwrap().env_key, "ACME_V2_SK");
        assert!(registry.get("xai").is_none());
    }
}
