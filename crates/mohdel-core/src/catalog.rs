//! Catalog: read-only registry of curated models and their capabilities.
//!
//! Keys are canonical `provider/modelName` ids. Iteration is sorted by key so
//! anything derived from the catalog (alias index, ambiguity reports) is
//! deterministic. Loading is read-only; curating and persisting the file is
//! someone else's job.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{split_model_id, OutputEffort};

// ─────────────────────────────────────────────
// Effort levels
// ─────────────────────────────────────────────

/// Provider-specific value an effort level maps to: a token budget
/// (`2000`) or a vendor label (`"high"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffortValue {
    Budget(u32),
    Label(String),
}

impl EffortValue {
    /// The value as a JSON scalar, as vendors expect it.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            EffortValue::Budget(n) => serde_json::Value::from(*n),
            EffortValue::Label(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

/// `low`/`medium`/`high` → provider-specific value. Absent levels are unsupported.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffortLevels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<EffortValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<EffortValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<EffortValue>,
}

impl EffortLevels {
    pub fn get(&self, effort: OutputEffort) -> Option<&EffortValue> {
        match effort {
            OutputEffort::None => None,
            OutputEffort::Low => self.low.as_ref(),
            OutputEffort::Medium => self.medium.as_ref(),
            OutputEffort::High => self.high.as_ref(),
        }
    }
}

// ─────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────

/// One curated model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Name sent to the vendor API (e.g. `"claude-3-7-sonnet-20250219"`).
    #[serde(rename = "model", alias = "apiModelName", default)]
    pub api_model_name: String,
    /// Hard cap on generated tokens.
    pub output_token_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_effort_levels: Option<EffortLevels>,
    /// Provider name; defaults to the id prefix.
    #[serde(default)]
    pub provider: String,
    /// Vendor SDK family the entry was curated from (informational).
    #[serde(rename = "sdk", alias = "sdkFamily", default, skip_serializing_if = "Option::is_none")]
    pub sdk_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_images: Option<bool>,
    #[serde(default)]
    pub label: String,
}

impl CatalogEntry {
    pub fn new(provider: impl Into<String>, api_model_name: impl Into<String>, output_token_limit: u32) -> Self {
        Self {
            api_model_name: api_model_name.into(),
            output_token_limit,
            thinking_effort_levels: None,
            provider: provider.into(),
            sdk_family: None,
            supports_images: None,
            label: String::new(),
        }
    }

    pub fn with_effort_levels(mut self, levels: EffortLevels) -> Self {
        self.thinking_effort_levels = Some(levels);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_images(mut self, supported: bool) -> Self {
        self.supports_images = Some(supported);
        self
    }
}

// ─────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────

/// Immutable snapshot of every curated model, keyed by canonical id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Build from `(canonical id, entry)` pairs, normalizing and validating each.
    pub fn from_entries<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, CatalogEntry)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (id, entry) in entries {
            let id = id.into();
            let entry = normalize_entry(&id, entry)?;
            map.insert(id, entry);
        }
        Ok(Self { entries: map })
    }

    /// Parse the curated JSON shape (`{"provider/model": {...}}`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, CatalogEntry> = serde_json::from_str(json)?;
        Self::from_entries(raw)
    }

    /// Read a curated JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading catalog from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        debug!(models = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Every `(canonical id, entry)` in sorted id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_entry(id: &str, mut entry: CatalogEntry) -> Result<CatalogEntry> {
    let (provider, model_name) = match split_model_id(id) {
        Some((p, m)) if !p.is_empty() && !m.is_empty() => (p, m),
        _ => {
            return Err(Error::Catalog(format!(
                "'{id}' is not a provider/model id"
            )))
        }
    };
    if entry.output_token_limit == 0 {
        return Err(Error::Catalog(format!(
            "'{id}' has no outputTokenLimit"
        )));
    }
    if entry.provider.is_empty() {
        entry.provider = provider.to_string();
    }
    if entry.api_model_name.is_empty() {
        entry.api_model_name = model_name.to_string();
    }
    Ok(entry)
}
