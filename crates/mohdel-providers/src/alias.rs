//! Alias resolver: expands short model names to canonical `provider/model` ids.
//!
//! Three alternate forms are indexed for every catalog entry:
//!
//! | form | example | registered when |
//! |---|---|---|
//! | model name | `claude-3-7-sonnet-20250219` | unique across all providers |
//! | base name | `claude-3-7-sonnet` | unique across all providers |
//! | provider + base name | `anthropic/claude-3-7-sonnet` | always |
//!
//! An alias never silently picks one of several targets: collisions are
//! left out of the index or recorded as ambiguous, and surface as
//! [`Error::AmbiguousAlias`].

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use mohdel_core::types::{split_model_id, PROVIDER_DELIMITER};
use mohdel_core::{Catalog, Error, Result};

/// Trailing version/date groups plus an optional lowercase tag:
/// `-20250219`, `-001`, `-8192`, `-0125-preview`. Single-digit groups
/// (`-3-7`) belong to the family name and are never stripped.
fn version_suffix() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)((?:-\d{2,})+)(?:-[a-z]+)?$").ok())
        .as_ref()
}

/// Strip the trailing version/date suffix: `foo-3-7-20250219` → `foo-3-7`.
pub fn base_name(model_name: &str) -> &str {
    version_suffix()
        .and_then(|re| re.captures(model_name))
        .and_then(|c| c.get(1))
        .map_or(model_name, |base| base.as_str())
}

/// What an index key points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AliasTarget {
    Unique(String),
    /// Same `provider/baseName` for several entries of one provider.
    Ambiguous(Vec<String>),
}

/// Disambiguation index derived from a catalog snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasIndex {
    aliases: HashMap<String, AliasTarget>,
}

impl AliasIndex {
    /// Build the index from scratch. Deterministic for a given catalog.
    pub fn build(catalog: &Catalog) -> Self {
        let mut model_counts: HashMap<&str, usize> = HashMap::new();
        let mut base_counts: HashMap<&str, usize> = HashMap::new();
        let mut provider_bases: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (id, _) in catalog.iter() {
            let Some((provider, model)) = split_model_id(id) else {
                continue;
            };
            let base = base_name(model);
            *model_counts.entry(model).or_default() += 1;
            *base_counts.entry(base).or_default() += 1;
            provider_bases
                .entry(format!("{provider}{PROVIDER_DELIMITER}{base}"))
                .or_default()
                .push(id.to_string());
        }

        let mut aliases = HashMap::new();

        for (id, _) in catalog.iter() {
            if let Some((_, model)) = split_model_id(id) {
                if model_counts.get(model) == Some(&1) {
                    aliases.insert(model.to_string(), AliasTarget::Unique(id.to_string()));
                }
            }
        }

        for (id, _) in catalog.iter() {
            if let Some((_, model)) = split_model_id(id) {
                let base = base_name(model);
                // An exact model name wins over another entry's base name.
                if base_counts.get(base) == Some(&1) && !aliases.contains_key(base) {
                    aliases.insert(base.to_string(), AliasTarget::Unique(id.to_string()));
                }
            }
        }

        for (key, mut ids) in provider_bases {
            if catalog.contains(&key) {
                continue;
            }
            let target = if ids.len() == 1 {
                AliasTarget::Unique(ids.remove(0))
            } else {
                AliasTarget::Ambiguous(ids)
            };
            aliases.insert(key, target);
        }

        debug!(models = catalog.len(), aliases = aliases.len(), "Alias index built");
        Self { aliases }
    }

    pub fn get(&self, alias: &str) -> Option<&AliasTarget> {
        self.aliases.get(alias)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Expand `id` to a canonical id.
    ///
    /// Returns `id` unchanged when nothing matches; the caller decides
    /// whether that is an error.
    pub fn resolve(&self, id: &str, catalog: &Catalog) -> Result<String> {
        if catalog.contains(id) {
            return Ok(id.to_string());
        }

        match self.aliases.get(id) {
            Some(AliasTarget::Unique(target)) => return Ok(target.clone()),
            Some(AliasTarget::Ambiguous(matches)) => {
                return Err(Error::AmbiguousAlias {
                    alias: id.to_string(),
                    matches: matches.clone(),
                })
            }
            None => {}
        }

        if id.contains(PROVIDER_DELIMITER) {
            return Ok(id.to_string());
        }

        let matches: Vec<&str> = catalog
            .ids()
            .filter(|key| split_model_id(key).is_some_and(|(_, model)| model == id))
            .collect();

        match matches.as_slice() {
            [] => Ok(id.to_string()),
            [only] => self.resolve(only, catalog),
            _ => Err(Error::AmbiguousAlias {
                alias: id.to_string(),
                matches: matches.iter().map(|m| m.to_string()).collect(),
            }),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
