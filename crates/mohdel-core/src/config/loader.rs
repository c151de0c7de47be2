//! Config loader: reads `~/.mohdel/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.mohdel/config.json`
//! 3. Environment variables `MOHDEL_<FIELD>` / `MOHDEL_PROVIDERS__<NAME>__API_BASE`

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderSettings};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Supported overrides:
/// - `MOHDEL_DEFAULT_MODEL` → `default_model`
/// - `MOHDEL_CATALOG_PATH` → `catalog_path`
/// - `MOHDEL_TIMEOUT_SECS` → `timeout_secs`
/// - `MOHDEL_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, std::env::vars())
}

fn apply_overrides_from<I>(mut config: Config, vars: I) -> Config
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, val) in vars {
        if val.is_empty() {
            continue;
        }
        match key.as_str() {
            "MOHDEL_DEFAULT_MODEL" => config.default_model = Some(val),
            "MOHDEL_CATALOG_PATH" => config.catalog_path = Some(val),
            "MOHDEL_TIMEOUT_SECS" => match val.parse::<u64>() {
                Ok(n) if n > 0 => config.timeout_secs = n,
                _ => warn!("Ignoring invalid MOHDEL_TIMEOUT_SECS={}", val),
            },
            _ => {
                if let Some(name) = provider_from_env_key(&key) {
                    config
                        .providers
                        .entry(name)
                        .or_insert_with(ProviderSettings::default)
                        .api_base = Some(val);
                }
            }
        }
    }

    config
}

/// `MOHDEL_PROVIDERS__XAI__API_BASE` → `Some("xai")`.
fn provider_from_env_key(key: &str) -> Option<String> {
    let name = key
        .strip_prefix("MOHDEL_PROVIDERS__")?
        .strip_suffix("__API_BASE")?;
    if name.is_empty() {
        return None;
    }
    Some(name.to_lowercase())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
