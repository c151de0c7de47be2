//! Collaborator seams: where credentials and the default model come from.
//!
//! The dispatcher only ever asks these traits; it never reads the
//! environment or config files on its own.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

/// Looks up a credential by the env var name a provider declares.
pub trait CredentialSource: Send + Sync {
    /// The secret, or `None` when absent. Implementations must not log it.
    fn get_credential(&self, env_var: &str) -> Option<String>;
}

/// Reads credentials from the process environment. Empty values count as absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn get_credential(&self, env_var: &str) -> Option<String> {
        std::env::var(env_var).ok().filter(|v| !v.is_empty())
    }
}

/// Process environment layered over a `KEY=VALUE` environment file.
///
/// The process environment wins. A missing file is not an error; the
/// source then behaves like [`EnvCredentials`].
#[derive(Clone, Default)]
pub struct EnvFileCredentials {
    file: HashMap<String, String>,
}

impl EnvFileCredentials {
    /// Read `~/.mohdel/environment`.
    pub fn load_default() -> Self {
        Self::load(&crate::utils::get_environment_path())
    }

    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No environment file at {}, using process env only", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let file = parse_env_file(&content);
                debug!(path = %path.display(), keys = file.len(), "Environment file loaded");
                Self { file }
            }
            Err(e) => {
                warn!("Failed to read environment file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// `KEY=VALUE` lines; `#` comments, blank lines and an `export ` prefix are
/// allowed, and one pair of matching quotes around the value is stripped.
fn parse_env_file(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = ['"', '\'']
                .iter()
                .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
                .unwrap_or(value);
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

impl std::fmt::Debug for EnvFileCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.file.keys().collect();
        names.sort();
        f.debug_struct("EnvFileCredentials")
            .field("file_vars", &names)
            .finish()
    }
}

impl CredentialSource for EnvFileCredentials {
    fn get_credential(&self, env_var: &str) -> Option<String> {
        EnvCredentials
            .get_credential(env_var)
            .or_else(|| self.file.get(env_var).filter(|v| !v.is_empty()).cloned())
    }
}

/// Fixed credential map, for embedding hosts that manage secrets themselves.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, env_var: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(env_var.into(), value.into());
        self
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("StaticCredentials")
            .field("env_vars", &names)
            .finish()
    }
}

impl CredentialSource for StaticCredentials {
    fn get_credential(&self, env_var: &str) -> Option<String> {
        self.values.get(env_var).filter(|v| !v.is_empty()).cloned()
    }
}

/// Supplies the model id used when a caller does not name one.
pub trait DefaultModelSource: Send + Sync {
    fn default_model_id(&self) -> Option<String>;
}

impl DefaultModelSource for Option<String> {
    fn default_model_id(&self) -> Option<String> {
        self.clone()
    }
}

impl DefaultModelSource for &'static str {
    fn default_model_id(&self) -> Option<String> {
        Some((*self).to_string())
    }
}

impl DefaultModelSource for crate::config::Config {
    fn default_model_id(&self) -> Option<String> {
        self.default_model.clone().filter(|m| !m.is_empty())
    }
}
