//! HTTP client construction and per-call overrides.

use std::time::Duration;

use mohdel_core::{Error, Result};

/// Per-call connection settings layered on top of the dispatcher defaults.
///
/// Any override produces a fresh client scoped to that one call; the shared
/// default client is never touched.
#[derive(Clone, Default)]
pub struct ClientOverride {
    /// Use this key instead of the credential source.
    pub api_key: Option<String>,
    /// Use this base URL instead of the registry's.
    pub api_base: Option<String>,
    /// Request timeout for this call only.
    pub timeout: Option<Duration>,
}

impl ClientOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.api_base.is_none() && self.timeout.is_none()
    }
}

impl std::fmt::Debug for ClientOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOverride")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Build a connection-pooled client with the given request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Client(e.to_string()))
}
