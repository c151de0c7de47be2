//! Vendor adapters: one per request-shape family.
//!
//! Every adapter turns a prompt plus [`AnswerOptions`] into its family's
//! native request, posts it, and folds the reply back into an
//! [`AnswerResult`]. Failures come back raw as [`VendorError`]; the
//! dispatcher runs them through the provider's error interpreter.
//!
//! The set of adapters is closed: [`adapter_for`] maps each
//! [`AdapterKind`] to a static instance.

pub mod chat;
pub mod generation;
pub mod messages;
pub mod responses;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use mohdel_core::utils::truncate_string;
use mohdel_core::{AnswerOptions, AnswerResult, CatalogEntry, EffortLevels, EffortValue};

use crate::errors::VendorError;
use crate::registry::{AdapterKind, ProviderSpec};

pub use chat::ChatAdapter;
pub use generation::GenerationAdapter;
pub use messages::MessagesAdapter;
pub use responses::ResponsesAdapter;

// ─────────────────────────────────────────────
// Call inputs
// ─────────────────────────────────────────────

/// Per-model view of a catalog entry, as adapters need it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    /// Canonical `provider/model` id, for logs.
    pub id: String,
    pub api_model_name: String,
    pub output_token_limit: u32,
    pub thinking_effort_levels: Option<EffortLevels>,
    pub provider: String,
}

impl ModelSpec {
    pub fn from_entry(id: impl Into<String>, entry: &CatalogEntry) -> Self {
        Self {
            id: id.into(),
            api_model_name: entry.api_model_name.clone(),
            output_token_limit: entry.output_token_limit,
            thinking_effort_levels: entry.thinking_effort_levels.clone(),
            provider: entry.provider.clone(),
        }
    }

    /// Budget to send: the request, capped at the model limit.
    pub fn output_budget(&self, options: &AnswerOptions) -> u32 {
        let effective = options
            .output_budget
            .unwrap_or(self.output_token_limit)
            .min(self.output_token_limit);
        if let Some(requested) = options.output_budget.filter(|b| *b > effective) {
            warn!(
                model = %self.id,
                requested,
                limit = self.output_token_limit,
                "Output budget clamped to model limit"
            );
        }
        effective
    }

    /// Mapped effort value, when an effort is requested and the model knows it.
    pub fn effort_value(&self, options: &AnswerOptions) -> Option<&EffortValue> {
        let effort = options.requested_effort()?;
        let value = self
            .thinking_effort_levels
            .as_ref()
            .and_then(|levels| levels.get(effort));
        if value.is_none() {
            debug!(model = %self.id, effort = %effort, "Model has no mapping for requested effort, ignoring");
        }
        value
    }
}

/// Where and how to reach a vendor for one call.
#[derive(Clone)]
pub struct Connection {
    /// Shared default client, or a call-scoped one built from an override.
    pub client: reqwest::Client,
    /// API base without trailing slash.
    pub api_base: String,
    pub api_key: String,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(client: reqwest::Client, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base: String = api_base.into();
        Self {
            client,
            api_base: base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// `api_base` + `path` (path starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

// ─────────────────────────────────────────────
// Adapter trait
// ─────────────────────────────────────────────

/// One vendor request-shape family.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Send `prompt` and normalize the reply.
    async fn answer(
        &self,
        provider: &ProviderSpec,
        conn: &Connection,
        model: &ModelSpec,
        prompt: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerResult, VendorError>;
}

static MESSAGES: MessagesAdapter = MessagesAdapter;
static RESPONSES: ResponsesAdapter = ResponsesAdapter;
static CHAT: ChatAdapter = ChatAdapter;
static GENERATION: GenerationAdapter = GenerationAdapter;

/// The adapter registered for `kind`.
pub fn adapter_for(kind: AdapterKind) -> &'static dyn Adapter {
    match kind {
        AdapterKind::Messages => &MESSAGES,
        AdapterKind::Responses => &RESPONSES,
        AdapterKind::Chat => &CHAT,
        AdapterKind::Generation => &GENERATION,
    }
}

// ─────────────────────────────────────────────
// Shared HTTP plumbing
// ─────────────────────────────────────────────

/// POST `body` as JSON and decode a success reply into `T`.
///
/// Non-success statuses become [`VendorError::Http`] with the raw body, so
/// the interpreter sees exactly what the vendor sent.
pub(crate) async fn post_json<B, T>(
    provider: &ProviderSpec,
    conn: &Connection,
    url: &str,
    headers: HeaderMap,
    body: &B,
) -> Result<T, VendorError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = conn
        .client
        .post(url)
        .headers(headers)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            error!(provider = provider.display_name, error = %e, "HTTP request failed");
            VendorError::Network(e)
        })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| {
        error!(provider = provider.display_name, error = %e, "Failed to read response body");
        VendorError::Network(e)
    })?;

    if !status.is_success() {
        error!(
            provider = provider.display_name,
            status = %status,
            body = %truncate_string(&text, 500),
            "API error"
        );
        return Err(VendorError::Http {
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        error!(provider = provider.display_name, error = %e, "Failed to parse API response");
        VendorError::Decode(e)
    })
}

/// Bearer auth header map for OpenAI-shaped vendors.
pub(crate) fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("Bearer {api_key}").parse() {
        headers.insert(reqwest::header::AUTHORIZATION, value);
    }
    headers
}

/// Single custom auth header (`x-api-key`, `x-goog-api-key`...).
pub(crate) fn key_header(name: &'static str, api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = api_key.parse() {
        headers.insert(name, value);
    }
    headers
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
