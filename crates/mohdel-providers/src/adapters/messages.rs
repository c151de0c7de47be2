//! Message-style adapter (`POST /v1/messages`).
//!
//! No reasoning knob, no JSON mode, no images: the prompt goes out as a
//! single user message at temperature 0. Images are logged and dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mohdel_core::{AnswerOptions, AnswerResult};

use super::{key_header, post_json, Adapter, Connection, ModelSpec};
use crate::errors::VendorError;
use crate::images::{filter_supported, TEXT_ONLY};
use crate::registry::{AdapterKind, ProviderSpec};

/// Wire API version sent with every request.
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<UserMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata<'a>>,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: MessagesUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Adapter for message-array vendors.
#[derive(Clone, Copy, Debug, Default)]
pub struct MessagesAdapter;

#[async_trait]
impl Adapter for MessagesAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Messages
    }

    async fn answer(
        &self,
        provider: &ProviderSpec,
        conn: &Connection,
        model: &ModelSpec,
        prompt: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerResult, VendorError> {
        filter_supported(&options.images, TEXT_ONLY, provider.name);

        let body = MessagesRequest {
            model: &model.api_model_name,
            temperature: 0.0,
            max_tokens: model.output_budget(options),
            messages: vec![UserMessage {
                role: "user",
                content: prompt,
            }],
            metadata: options
                .identifier
                .as_deref()
                .map(|user_id| Metadata { user_id }),
        };

        debug!(
            provider = provider.display_name,
            model = %model.api_model_name,
            max_tokens = body.max_tokens,
            "Calling messages API"
        );

        let mut headers = key_header("x-api-key", &conn.api_key);
        headers.insert("anthropic-version", reqwest::header::HeaderValue::from_static(API_VERSION));

        let resp: MessagesResponse =
            post_json(provider, conn, &conn.url("/v1/messages"), headers, &body).await?;

        let output: String = resp
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        Ok(AnswerResult {
            output,
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
            thinking_tokens: 0,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
