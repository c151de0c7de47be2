//! Generation-style adapter (`POST /v1beta/models/{model}:generateContent`).
//!
//! Sampling temperature comes from the requested output style rather than
//! a fixed zero.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use mohdel_core::{AnswerOptions, AnswerResult, OutputType};

use super::{key_header, post_json, Adapter, Connection, ModelSpec};
use crate::errors::VendorError;
use crate::images::{filter_supported, GENERATION_MIMETYPES};
use crate::registry::{AdapterKind, ProviderSpec};

/// Output style → sampling temperature. Unknown styles get 0.
const STYLE_TEMPERATURES: &[(&str, f64)] = &[
    ("coding", 0.0),
    ("analysis", 0.2),
    ("translation", 0.4),
    ("chat", 0.9),
    ("creative", 1.0),
];

/// Temperature for an output style.
pub fn style_temperature(style: Option<&str>) -> f64 {
    style
        .and_then(|s| STYLE_TEMPERATURES.iter().find(|(name, _)| *name == s))
        .map_or(0.0, |(_, t)| *t)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: UsageMetadata,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    /// Visible output only; thoughts are counted separately.
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    thoughts_token_count: u32,
}

/// Adapter for generate-content vendors.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenerationAdapter;

impl GenerationAdapter {
    fn build_parts(provider: &ProviderSpec, prompt: &str, options: &AnswerOptions) -> Vec<Value> {
        let mut parts = vec![serde_json::json!({ "text": prompt })];
        for image in filter_supported(&options.images, GENERATION_MIMETYPES, provider.name) {
            parts.push(serde_json::json!({
                "inlineData": { "mimeType": image.mimetype, "data": image.data }
            }));
        }
        parts
    }

    /// `models/gemini-2.0-flash` and `gemini-2.0-flash` name the same model.
    fn endpoint(model: &ModelSpec) -> String {
        let name = model
            .api_model_name
            .strip_prefix("models/")
            .unwrap_or(&model.api_model_name);
        format!("/v1beta/models/{name}:generateContent")
    }
}

#[async_trait]
impl Adapter for GenerationAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Generation
    }

    async fn answer(
        &self,
        provider: &ProviderSpec,
        conn: &Connection,
        model: &ModelSpec,
        prompt: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerResult, VendorError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: Self::build_parts(provider, prompt, options),
            }],
            generation_config: GenerationConfig {
                max_output_tokens: model.output_budget(options),
                temperature: style_temperature(options.output_style.as_deref()),
                thinking_config: model.effort_value(options).map(|value| ThinkingConfig {
                    thinking_budget: value.to_json(),
                }),
                response_mime_type: (options.output_type == OutputType::Json)
                    .then_some("application/json"),
            },
        };

        debug!(
            provider = provider.display_name,
            model = %model.api_model_name,
            max_output_tokens = body.generation_config.max_output_tokens,
            temperature = body.generation_config.temperature,
            "Calling generateContent API"
        );

        let resp: GenerateResponse = post_json(
            provider,
            conn,
            &conn.url(&Self::endpoint(model)),
            key_header("x-goog-api-key", &conn.api_key),
            &body,
        )
        .await?;

        let output: String = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        let usage = resp.usage_metadata;
        Ok(AnswerResult {
            output,
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            thinking_tokens: usage.thoughts_token_count,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
