//! Responses-style adapter (`POST /responses`).
//!
//! Supports effort mapping, JSON mode and image inputs. Reasoning and
//! temperature are mutually exclusive on this family: when a mapped effort
//! is sent, `temperature` is left out of the body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use mohdel_core::{AnswerOptions, AnswerResult, OutputType};

use super::{bearer_headers, post_json, Adapter, Connection, ModelSpec};
use crate::errors::VendorError;
use crate::images::{filter_supported, RESPONSES_MIMETYPES};
use crate::registry::{AdapterKind, ProviderSpec};

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    input: Value,
    store: bool,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Reasoning {
    effort: Value,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: ResponsesUsage,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsesUsage {
    #[serde(default)]
    input_tokens: u32,
    /// Includes reasoning tokens.
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    output_tokens_details: Option<OutputTokensDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputTokensDetails {
    #[serde(default)]
    reasoning_tokens: u32,
}

/// Adapter for structured input/output vendors.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponsesAdapter;

impl ResponsesAdapter {
    /// Plain string, or a multimodal content array when images are attached.
    fn build_input(provider: &ProviderSpec, prompt: &str, options: &AnswerOptions) -> Value {
        let images = filter_supported(&options.images, RESPONSES_MIMETYPES, provider.name);
        if images.is_empty() {
            return Value::from(prompt);
        }

        let mut content = vec![serde_json::json!({ "type": "input_text", "text": prompt })];
        content.extend(images.into_iter().map(|image| {
            serde_json::json!({
                "type": "input_image",
                "image_url": image.data_uri(),
                "detail": "high",
            })
        }));
        serde_json::json!([{ "role": "user", "content": content }])
    }
}

#[async_trait]
impl Adapter for ResponsesAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Responses
    }

    async fn answer(
        &self,
        provider: &ProviderSpec,
        conn: &Connection,
        model: &ModelSpec,
        prompt: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerResult, VendorError> {
        let reasoning = model
            .effort_value(options)
            .map(|value| Reasoning { effort: value.to_json() });

        let body = ResponsesRequest {
            model: &model.api_model_name,
            temperature: if reasoning.is_some() { None } else { Some(0.0) },
            input: Self::build_input(provider, prompt, options),
            store: false,
            max_output_tokens: model.output_budget(options),
            reasoning,
            text: (options.output_type == OutputType::Json)
                .then(|| serde_json::json!({ "format": { "type": "json_object" } })),
            user: options.identifier.as_deref(),
        };

        debug!(
            provider = provider.display_name,
            model = %model.api_model_name,
            max_output_tokens = body.max_output_tokens,
            reasoning = body.reasoning.is_some(),
            "Calling responses API"
        );

        let resp: ResponsesResponse = post_json(
            provider,
            conn,
            &conn.url("/responses"),
            bearer_headers(&conn.api_key),
            &body,
        )
        .await?;

        let output: String = resp
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|c| c.kind == "output_text")
            .filter_map(|c| c.text.as_deref())
            .collect();

        let reasoning_tokens = resp
            .usage
            .output_tokens_details
            .map_or(0, |d| d.reasoning_tokens);

        Ok(AnswerResult::from_inclusive_total(
            output,
            resp.usage.input_tokens,
            resp.usage.output_tokens,
            reasoning_tokens,
        ))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tests::{conn, model};
    use crate::registry::find_by_name;
    use mohdel_core::{EffortLevels, EffortValue, ImageInput, OutputEffort};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(output_tokens: u32, reasoning_tokens: u32) -> Value {
        serde_json::json!({
            "id": "resp_1",
            "output": [
                { "type": "reasoning", "summary": [] },
                {
                    "type": "message",
                    "role": "assistant",
                    "content": [{ "type": "output_text", "text": "42", "annotations": [] }]
                }
            ],
            "usage": {
                "input_tokens": 10,
                "output_tokens": output_tokens,
                "output_tokens_details": { "reasoning_tokens": reasoning_tokens }
            }
        })
    }

    async fn sent_body(server: &MockServer) -> Value {
        let requests = server.received_requests().await.unwrap();
        serde_json::from_slice(&requests[0].body).unwrap()
    }

    #[tokio::test]
    async fn test_reasoning_tokens_are_split_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "o3",
                "input": "what is six times seven",
                "store": false,
                "max_output_tokens": 1000,
                "temperature": 0.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(30, 5)))
            .mount(&mock_server)
            .await;

        let provider = find_by_name("openai").unwrap();
        let result = ResponsesAdapter
            .answer(
                provider,
                &conn(&mock_server.uri()),
                &model("o3", 1000),
                "what is six times seven",
                &AnswerOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(result.output, "42");
        assert_eq!(result.input_tokens, 10);
        assert_eq!(result.output_tokens, 25);
        assert_eq!(result.thinking_tokens, 5);
    }

    #[tokio::test]
    async fn test_effort_replaces_temperature() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(body_partial_json(serde_json::json!({
                "reasoning": { "effort": 2000 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(3, 0)))
            .mount(&mock_server)
            .await;

        let mut spec = model("o3", 1000);
        spec.thinking_effort_levels = Some(EffortLevels {
            high: Some(EffortValue::Budget(2000)),
            ..Default::default()
        });

        let provider = find_by_name("openai").unwrap();
        let options = AnswerOptions::default().with_effort(OutputEffort::High);
        ResponsesAdapter
            .answer(provider, &conn(&mock_server.uri()), &spec, "hi", &options)
            .await
            .unwrap();

        let sent = sent_body(&mock_server).await;
        assert!(sent.get("temperature").is_none());
        assert_eq!(sent["reasoning"]["effort"], 2000);
    }

    #[tokio::test]
    async fn test_unmapped_effort_keeps_temperature() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(3, 0)))
            .mount(&mock_server)
            .await;

        let provider = find_by_name("openai").unwrap();
        let options = AnswerOptions::default().with_effort(OutputEffort::Low);
        ResponsesAdapter
            .answer(provider, &conn(&mock_server.uri()), &model("gpt-4.1", 1000), "hi", &options)
            .await
            .unwrap();

        let sent = sent_body(&mock_server).await;
        assert_eq!(sent["temperature"], 0.0);
        assert!(sent.get("reasoning").is_none());
    }

    #[tokio::test]
    async fn test_json_mode_images_and_user() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(body_partial_json(serde_json::json!({
                "text": { "format": { "type": "json_object" } },
                "user": "user-7"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(3, 0)))
            .mount(&mock_server)
            .await;

        let provider = find_by_name("openai").unwrap();
        let options = AnswerOptions::default()
            .json()
            .with_identifier("user-7")
            .with_image(ImageInput::new("image/png", "cG5n"))
            .with_image(ImageInput::new("image/tiff", "dGlmZg=="));

        ResponsesAdapter
            .answer(provider, &conn(&mock_server.uri()), &model("gpt-4.1", 1000), "describe", &options)
            .await
            .unwrap();

        let sent = sent_body(&mock_server).await;
        let content = sent["input"][0]["content"].as_array().unwrap();
        // Prompt plus the one supported image; the TIFF is dropped.
        assert_eq!(content.len(), 2);
        assert_eq!(content[0], serde_json::json!({ "type": "input_text", "text": "describe" }));
        assert_eq!(content[1]["type"], "input_image");
        assert_eq!(content[1]["image_url"], "data:image/png;base64,cG5n");
        assert_eq!(content[1]["detail"], "high");
    }

    #[tokio::test]
    async fn test_budget_is_clamped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(body_partial_json(serde_json::json!({ "max_output_tokens": 100 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(3, 0)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = find_by_name("openai").unwrap();
        ResponsesAdapter
            .answer(
                provider,
                &conn(&mock_server.uri()),
                &model("foo-v1", 100),
                "hi",
                &AnswerOptions::default().with_budget(500),
            )
            .await
            .unwrap();
    }
}
