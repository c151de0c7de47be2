//! Chat-completions adapter (`POST /chat/completions`).
//!
//! Shared by every OpenAI-compatible vendor in the registry. The only
//! per-vendor knob is the name of the token cap field, read from
//! [`ProviderSpec::budget_field`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use mohdel_core::{AnswerOptions, AnswerResult, OutputType};

use super::{bearer_headers, post_json, Adapter, Connection, ModelSpec};
use crate::errors::VendorError;
use crate::images::{filter_supported, TEXT_ONLY};
use crate::registry::{AdapterKind, ProviderSpec};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    /// Includes reasoning tokens when the vendor reports them.
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    completion_tokens_details: Option<CompletionTokensDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionTokensDetails {
    #[serde(default)]
    reasoning_tokens: Option<u32>,
}

/// Adapter for OpenAI-compatible chat-completions vendors.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChatAdapter;

impl ChatAdapter {
    fn build_body(
        provider: &ProviderSpec,
        model: &ModelSpec,
        prompt: &str,
        options: &AnswerOptions,
    ) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("model".into(), Value::from(model.api_model_name.as_str()));
        body.insert("temperature".into(), json!(0.0));
        body.insert(
            provider.budget_field.into(),
            Value::from(model.output_budget(options)),
        );
        body.insert(
            "messages".into(),
            json!([{ "role": "user", "content": prompt }]),
        );
        if options.output_type == OutputType::Json {
            body.insert("response_format".into(), json!({ "type": "json_object" }));
        }
        if let Some(user) = options.identifier.as_deref() {
            body.insert("user".into(), Value::from(user));
        }
        body
    }
}

#[async_trait]
impl Adapter for ChatAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Chat
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
        let body = Self::build_body(provider, model, prompt, options);

        debug!(
            provider = provider.display_name,
            model = %model.api_model_name,
            budget_field = provider.budget_field,
            "Calling chat completions API"
        );

        let resp: ChatResponse = post_json(
            provider,
            conn,
            &conn.url("/chat/completions"),
            bearer_headers(&conn.api_key),
            &body,
        )
        .await?;

        let output = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let usage = resp.usage.unwrap_or_default();
        let reasoning_tokens = usage
            .completion_tokens_details
            .and_then(|d| d.reasoning_tokens)
            .unwrap_or(0);

        Ok(AnswerResult::from_inclusive_total(
            output,
            usage.prompt_tokens,
            usage.completion_tokens,
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
    use mohdel_core::{ErrorCode, ImageInput};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(usage: Value) -> Value {
        json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "pong" },
                "finish_reason": "stop"
            }],
            "usage": usage
        })
    }

    #[tokio::test]
    async fn test_answer_reads_usage() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "deepseek-chat",
                "temperature": 0.0,
                "max_tokens": 8192,
                "messages": [{ "role": "user", "content": "ping" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(json!({
                "prompt_tokens": 7,
                "completion_tokens": 2,
                "total_tokens": 9
            }))))
            .mount(&mock_server)
            .await;

        let provider = find_by_name("deepseek").unwrap();
        let result = ChatAdapter
            .answer(
                provider,
                &conn(&mock_server.uri()),
                &model("deepseek-chat", 8192),
                "ping",
                &AnswerOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(result.output, "pong");
        assert_eq!(result.input_tokens, 7);
        assert_eq!(result.output_tokens, 2);
        assert_eq!(result.thinking_tokens, 0);
    }

    #[tokio::test]
    async fn test_groq_budget_field_and_reasoning() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({ "max_completion_tokens": 100 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(json!({
                "prompt_tokens": 5,
                "completion_tokens": 30,
                "completion_tokens_details": { "reasoning_tokens": 12 }
            }))))
            .mount(&mock_server)
            .await;

        let provider = find_by_name("groq").unwrap();
        let result = ChatAdapter
            .answer(
                provider,
                &conn(&mock_server.uri()),
                &model("qwen-qwq-32b", 100),
                "ping",
                &AnswerOptions::default().with_budget(1000),
            )
            .await
            .unwrap();

        assert_eq!(result.output_tokens, 18);
        assert_eq!(result.thinking_tokens, 12);
        assert_eq!(result.generated_tokens(), 30);

        let requests = mock_server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(sent.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn test_json_mode_and_user() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "response_format": { "type": "json_object" },
                "user": "user-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(Value::Null)))
            .mount(&mock_server)
            .await;

        let provider = find_by_name("xai").unwrap();
        let result = ChatAdapter
            .answer(
                provider,
                &conn(&mock_server.uri()),
                &model("grok-3", 100),
                "ping",
                &AnswerOptions::default()
                    .json()
                    .with_identifier("user-1")
                    .with_image(ImageInput::new("image/png", "cG5n")),
            )
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["messages"][0]["content"], "ping");

        // Null usage reads as zero.
        assert_eq!(result.input_tokens, 0);
        assert_eq!(result.output, "pong");
    }

    #[tokio::test]
    async fn test_rate_limit_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit exceeded", "type": "rate_limit_error" }
            })))
            .mount(&mock_server)
            .await;

        let provider = find_by_name("xai").unwrap();
        let err = ChatAdapter
            .answer(provider, &conn(&mock_server.uri()), &model("grok-3", 100), "ping", &AnswerOptions::default())
            .await
            .unwrap_err();

        let interpreted = (provider.interpret_error)(&err);
        assert_eq!(interpreted.code, ErrorCode::Retryable);
        assert_eq!(interpreted.message, "Rate limit exceeded");
    }

    #[tokio::test]
    async fn test_network_error() {
        // Point to a port that's not listening
        let provider = find_by_name("deepseek").unwrap();
        let err = ChatAdapter
            .answer(provider, &conn("http://127.0.0.1:1"), &model("deepseek-chat", 100), "ping", &AnswerOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, VendorError::Network(_)));
        assert_eq!((provider.interpret_error)(&err).code, ErrorCode::Retryable);
    }
}
