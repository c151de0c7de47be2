//! Normalized request/response contract shared by every vendor adapter.
//!
//! Callers describe what they want with [`AnswerOptions`] and get back an
//! [`AnswerResult`]; adapters translate both to each vendor's native shape.
//! Option fields serialize with camelCase keys so the same JSON shape can be
//! fed through the CLI or any embedding host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─────────────────────────────────────────────
// Model identifiers
// ─────────────────────────────────────────────

/// Separator between provider and model name in a canonical id.
pub const PROVIDER_DELIMITER: char = '/';

/// Split a `provider/modelName` id at the first delimiter.
///
/// The model part keeps any further slashes (`"openrouter/meta/llama"` →
/// `("openrouter", "meta/llama")`). Returns `None` when there is no delimiter.
pub fn split_model_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(PROVIDER_DELIMITER)
}

// ─────────────────────────────────────────────
// Request options
// ─────────────────────────────────────────────

/// Requested output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Text,
    Json,
}

/// Requested reasoning effort.
///
/// `None` means "do not ask for reasoning", which is different from leaving
/// the option unset only in intent: neither adds a reasoning parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputEffort {
    None,
    Low,
    Medium,
    High,
}

impl OutputEffort {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputEffort::None => "none",
            OutputEffort::Low => "low",
            OutputEffort::Medium => "medium",
            OutputEffort::High => "high",
        }
    }
}

impl fmt::Display for OutputEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputEffort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(OutputEffort::None),
            "low" => Ok(OutputEffort::Low),
            "medium" => Ok(OutputEffort::Medium),
            "high" => Ok(OutputEffort::High),
            other => Err(Error::InvalidInput(format!(
                "unknown output effort '{other}' (expected none, low, medium or high)"
            ))),
        }
    }
}

/// A base64-encoded image attached to the prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInput {
    /// MIME type (e.g. `"image/png"`).
    pub mimetype: String,
    /// Base64 payload, without the `data:` prefix.
    pub data: String,
    /// Pixel width, used only for token estimation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height, used only for token estimation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageInput {
    pub fn new(mimetype: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mimetype: mimetype.into(),
            data: data.into(),
            width: None,
            height: None,
        }
    }

    /// Attach pixel dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// `data:<mimetype>;base64,<data>` URI.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mimetype, self.data)
    }
}

/// Everything a caller may tune on a single answer, besides the prompt.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswerOptions {
    /// Cap on generated tokens; clamped to the model's output limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_budget: Option<u32>,
    pub output_type: OutputType,
    /// Free-form style label, read only by generation-style adapters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_effort: Option<OutputEffort>,
    /// Opaque end-user attribution string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageInput>,
}

impl AnswerOptions {
    pub fn with_budget(mut self, budget: u32) -> Self {
        self.output_budget = Some(budget);
        self
    }

    pub fn with_effort(mut self, effort: OutputEffort) -> Self {
        self.output_effort = Some(effort);
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.output_style = Some(style.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.images.push(image);
        self
    }

    pub fn json(mut self) -> Self {
        self.output_type = OutputType::Json;
        self
    }

    /// The effort to send, if any: unset and `none` both mean "no reasoning".
    pub fn requested_effort(&self) -> Option<OutputEffort> {
        self.output_effort.filter(|e| *e != OutputEffort::None)
    }

    /// Fail fast on values no vendor accepts.
    pub fn validate(&self) -> crate::Result<()> {
        if self.output_budget == Some(0) {
            return Err(Error::InvalidInput(
                "outputBudget must be a positive integer".into(),
            ));
        }
        if let Some(image) = self.images.iter().find(|i| i.data.is_empty()) {
            return Err(Error::InvalidInput(format!(
                "image of type {} has no data",
                image.mimetype
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Result
// ─────────────────────────────────────────────

/// Normalized answer.
///
/// `output_tokens + thinking_tokens` equals the vendor's billed generation
/// tokens: reasoning tokens are never counted twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub output: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub thinking_tokens: u32,
}

impl AnswerResult {
    /// Build from a vendor total that already includes reasoning tokens.
    pub fn from_inclusive_total(
        output: String,
        input_tokens: u32,
        total_output_tokens: u32,
        reasoning_tokens: u32,
    ) -> Self {
        Self {
            output,
            input_tokens,
            output_tokens: total_output_tokens.saturating_sub(reasoning_tokens),
            thinking_tokens: reasoning_tokens.min(total_output_tokens),
        }
    }

    /// Billed generation tokens (visible output plus reasoning).
    pub fn generated_tokens(&self) -> u32 {
        self.output_tokens.saturating_add(self.thinking_tokens)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_model_id() {
        assert_eq!(
            split_model_id("anthropic/claude-3-7-sonnet-20250219"),
            Some(("anthropic", "claude-3-7-sonnet-20250219"))
        );
        assert_eq!(
            split_model_id("openrouter/meta/llama-3"),
            Some(("openrouter", "meta/llama-3"))
        );
        assert_eq!(split_model_id("gpt-4o"), None);
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let opts: AnswerOptions = serde_json::from_value(json!({
            "outputBudget": 500,
            "outputType": "json",
            "outputEffort": "high",
            "identifier": "user-1",
            "images": [{"mimetype": "image/png", "data": "abc"}]
        }))
        .unwrap();

        assert_eq!(opts.output_budget, Some(500));
        assert_eq!(opts.output_type, OutputType::Json);
        assert_eq!(opts.output_effort, Some(OutputEffort::High));
        assert_eq!(opts.images.len(), 1);
    }

    #[test]
    fn test_options_default_is_text() {
        let opts: AnswerOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(opts.output_type, OutputType::Text);
        assert!(opts.output_budget.is_none());
        assert!(opts.images.is_empty());
    }

    #[test]
    fn test_requested_effort_skips_none() {
        let opts = AnswerOptions::default().with_effort(OutputEffort::None);
        assert_eq!(opts.requested_effort(), None);
        let opts = AnswerOptions::default().with_effort(OutputEffort::Low);
        assert_eq!(opts.requested_effort(), Some(OutputEffort::Low));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let err = AnswerOptions::default().with_budget(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_effort_from_str() {
        assert_eq!("medium".parse::<OutputEffort>().unwrap(), OutputEffort::Medium);
        assert!("extreme".parse::<OutputEffort>().is_err());
    }

    #[test]
    fn test_image_data_uri() {
        let image = ImageInput::new("image/png", "base64data");
        assert_eq!(image.data_uri(), "data:image/png;base64,base64data");
    }

    #[test]
    fn test_inclusive_total_subtracts_reasoning() {
        let result = AnswerResult::from_inclusive_total("ok".into(), 10, 30, 5);
        assert_eq!(result.output_tokens, 25);
        assert_eq!(result.thinking_tokens, 5);
        assert_eq!(result.generated_tokens(), 30);
    }

    #[test]
    fn test_inclusive_total_never_negative() {
        // A vendor reporting more reasoning than total must not underflow.
        let result = AnswerResult::from_inclusive_total("ok".into(), 1, 3, 7);
        assert_eq!(result.output_tokens, 0);
        assert_eq!(result.thinking_tokens, 3);
        assert_eq!(result.generated_tokens(), 3);
    }

    #[test]
    fn test_generated_tokens_saturates() {
        let result = AnswerResult {
            output: String::new(),
            input_tokens: 0,
            output_tokens: u32::MAX - 1,
            thinking_tokens: 10,
        };
        assert_eq!(result.generated_tokens(), u32::MAX);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = AnswerResult {
            output: "hi".into(),
            input_tokens: 1,
            output_tokens: 2,
            thinking_tokens: 0,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["inputTokens"], 1);
        assert_eq!(json["thinkingTokens"], 0);
    }
}
