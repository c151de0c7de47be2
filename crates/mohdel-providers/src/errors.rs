//! Error interpreter: maps raw vendor failures to `{message, code}`.
//!
//! Every provider in the registry points at one of the `interpret_*`
//! functions below. Each knows two things about its vendor: where the human
//! message sits in the error envelope, and which statuses or error types mean
//! "try again later".

use mohdel_core::utils::truncate_string;
use mohdel_core::InterpretedError;
use serde_json::Value;
use thiserror::Error;

/// Longest slice of a raw body we keep in messages and logs.
const BODY_PREVIEW_CHARS: usize = 300;

/// HTTP statuses every vendor uses for transient failures.
const RETRYABLE_STATUSES: &[u16] = &[429, 500, 503];

// ─────────────────────────────────────────────
// Raw vendor errors
// ─────────────────────────────────────────────

/// A vendor call failure before interpretation.
#[derive(Debug, Error)]
pub enum VendorError {
    /// The vendor answered with a non-success status.
    #[error("HTTP {status}: {}", truncate_string(.body, BODY_PREVIEW_CHARS))]
    Http { status: u16, body: String },

    /// Connection refused, TLS failure, timeout...
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// A success status whose body is not the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl VendorError {
    pub fn status(&self) -> Option<u16> {
        match self {
            VendorError::Http { status, .. } => Some(*status),
            VendorError::Network(e) => e.status().map(|s| s.as_u16()),
            VendorError::Decode(_) => None,
        }
    }
}

/// Signature every provider's interpreter shares.
pub type InterpretFn = fn(&VendorError) -> InterpretedError;

// ─────────────────────────────────────────────
// Per-vendor interpreters
// ─────────────────────────────────────────────

/// Anthropic: `{"type":"error","error":{"type":"overloaded_error","message":"..."}}`.
pub fn interpret_anthropic(err: &VendorError) -> InterpretedError {
    const RETRYABLE_TYPES: &[&str] = &["rate_limit_error", "overloaded_error", "api_error"];

    interpret_with(err, |status, envelope| {
        let error = envelope.and_then(|v| v.get("error"));
        let kind = error.and_then(|e| str_field(e, "type"));
        let message = error.and_then(|e| str_field(e, "message"));
        // 529 is Anthropic's "overloaded" status.
        let retryable = RETRYABLE_STATUSES.contains(&status)
            || status == 529
            || kind.is_some_and(|k| RETRYABLE_TYPES.contains(&k));
        (message.map(String::from), retryable)
    })
}

/// OpenAI and every vendor speaking its error shape (DeepSeek, Groq, xAI):
/// `{"error":{"message":"...","type":"...","code":"..."}}`.
pub fn interpret_openai(err: &VendorError) -> InterpretedError {
    interpret_with(err, |status, envelope| {
        let error = envelope.and_then(|v| v.get("error"));
        let message = match error {
            Some(Value::String(s)) => Some(s.clone()),
            Some(e) => str_field(e, "message").map(String::from),
            None => None,
        };
        let flagged = |field: &str| {
            error
                .and_then(|e| str_field(e, field))
                .is_some_and(|v| v.contains("rate_limit") || v == "server_error")
        };
        let retryable = RETRYABLE_STATUSES.contains(&status) || flagged("type") || flagged("code");
        (message, retryable)
    })
}

/// Gemini: `{"error":{"code":429,"message":"...","status":"RESOURCE_EXHAUSTED"}}`.
pub fn interpret_gemini(err: &VendorError) -> InterpretedError {
    const RETRYABLE_STATES: &[&str] = &["RESOURCE_EXHAUSTED", "UNAVAILABLE", "INTERNAL"];

    interpret_with(err, |status, envelope| {
        let error = envelope.and_then(|v| v.get("error"));
        let message = error.and_then(|e| str_field(e, "message"));
        let state = error.and_then(|e| str_field(e, "status"));
        let retryable = RETRYABLE_STATUSES.contains(&status)
            || state.is_some_and(|s| RETRYABLE_STATES.contains(&s));
        (message.map(String::from), retryable)
    })
}

/// Shared skeleton: network errors retry, decode errors reject, HTTP errors
/// go through the vendor-specific `classify(status, parsed_body)`.
fn interpret_with<F>(err: &VendorError, classify: F) -> InterpretedError
where
    F: FnOnce(u16, Option<&Value>) -> (Option<String>, bool),
{
    match err {
        VendorError::Network(e) => InterpretedError::retryable(e.to_string()),
        VendorError::Decode(e) => {
            InterpretedError::rejected(format!("unexpected response body: {e}"))
        }
        VendorError::Http { status, body } => {
            let envelope: Option<Value> = serde_json::from_str(body).ok();
            let (message, retryable) = classify(*status, envelope.as_ref());
            let message = message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback_message(*status, body));
            if retryable {
                InterpretedError::retryable(message)
            } else {
                InterpretedError::rejected(message)
            }
        }
    }
}

fn fallback_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", truncate_string(body, BODY_PREVIEW_CHARS))
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mohdel_core::ErrorCode;
    use serde_json::json;

    fn http(status: u16, body: Value) -> VendorError {
        VendorError::Http {
            status,
            body: body.to_string(),
        }
    }

    // ── anthropic ──

    #[test]
    fn test_anthropic_overloaded_is_retryable() {
        let err = http(
            529,
            json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
        );
        let interpreted = interpret_anthropic(&err);
        assert_eq!(interpreted.code, ErrorCode::Retryable);
        assert_eq!(interpreted.message, "Overloaded");
    }

    #[test]
    fn test_anthropic_rate_limit_type_on_odd_status() {
        let err = http(
            400,
            json!({"error": {"type": "rate_limit_error", "message": "slow down"}}),
        );
        assert_eq!(interpret_anthropic(&err).code, ErrorCode::Retryable);
    }

    #[test]
    fn test_anthropic_invalid_request_is_rejected() {
        let err = http(
            400,
            json!({"error": {"type": "invalid_request_error", "message": "max_tokens: too large"}}),
        );
        let interpreted = interpret_anthropic(&err);
        assert_eq!(interpreted.code, ErrorCode::Rejected);
        assert_eq!(interpreted.message, "max_tokens: too large");
    }

    // ── openai-shaped ──

    #[test]
    fn test_openai_429_is_retryable() {
        let err = http(
            429,
            json!({"error": {"message": "Rate limit exceeded", "type": "requests", "code": "rate_limit_exceeded"}}),
        );
        let interpreted = interpret_openai(&err);
        assert_eq!(interpreted.code, ErrorCode::Retryable);
        assert_eq!(interpreted.message, "Rate limit exceeded");
    }

    #[test]
    fn test_openai_auth_is_rejected() {
        let err = http(
            401,
            json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "code": "invalid_api_key"}}),
        );
        assert_eq!(interpret_openai(&err).code, ErrorCode::Rejected);
    }

    #[test]
    fn test_openai_server_error_type() {
        let err = http(502, json!({"error": {"message": "upstream", "type": "server_error"}}));
        assert_eq!(interpret_openai(&err).code, ErrorCode::Retryable);
    }

    #[test]
    fn test_openai_string_error_field() {
        let err = http(400, json!({"error": "model not found"}));
        assert_eq!(interpret_openai(&err).message, "model not found");
    }

    // ── gemini ──

    #[test]
    fn test_gemini_resource_exhausted() {
        let err = http(
            400,
            json!({"error": {"code": 400, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}),
        );
        let interpreted = interpret_gemini(&err);
        assert_eq!(interpreted.code, ErrorCode::Retryable);
        assert_eq!(interpreted.message, "Quota exceeded");
    }

    #[test]
    fn test_gemini_invalid_argument() {
        let err = http(
            400,
            json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}),
        );
        assert_eq!(interpret_gemini(&err).code, ErrorCode::Rejected);
    }

    // ── fallbacks ──

    #[test]
    fn test_non_json_body_falls_back_to_status() {
        let err = VendorError::Http {
            status: 503,
            body: "<html>Service Unavailable</html>".into(),
        };
        let interpreted = interpret_openai(&err);
        assert_eq!(interpreted.code, ErrorCode::Retryable);
        assert!(interpreted.message.starts_with("HTTP 503"));
        assert!(interpreted.message.contains("Service Unavailable"));
    }

    #[test]
    fn test_empty_body() {
        let err = VendorError::Http {
            status: 404,
            body: String::new(),
        };
        assert_eq!(interpret_gemini(&err).message, "HTTP 404");
    }

    #[test]
    fn test_decode_error_is_rejected() {
        let json_err = serde_json::from_str::<Value>("{not json").unwrap_err();
        let err = VendorError::Decode(json_err);
        assert_eq!(interpret_anthropic(&err).code, ErrorCode::Rejected);
    }

    #[test]
    fn test_long_body_is_truncated_in_display() {
        let err = VendorError::Http {
            status: 500,
            body: "x".repeat(5000),
        };
        assert!(err.to_string().len() < 400);
        assert_eq!(err.status(), Some(500));
    }
}
