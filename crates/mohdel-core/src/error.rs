//! Error taxonomy shared by every Mohdel crate.
//!
//! Resolution and validation failures are raised before any network call.
//! Vendor failures arrive as [`Error::Transport`], already classified by the
//! provider's error interpreter into [`ErrorCode::Retryable`] or
//! [`ErrorCode::Rejected`]. Nothing in the core retries on its own.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause of a transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ─────────────────────────────────────────────
// Retry classification
// ─────────────────────────────────────────────

/// Two-bucket retry taxonomy for vendor failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transient: rate limit, overload, server error, network hiccup.
    Retryable,
    /// Permanent for this request: bad input, auth, unknown model.
    Rejected,
}

impl ErrorCode {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorCode::Retryable)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Retryable => write!(f, "RETRYABLE"),
            ErrorCode::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Output of a provider's error interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpretedError {
    pub message: String,
    pub code: ErrorCode,
}

impl InterpretedError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: ErrorCode::Retryable,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: ErrorCode::Rejected,
        }
    }
}

// ─────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────

/// Errors that can occur while resolving a model or answering a prompt.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller passed something unusable (empty id, zero budget...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The resolved id names a provider absent from the registry.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// An alias matches more than one canonical id.
    #[error("ambiguous model name \"{alias}\" matches multiple models: {list}", list = .matches.join(", "))]
    AmbiguousAlias { alias: String, matches: Vec<String> },

    /// The fully expanded id is not in the catalog.
    #[error("model {0} is not in the curated list")]
    ModelNotCurated(String),

    /// No credential found under the provider's env var.
    #[error("API key not found for {provider} (env var: {env_var})")]
    MissingCredential { provider: String, env_var: String },

    /// No id given and no default model configured.
    #[error("no model id given and no default model configured")]
    NoDefaultModel,

    /// The vendor call failed; already interpreted.
    #[error("{provider} error ({code}): {message}")]
    Transport {
        provider: String,
        message: String,
        code: ErrorCode,
        #[source]
        source: BoxError,
    },

    /// The request asks for something the model or adapter cannot do.
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// The HTTP client could not be constructed (TLS backend, bad timeout...).
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Malformed catalog data.
    #[error("invalid catalog: {0}")]
    Catalog(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Retry classification, only present on transport failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Transport { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_some_and(ErrorCode::is_retryable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_alias_lists_every_match() {
        let err = Error::AmbiguousAlias {
            alias: "shared-name".into(),
            matches: vec!["p1/shared-name".into(), "p2/shared-name".into()],
        };
        assert_eq!(
            err.to_string(),
            "ambiguous model name \"shared-name\" matches multiple models: p1/shared-name, p2/shared-name"
        );
    }

    #[test]
    fn missing_credential_names_env_var() {
        let err = Error::MissingCredential {
            provider: "anthropic".into(),
            env_var: "ANTHROPIC_API_SK".into(),
        };
        assert!(err.to_string().contains("ANTHROPIC_API_SK"));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn transport_error_carries_code_and_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = Error::Transport {
            provider: "openai".into(),
            message: "Rate limit exceeded".into(),
            code: ErrorCode::Retryable,
            source: Box::new(cause),
        };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "openai error (RETRYABLE): Rate limit exceeded");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn error_code_serializes_screaming() {
        let json = serde_json::to_string(&ErrorCode::Rejected).unwrap();
        assert_eq!(json, "\"REJECTED\"");
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
