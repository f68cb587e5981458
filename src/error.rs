//! Umbrella error type for ingestion operations
//!
//! Errors crossing the facade boundary are sanitized first: connection URLs
//! carry live signatures and credentials resolve from the environment, so
//! raw causes must never leak into logs or status strings verbatim.

use crate::config::ConfigError;
use crate::transport::MqttError;
use thiserror::Error;

/// Top-level error for the ingestion client.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] MqttError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Strip secrets from a message before it reaches status strings or logs.
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = message.to_string();

    // Common secret patterns
    sanitized = regex::Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+")
        .unwrap()
        .replace_all(&sanitized, "${1}=***")
        .to_string();

    // Presigned query parameters embed the signature and the access key id
    sanitized = regex::Regex::new(r"X-Amz-(Signature|Credential)=[^&\s]+")
        .unwrap()
        .replace_all(&sanitized, "X-Amz-${1}=***")
        .to_string();

    // File paths that commonly hold credentials
    sanitized =
        regex::Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
            .unwrap()
            .replace_all(&sanitized, "/***REDACTED***/")
            .to_string();

    // Truncate very long messages - ensure total length is <= 500. Broker
    // and OS error text may carry multibyte characters, so back off to the
    // nearest char boundary instead of slicing at a fixed byte index.
    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let mut max_content_len = 500 - truncate_suffix.len();
        while !sanitized.is_char_boundary(max_content_len) {
            max_content_len -= 1;
        }
        sanitized.truncate(max_content_len);
        sanitized.push_str(truncate_suffix);
    }

    sanitized
}
