//! Generator trait for abstracting the answer-producing model call.

use std::time::Duration;

use serde::Serialize;

use crate::prompt::Prompt;

/// Why a generation call failed.
///
/// Every category escalates the question; the category is reported to the
/// caller as `generation_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum GenerationError {
    #[error("generation rate limited")]
    RateLimited,
    #[error("generation quota exceeded")]
    QuotaExceeded,
    #[error("generation service unavailable")]
    Unavailable,
    #[error("generation failed")]
    Unknown,
}

impl GenerationError {
    /// Whether retrying later could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Unavailable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }
}

/// A single-shot text generator.
///
/// Implementations make exactly one outbound call per invocation, never
/// retry, and fail with [`GenerationError::Unavailable`] once `timeout`
/// elapses.
#[async_trait::async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generator name for logs
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &Prompt, timeout: Duration) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_categories() {
        assert!(GenerationError::RateLimited.is_transient());
        assert!(GenerationError::Unavailable.is_transient());
        assert!(!GenerationError::QuotaExceeded.is_transient());
        assert!(!GenerationError::Unknown.is_transient());
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&GenerationError::QuotaExceeded).unwrap();
        assert_eq!(json, "\"quota_exceeded\"");
        assert_eq!(GenerationError::RateLimited.as_str(), "rate_limited");
    }
}
