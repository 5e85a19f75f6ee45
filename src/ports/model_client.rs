//! Model Client Port - interface to the generative-language-model provider.
//!
//! A request is one prompt plus sampling parameters; the response is raw
//! text. No local state is mutated by an invocation, so stub clients can
//! stand in for the real provider in tests.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::pipeline::ResponseFormat;

/// Port for outbound model invocations.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one prompt and returns the generated text.
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Provider identification for health reporting.
    fn provider_info(&self) -> ProviderInfo;
}

/// One model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// The complete prompt text.
    pub prompt: String,
    /// Optional persona/system instruction.
    pub system_prompt: Option<String>,
    /// Concrete model id to invoke.
    pub model: String,
    /// Sampling temperature in [0, 2].
    pub temperature: f32,
    /// Output token cap.
    pub max_output_tokens: u32,
    /// Expected output shape hint.
    pub response_format: ResponseFormat,
}

impl ModelRequest {
    /// Creates a free-text request with default sampling.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            model: model.into(),
            temperature: 1.0,
            max_output_tokens: 4096,
            response_format: ResponseFormat::FreeText,
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output token cap.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    /// Sets the response format hint.
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// Raw text result of a model invocation.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Generated text.
    pub text: String,
    /// Model that served the request.
    pub model: String,
}

/// Provider identification.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub name: String,
    pub reasoning_model: String,
    pub fast_model: String,
}

/// Model invocation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Upstream service returned a non-success status.
    #[error("provider error {status}: {message}")]
    Provider { status: u16, message: String },

    /// Throttled by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// No response within the bounded wait.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network failure before a status was received.
    #[error("network error: {0}")]
    Network(String),

    /// Provider response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ModelError {
    /// True when a bounded retry of the same request may succeed.
    ///
    /// Only rate limiting and timeouts qualify; provider and schema errors
    /// are not retried with identical input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::RateLimited { .. } | ModelError::Timeout { .. }
        )
    }
}

/// Explicit bounded-retry policy passed alongside model invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles per subsequent retry.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// One retry with a one-second initial backoff.
    pub fn bounded() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::from_secs(1),
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Backoff before retry number `retry` (zero-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::bounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_works() {
        let request = ModelRequest::new("prompt text", "model-a")
            .with_system_prompt("be concise")
            .with_temperature(0.0)
            .with_max_output_tokens(128)
            .with_response_format(ResponseFormat::Json);

        assert_eq!(request.prompt, "prompt text");
        assert_eq!(request.system_prompt.as_deref(), Some("be concise"));
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_output_tokens, 128);
        assert_eq!(request.response_format, ResponseFormat::Json);
    }

    #[test]
    fn retryable_classification_covers_transients_only() {
        assert!(ModelError::RateLimited { retry_after_secs: 5 }.is_retryable());
        assert!(ModelError::Timeout { timeout_secs: 30 }.is_retryable());

        assert!(!ModelError::Provider {
            status: 500,
            message: "boom".to_string()
        }
        .is_retryable());
        assert!(!ModelError::AuthenticationFailed.is_retryable());
        assert!(!ModelError::Parse("bad body".to_string()).is_retryable());
        assert!(!ModelError::Network("reset".to_string()).is_retryable());
    }

    #[test]
    fn bounded_policy_allows_one_retry() {
        let policy = RetryPolicy::bounded();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }
}
