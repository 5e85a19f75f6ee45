//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Gemini API key
    pub gemini_api_key: Option<String>,

    /// Base URL for the Generative Language API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model for the analysis and arbitration stages
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,

    /// Model for the formatting stage
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Overall deadline for one pipeline run in seconds
    #[serde(default = "default_pipeline_timeout")]
    pub pipeline_timeout_secs: u64,
}

impl AiConfig {
    /// Get per-request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get pipeline deadline as Duration
    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }

    /// Check if a Gemini key is configured
    pub fn has_gemini(&self) -> bool {
        self.gemini_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_gemini() {
            return Err(ValidationError::MissingRequired("GEMINI_API_KEY"));
        }
        if self.pipeline_timeout_secs <= self.timeout_secs {
            return Err(ValidationError::PipelineTimeoutTooShort);
        }
        if self.max_retries > 3 {
            return Err(ValidationError::RetryBudgetTooLarge);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            base_url: default_base_url(),
            reasoning_model: default_reasoning_model(),
            fast_model: default_fast_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            pipeline_timeout_secs: default_pipeline_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_reasoning_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_fast_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    1
}

fn default_pipeline_timeout() -> u64 {
    120
}
