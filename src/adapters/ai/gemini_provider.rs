//! Gemini Provider - ModelClient implementation for Google's Generative
//! Language API.
//!
//! Calls the `generateContent` endpoint. Retries are the orchestrator's
//! job; this adapter makes exactly one attempt per invocation and maps
//! transport and status failures onto ModelError.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_base_url("https://generativelanguage.googleapis.com");
//!
//! let provider = GeminiProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::pipeline::ResponseFormat;
use crate::ports::{ModelClient, ModelError, ModelRequest, ModelResponse, ProviderInfo};

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Model used for the reasoning-heavy stages.
    pub reasoning_model: String,
    /// Model used for the deterministic formatting stage.
    pub fast_model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            reasoning_model: "gemini-3-pro-preview".to_string(),
            fast_model: "gemini-2.0-flash-exp".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_reasoning_model(mut self, model: impl Into<String>) -> Self {
        self.reasoning_model = model.into();
        self
    }

    pub fn with_fast_model(mut self, model: impl Into<String>) -> Self {
        self.fast_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, model
        )
    }

    fn to_gemini_request(&self, request: &ModelRequest) -> GeminiRequest {
        let response_mime_type = match request.response_format {
            ResponseFormat::Json => Some("application/json".to_string()),
            ResponseFormat::FreeText => None,
        };

        GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system_prompt.as_ref().map(|text| Content {
                role: None,
                parts: vec![Part { text: text.clone() }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                response_mime_type,
            },
        }
    }

    async fn send_request(&self, request: &ModelRequest) -> Result<Response, ModelError> {
        let body = self.to_gemini_request(request);

        self.client
            .post(self.generate_url(&request.model))
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    ModelError::Network(format!("connection failed: {e}"))
                } else {
                    ModelError::Network(e.to_string())
                }
            })
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, ModelError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(ModelError::AuthenticationFailed),
            429 => Err(ModelError::RateLimited {
                retry_after_secs: parse_retry_after(&error_body),
            }),
            code => Err(ModelError::Provider {
                status: code,
                message: error_message(&error_body),
            }),
        }
    }

    async fn parse_response(&self, response: Response, model: &str) -> Result<ModelResponse, ModelError> {
        let response = self.handle_response_status(response).await?;

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Parse(format!("failed to decode response body: {e}")))?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| ModelError::Parse("response contained no candidates".to_string()))?;

        Ok(ModelResponse {
            text,
            model: model.to_string(),
        })
    }
}

/// Pulls retry timing out of a 429 body; defaults to 30 seconds.
fn parse_retry_after(error_body: &str) -> u32 {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
        let details = parsed
            .get("error")
            .and_then(|e| e.get("details"))
            .and_then(|d| d.as_array());
        if let Some(details) = details {
            for detail in details {
                if let Some(delay) = detail.get("retryDelay").and_then(|d| d.as_str()) {
                    if let Ok(secs) = delay.trim_end_matches('s').parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
    }
    30
}

/// Extracts the human-readable message from a Gemini error body.
fn error_message(error_body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| error_body.to_string())
}

#[async_trait]
impl ModelClient for GeminiProvider {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let response = self.send_request(&request).await?;
        self.parse_response(response, &request.model).await
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "gemini".to_string(),
            reasoning_model: self.config.reasoning_model.clone(),
            fast_model: self.config.fast_model.clone(),
        }
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new("test-key")
            .with_base_url("https://custom.example.com")
            .with_reasoning_model("reason-x")
            .with_fast_model("fast-x")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.base_url, "https://custom.example.com");
        assert_eq!(config.reasoning_model, "reason-x");
        assert_eq!(config.fast_model, "fast-x");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn generate_url_embeds_the_model() {
        let provider = GeminiProvider::new(GeminiConfig::new("k")).unwrap();
        assert_eq!(
            provider.generate_url("gemini-2.0-flash-exp"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn json_requests_set_the_mime_type() {
        let provider = GeminiProvider::new(GeminiConfig::new("k")).unwrap();
        let request = ModelRequest::new("prompt", "m")
            .with_response_format(ResponseFormat::Json)
            .with_temperature(0.0)
            .with_max_output_tokens(4000);

        let body = provider.to_gemini_request(&request);

        assert_eq!(
            body.generation_config.response_mime_type.as_deref(),
            Some("application/json")
        );
        assert_eq!(body.generation_config.temperature, 0.0);
        assert_eq!(body.generation_config.max_output_tokens, 4000);
    }

    #[test]
    fn free_text_requests_omit_the_mime_type() {
        let provider = GeminiProvider::new(GeminiConfig::new("k")).unwrap();
        let request = ModelRequest::new("prompt", "m");

        let body = provider.to_gemini_request(&request);
        assert!(body.generation_config.response_mime_type.is_none());
    }

    #[test]
    fn system_prompt_becomes_system_instruction() {
        let provider = GeminiProvider::new(GeminiConfig::new("k")).unwrap();
        let request = ModelRequest::new("prompt", "m").with_system_prompt("persona");

        let body = provider.to_gemini_request(&request);
        let instruction = body.system_instruction.unwrap();
        assert_eq!(instruction.parts[0].text, "persona");
    }

    #[test]
    fn retry_after_is_parsed_from_error_details() {
        let body = r#"{"error":{"code":429,"details":[{"retryDelay":"12s"}]}}"#;
        assert_eq!(parse_retry_after(body), 12);
    }

    #[test]
    fn retry_after_defaults_when_absent() {
        assert_eq!(parse_retry_after("not json"), 30);
    }

    #[test]
    fn error_message_is_extracted() {
        let body = r#"{"error":{"code":500,"message":"internal error"}}"#;
        assert_eq!(error_message(body), "internal error");
    }
}
