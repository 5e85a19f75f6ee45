//! Scripted model client for testing.
//!
//! Replies are consumed in the order they were queued; once the queue is
//! empty every further call gets a generic success. Each request is
//! captured so tests can assert on the prompts the pipeline built.
//!
//! # Example
//!
//! ```ignore
//! let client = ScriptedModelClient::new()
//!     .then_text("analysis output")
//!     .then_error(ModelError::RateLimited { retry_after_secs: 1 });
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{ModelClient, ModelError, ModelRequest, ModelResponse, ProviderInfo};

/// One queued reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Error(ModelError),
}

/// Model client that replays a scripted sequence of replies.
#[derive(Debug, Clone)]
pub struct ScriptedModelClient {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    /// Simulated latency per call.
    delay: Duration,
}

impl Default for ScriptedModelClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModelClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Queues a reply.
    pub fn then(self, reply: ScriptedReply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Queues a successful text reply.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then(ScriptedReply::Text(text.into()))
    }

    /// Queues an error reply.
    pub fn then_error(self, error: ModelError) -> Self {
        self.then(ScriptedReply::Error(error))
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Handle to the captured requests, usable after the client is moved.
    pub fn requests(&self) -> Arc<Mutex<Vec<ModelRequest>>> {
        Arc::clone(&self.requests)
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_reply(&self) -> ScriptedReply {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::Text("scripted response".to_string()))
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            ScriptedReply::Text(text) => Ok(ModelResponse { text, model }),
            ScriptedReply::Error(err) => Err(err),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "scripted".to_string(),
            reasoning_model: "scripted-reasoning".to_string(),
            fast_model: "scripted-fast".to_string(),
        }
    }
}
