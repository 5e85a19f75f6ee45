//! AI adapters - model clients behind the ModelClient port.

mod gemini_provider;
mod mock_provider;

pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use mock_provider::{ScriptedModelClient, ScriptedReply};
