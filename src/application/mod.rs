//! Application layer - orchestration and use-case handlers.

pub mod handlers;
pub mod orchestrator;

pub use orchestrator::{PipelineOrchestrator, StageModels};
