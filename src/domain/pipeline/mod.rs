//! Pipeline module - The three-stage dilemma pipeline.
//!
//! A run moves through analysis, arbitration, and formatting strictly in
//! order; each stage's prompt textually embeds the prior stage's output.

mod errors;
mod prompts;
mod run;
mod stage;

pub use errors::{FailureKind, FailureReport, RunStateError};
pub use prompts::{
    analysis_prompt, arbitration_prompt, formatting_prompt, system_prompt,
};
pub use run::{PipelineRun, RunState};
pub use stage::{ModelTier, ResponseFormat, Stage, StageConfig, StageResult};
