//! Stage definitions - the fixed three steps of the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::foundation::Timestamp;

/// One sequential step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Deep psychological analysis of the dilemma.
    Analysis,
    /// Selection of a single course of action.
    Arbitration,
    /// Deterministic conversion to the output schema.
    Formatting,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 3] = [Stage::Analysis, Stage::Arbitration, Stage::Formatting];

    /// One-based stage index (1-3).
    pub fn index(self) -> u8 {
        match self {
            Stage::Analysis => 1,
            Stage::Arbitration => 2,
            Stage::Formatting => 3,
        }
    }

    /// Human-readable stage name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Analysis => "deep_analysis",
            Stage::Arbitration => "decision_arbitration",
            Stage::Formatting => "json_formatting",
        }
    }

    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Analysis => Some(Stage::Arbitration),
            Stage::Arbitration => Some(Stage::Formatting),
            Stage::Formatting => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which model variant a stage runs on.
///
/// Stages select a tier, not a concrete model id; the id is resolved from
/// configuration so tests can run against stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// High-reasoning model for analysis and arbitration.
    Reasoning,
    /// Smaller, faster variant for deterministic formatting.
    Fast,
}

/// Hint for the expected shape of the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    FreeText,
    Json,
}

/// Sampling and budget parameters for one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub tier: ModelTier,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub response_format: ResponseFormat,
}

impl StageConfig {
    /// Fixed configuration per stage.
    ///
    /// Analysis and arbitration use the reasoning tier with non-zero
    /// temperature; formatting runs at temperature 0 for reproducibility.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Analysis => Self {
                tier: ModelTier::Reasoning,
                temperature: 1.0,
                max_output_tokens: 8192,
                response_format: ResponseFormat::FreeText,
            },
            Stage::Arbitration => Self {
                tier: ModelTier::Reasoning,
                temperature: 1.0,
                max_output_tokens: 6000,
                response_format: ResponseFormat::FreeText,
            },
            Stage::Formatting => Self {
                tier: ModelTier::Fast,
                temperature: 0.0,
                max_output_tokens: 4000,
                response_format: ResponseFormat::Json,
            },
        }
    }
}

/// The immutable outcome of one stage invocation.
#[derive(Debug, Clone)]
pub struct StageResult {
    /// Which stage produced this result.
    pub stage: Stage,
    /// Raw text output from the model.
    pub output: String,
    /// Wall-clock time the stage took.
    pub elapsed: Duration,
    /// When the stage started.
    pub started_at: Timestamp,
    /// Concrete model id that served the request.
    pub model: String,
}

impl StageResult {
    pub fn new(
        stage: Stage,
        output: impl Into<String>,
        elapsed: Duration,
        started_at: Timestamp,
        model: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            output: output.into(),
            elapsed,
            started_at,
            model: model.into(),
        }
    }
}
