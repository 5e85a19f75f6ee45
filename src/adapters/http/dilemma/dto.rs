//! HTTP DTOs for the dilemma endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing
//! independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{StageTiming, SubmitDilemmaResult};
use crate::domain::dilemma::DecisionRecord;
use crate::ports::DecisionSummary;

/// Request body for POST /api/dilemmas.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitDilemmaRequest {
    /// The dilemma text to analyze.
    pub dilemma: String,
}

/// Response body for a completed pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionView {
    /// Identifier of the run that produced this decision.
    pub run_id: String,
    /// The structured decision record.
    pub record: DecisionRecord,
    /// Per-stage timing, in execution order.
    pub stages: Vec<StageTiming>,
    /// Wall time spent across all stages.
    pub total_elapsed_ms: u64,
}

impl From<SubmitDilemmaResult> for DecisionView {
    fn from(result: SubmitDilemmaResult) -> Self {
        Self {
            run_id: result.run_id.to_string(),
            record: result.record,
            stages: result.stages,
            total_elapsed_ms: result.total_elapsed_ms,
        }
    }
}

/// One row in the history listing.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntryView {
    pub run_id: String,
    pub dilemma_preview: String,
    pub decision: String,
    pub created_at: String,
    pub total_elapsed_ms: u64,
}

impl From<DecisionSummary> for HistoryEntryView {
    fn from(summary: DecisionSummary) -> Self {
        Self {
            run_id: summary.run_id.to_string(),
            dilemma_preview: summary.dilemma_preview,
            decision: summary.decision,
            created_at: summary.created_at.as_datetime().to_rfc3339(),
            total_elapsed_ms: summary.total_elapsed_ms,
        }
    }
}

/// Response body for GET /api/dilemmas/history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntryView>,
}

/// Query parameters for the history listing.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Response body for GET /api/health.
#[derive(Debug, Clone, Serialize)]
pub struct HealthView {
    pub status: &'static str,
    pub provider: String,
    pub reasoning_model: String,
    pub fast_model: String,
}

/// Response body for GET /api/models.
#[derive(Debug, Clone, Serialize)]
pub struct ModelsView {
    pub provider: String,
    pub reasoning_model: String,
    pub fast_model: String,
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Stage the pipeline failed in, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            stage: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}
