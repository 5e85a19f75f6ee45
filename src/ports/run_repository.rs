//! Run Repository Port - persistence for runs and decision records.
//!
//! Storage backend selection (embedded vs networked) happens at wiring
//! time; the pipeline core only sees this trait.

use async_trait::async_trait;

use crate::domain::dilemma::DecisionRecord;
use crate::domain::foundation::{RunId, Timestamp, UserId};
use crate::domain::pipeline::PipelineRun;

/// Persistence errors, already detached from backend specifics.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Compact decision row for history listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecisionSummary {
    pub run_id: RunId,
    pub dilemma_preview: String,
    pub decision: String,
    pub created_at: Timestamp,
    pub total_elapsed_ms: u64,
}

/// Port for storing finished runs and their decision records.
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Persists a terminal run (completed or failed) with its stage results.
    async fn save_run(&self, run: &PipelineRun, owner: &UserId) -> Result<(), RepositoryError>;

    /// Persists the decision record produced by a completed run.
    async fn save_decision(
        &self,
        run_id: RunId,
        record: &DecisionRecord,
        owner: &UserId,
    ) -> Result<(), RepositoryError>;

    /// Loads a stored decision record by run id.
    async fn find_decision(&self, run_id: RunId) -> Result<Option<DecisionRecord>, RepositoryError>;

    /// Lists the owner's most recent decisions, newest first.
    async fn list_recent(
        &self,
        owner: &UserId,
        limit: u32,
    ) -> Result<Vec<DecisionSummary>, RepositoryError>;
}
