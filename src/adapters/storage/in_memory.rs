//! In-memory RunRepository.
//!
//! Backs tests and local development. Runs and decisions are held in
//! plain maps behind an async lock; nothing survives process exit.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::dilemma::DecisionRecord;
use crate::domain::foundation::{RunId, UserId};
use crate::domain::pipeline::PipelineRun;
use crate::ports::{DecisionSummary, RepositoryError, RunRepository};

/// Characters of the dilemma shown in history listings.
const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone)]
struct StoredRun {
    run: PipelineRun,
    owner: UserId,
}

#[derive(Debug, Clone)]
struct StoredDecision {
    record: DecisionRecord,
    owner: UserId,
}

/// In-memory storage for pipeline runs and decision records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunRepository {
    runs: Arc<RwLock<HashMap<RunId, StoredRun>>>,
    decisions: Arc<RwLock<HashMap<RunId, StoredDecision>>>,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored runs, for test assertions.
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Number of stored decisions, for test assertions.
    pub async fn decision_count(&self) -> usize {
        self.decisions.read().await.len()
    }
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn save_run(&self, run: &PipelineRun, owner: &UserId) -> Result<(), RepositoryError> {
        let mut runs = self.runs.write().await;
        runs.insert(
            run.id(),
            StoredRun {
                run: run.clone(),
                owner: owner.clone(),
            },
        );
        Ok(())
    }

    async fn save_decision(
        &self,
        run_id: RunId,
        record: &DecisionRecord,
        owner: &UserId,
    ) -> Result<(), RepositoryError> {
        let mut decisions = self.decisions.write().await;
        decisions.insert(
            run_id,
            StoredDecision {
                record: record.clone(),
                owner: owner.clone(),
            },
        );
        Ok(())
    }

    async fn find_decision(&self, run_id: RunId) -> Result<Option<DecisionRecord>, RepositoryError> {
        let decisions = self.decisions.read().await;
        Ok(decisions.get(&run_id).map(|d| d.record.clone()))
    }

    async fn list_recent(
        &self,
        owner: &UserId,
        limit: u32,
    ) -> Result<Vec<DecisionSummary>, RepositoryError> {
        let decisions = self.decisions.read().await;
        let runs = self.runs.read().await;

        let mut summaries: Vec<DecisionSummary> = decisions
            .iter()
            .filter(|(_, d)| &d.owner == owner)
            .map(|(run_id, d)| {
                let stored_run = runs.get(run_id);
                DecisionSummary {
                    run_id: *run_id,
                    dilemma_preview: stored_run
                        .map(|s| s.run.input().preview(PREVIEW_CHARS))
                        .unwrap_or_default(),
                    decision: d.record.decision.clone(),
                    created_at: d.record.created_at,
                    total_elapsed_ms: stored_run
                        .map(|s| s.run.total_elapsed().as_millis() as u64)
                        .unwrap_or(0),
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.created_at.as_datetime().cmp(&a.created_at.as_datetime()));
        summaries.truncate(limit as usize);
        Ok(summaries)
    }
}
