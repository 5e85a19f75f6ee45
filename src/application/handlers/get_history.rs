//! GetHistoryHandler - recent decisions for one owner.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::ports::{DecisionSummary, RepositoryError, RunRepository};

/// Most recent decisions returned when no explicit limit is given.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Query for an owner's decision history.
#[derive(Debug, Clone)]
pub struct GetHistoryQuery {
    pub owner: UserId,
    pub limit: Option<u32>,
}

pub struct GetHistoryHandler {
    repository: Arc<dyn RunRepository>,
}

impl GetHistoryHandler {
    pub fn new(repository: Arc<dyn RunRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: GetHistoryQuery,
    ) -> Result<Vec<DecisionSummary>, RepositoryError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .min(DEFAULT_HISTORY_LIMIT);
        self.repository.list_recent(&query.owner, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryRunRepository;
    use crate::domain::dilemma::{DecisionRecord, DilemmaInput};
    use crate::domain::pipeline::PipelineRun;
    use crate::ports::RunRepository as _;

    fn record(decision: &str) -> DecisionRecord {
        DecisionRecord {
            decision: decision.to_string(),
            rationale: "because".to_string(),
            risks: vec!["a risk".to_string()],
            action_plan: vec!["a step".to_string()],
            emotions: None,
            distortions: None,
            affirmation: None,
            created_at: crate::domain::foundation::Timestamp::now(),
        }
    }

    async fn seed(repo: &InMemoryRunRepository, owner: &UserId, decision: &str) {
        let input =
            DilemmaInput::new("Should I quit my stable job to join a risky startup?").unwrap();
        let run = PipelineRun::new(input);
        repo.save_run(&run, owner).await.unwrap();
        repo.save_decision(run.id(), &record(decision), owner)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn lists_only_the_owners_decisions() {
        let repo = Arc::new(InMemoryRunRepository::new());
        let alice = UserId::new("alice").unwrap();
        let bob = UserId::new("bob").unwrap();
        seed(&repo, &alice, "stay").await;
        seed(&repo, &bob, "leave").await;

        let handler = GetHistoryHandler::new(repo);
        let summaries = handler
            .handle(GetHistoryQuery {
                owner: alice,
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].decision, "stay");
    }

    #[tokio::test]
    async fn caps_the_requested_limit() {
        let repo = Arc::new(InMemoryRunRepository::new());
        let owner = UserId::new("alice").unwrap();
        for i in 0..25 {
            seed(&repo, &owner, &format!("decision {i}")).await;
        }

        let handler = GetHistoryHandler::new(repo);
        let summaries = handler
            .handle(GetHistoryQuery {
                owner,
                limit: Some(100),
            })
            .await
            .unwrap();

        assert_eq!(summaries.len(), DEFAULT_HISTORY_LIMIT as usize);
    }
}
