//! SubmitDilemmaHandler - the single inbound operation.
//!
//! Validates the input, drives the pipeline under an overall deadline,
//! persists the terminal run, and returns either a decision record with
//! timing metadata or a failure report. Never both, never a partial record.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::application::orchestrator::PipelineOrchestrator;
use crate::domain::dilemma::{DecisionRecord, DilemmaInput};
use crate::domain::foundation::{RunId, UserId};
use crate::domain::pipeline::{FailureKind, FailureReport, RunState, Stage};
use crate::ports::RunRepository;

/// Command to analyze one dilemma.
#[derive(Debug, Clone)]
pub struct SubmitDilemmaCommand {
    pub dilemma: String,
    pub owner: UserId,
}

/// Timing of one completed stage, surfaced to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub model: String,
    pub elapsed_ms: u64,
}

/// Successful outcome: the record plus run metadata.
#[derive(Debug, Clone)]
pub struct SubmitDilemmaResult {
    pub run_id: RunId,
    pub record: DecisionRecord,
    pub stages: Vec<StageTiming>,
    pub total_elapsed_ms: u64,
}

/// Handles dilemma submissions end to end.
pub struct SubmitDilemmaHandler {
    orchestrator: Arc<PipelineOrchestrator>,
    repository: Arc<dyn RunRepository>,
    /// Overall deadline for one run; exceeding it abandons the run.
    pipeline_timeout: Duration,
}

impl SubmitDilemmaHandler {
    pub fn new(
        orchestrator: Arc<PipelineOrchestrator>,
        repository: Arc<dyn RunRepository>,
        pipeline_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            repository,
            pipeline_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitDilemmaCommand,
    ) -> Result<SubmitDilemmaResult, FailureReport> {
        // Length bounds are enforced before any model call is made.
        let input = DilemmaInput::new(cmd.dilemma)
            .map_err(|e| FailureReport::invalid_input(e.to_string()))?;

        let run = match tokio::time::timeout(
            self.pipeline_timeout,
            self.orchestrator.execute(input),
        )
        .await
        {
            Ok(run) => run,
            Err(_) => {
                // Best-effort cancellation: the in-flight model call may
                // still finish server-side, but its result is discarded.
                warn!(
                    timeout_secs = self.pipeline_timeout.as_secs(),
                    "pipeline exceeded overall deadline, abandoning run"
                );
                return Err(FailureReport::new(
                    None,
                    FailureKind::Timeout,
                    format!(
                        "pipeline exceeded the {}s deadline",
                        self.pipeline_timeout.as_secs()
                    ),
                ));
            }
        };

        self.repository
            .save_run(&run, &cmd.owner)
            .await
            .map_err(|e| FailureReport::new(None, FailureKind::Internal, e.to_string()))?;

        match run.state() {
            RunState::Completed => {
                let record = run
                    .record()
                    .cloned()
                    .ok_or_else(|| {
                        FailureReport::new(
                            None,
                            FailureKind::Internal,
                            "completed run is missing its record",
                        )
                    })?;

                self.repository
                    .save_decision(run.id(), &record, &cmd.owner)
                    .await
                    .map_err(|e| {
                        FailureReport::new(None, FailureKind::Internal, e.to_string())
                    })?;

                info!(run_id = %run.id(), owner = %cmd.owner, "decision persisted");

                let stages = run
                    .stage_results()
                    .iter()
                    .map(|r| StageTiming {
                        stage: r.stage,
                        model: r.model.clone(),
                        elapsed_ms: r.elapsed.as_millis() as u64,
                    })
                    .collect();

                Ok(SubmitDilemmaResult {
                    run_id: run.id(),
                    record,
                    stages,
                    total_elapsed_ms: run.total_elapsed().as_millis() as u64,
                })
            }
            RunState::Failed(report) => Err(report.clone()),
            other => Err(FailureReport::new(
                None,
                FailureKind::Internal,
                format!("run ended in non-terminal state {:?}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::ScriptedModelClient;
    use crate::adapters::storage::InMemoryRunRepository;
    use crate::application::orchestrator::StageModels;
    use crate::ports::RetryPolicy;

    const RECORD_JSON: &str = r#"{
        "decision": "Join the startup",
        "rationale": "Growth outweighs the risk",
        "risks": ["Nine months of runway"],
        "action_plan": ["Give notice", "Build a budget"]
    }"#;

    fn handler_with(
        client: ScriptedModelClient,
        repository: Arc<InMemoryRunRepository>,
    ) -> SubmitDilemmaHandler {
        let orchestrator = PipelineOrchestrator::new(
            Arc::new(client),
            StageModels {
                reasoning: "reason-model".to_string(),
                fast: "fast-model".to_string(),
            },
            RetryPolicy {
                max_retries: 1,
                initial_backoff: Duration::from_millis(1),
            },
        );
        SubmitDilemmaHandler::new(
            Arc::new(orchestrator),
            repository,
            Duration::from_secs(30),
        )
    }

    fn owner() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn command(dilemma: &str) -> SubmitDilemmaCommand {
        SubmitDilemmaCommand {
            dilemma: dilemma.to_string(),
            owner: owner(),
        }
    }

    #[tokio::test]
    async fn returns_record_with_stage_timing() {
        let repo = Arc::new(InMemoryRunRepository::new());
        let client = ScriptedModelClient::new()
            .then_text("analysis")
            .then_text("arbitration")
            .then_text(RECORD_JSON);

        let result = handler_with(client, repo.clone())
            .handle(command("Should I quit my stable job to join a risky startup?"))
            .await
            .unwrap();

        assert_eq!(result.record.decision, "Join the startup");
        assert!(!result.record.risks.is_empty());
        assert_eq!(result.stages.len(), 3);
        assert_eq!(result.stages[0].stage, Stage::Analysis);

        let stored = repo.find_decision(result.run_id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn rejects_short_input_without_model_calls() {
        let repo = Arc::new(InMemoryRunRepository::new());
        let client = ScriptedModelClient::new();
        let captured = client.requests();

        let err = handler_with(client, repo)
            .handle(command("Too short"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::InvalidInput);
        assert_eq!(captured.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn rejects_long_input_without_model_calls() {
        let repo = Arc::new(InMemoryRunRepository::new());
        let client = ScriptedModelClient::new();
        let captured = client.requests();

        let err = handler_with(client, repo)
            .handle(command(&"x".repeat(3001)))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::InvalidInput);
        assert_eq!(captured.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn failed_run_persists_no_decision() {
        let repo = Arc::new(InMemoryRunRepository::new());
        let client = ScriptedModelClient::new()
            .then_text("analysis")
            .then_text("arbitration")
            .then_text("unrecoverable garbage");

        let err = handler_with(client, repo.clone())
            .handle(command("Should I quit my stable job to join a risky startup?"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::Coercion);
        assert_eq!(err.stage, Some(Stage::Formatting));
        assert_eq!(repo.decision_count().await, 0);
        // The failed run itself is still recorded for diagnostics
        assert_eq!(repo.run_count().await, 1);
    }

    #[tokio::test]
    async fn deadline_overrun_becomes_timeout_report() {
        let repo = Arc::new(InMemoryRunRepository::new());
        let client = ScriptedModelClient::new()
            .with_delay(Duration::from_millis(200))
            .then_text("analysis");

        let orchestrator = PipelineOrchestrator::new(
            Arc::new(client),
            StageModels {
                reasoning: "reason-model".to_string(),
                fast: "fast-model".to_string(),
            },
            RetryPolicy::none(),
        );
        let handler = SubmitDilemmaHandler::new(
            Arc::new(orchestrator),
            repo.clone(),
            Duration::from_millis(20),
        );

        let err = handler
            .handle(command("Should I quit my stable job to join a risky startup?"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::Timeout);
        assert_eq!(repo.decision_count().await, 0);
    }
}
