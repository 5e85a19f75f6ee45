//! Integration tests for the full dilemma pipeline.
//!
//! These tests drive SubmitDilemmaHandler end to end with a scripted
//! model client and in-memory storage:
//! 1. A run either produces a complete validated record or a failure
//! 2. Invalid input never reaches the provider
//! 3. Each stage's prompt carries the prior stages' outputs
//! 4. Failed runs persist no decision record
//! 5. The retry budget is spent only on transient errors

use std::sync::Arc;
use std::time::Duration;

use crossroads::adapters::ai::ScriptedModelClient;
use crossroads::adapters::storage::InMemoryRunRepository;
use crossroads::application::handlers::{
    GetHistoryHandler, GetHistoryQuery, SubmitDilemmaCommand, SubmitDilemmaHandler,
};
use crossroads::application::{PipelineOrchestrator, StageModels};
use crossroads::domain::foundation::UserId;
use crossroads::domain::pipeline::{FailureKind, Stage};
use crossroads::ports::{ModelError, RetryPolicy};

const DILEMMA: &str = "Should I quit my stable job to join a risky startup?";

const RECORD_JSON: &str = r#"{
    "decision": "Join the startup after securing six months of savings.",
    "rationale": "The upside compounds while the downside is bounded by your savings runway.",
    "risks": ["The startup may fail within a year", "Equity may never be liquid"],
    "action_plan": ["Negotiate a written equity grant", "Set aside six months of expenses", "Give four weeks notice"],
    "emotions": ["fear of instability", "excitement"],
    "affirmation": "You have navigated bigger changes than this one."
}"#;

fn handler(
    client: ScriptedModelClient,
    repo: Arc<InMemoryRunRepository>,
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
    SubmitDilemmaHandler::new(Arc::new(orchestrator), repo, Duration::from_secs(30))
}

fn command(dilemma: &str) -> SubmitDilemmaCommand {
    SubmitDilemmaCommand {
        dilemma: dilemma.to_string(),
        owner: UserId::new("integration-user").unwrap(),
    }
}

#[tokio::test]
async fn completed_run_yields_full_record_and_history_entry() {
    let repo = Arc::new(InMemoryRunRepository::new());
    let client = ScriptedModelClient::new()
        .then_text("The analysis weighs stability against growth.")
        .then_text("Commit to the startup, conditional on savings.")
        .then_text(RECORD_JSON);

    let result = handler(client, repo.clone())
        .handle(command(DILEMMA))
        .await
        .unwrap();

    // Decision is a single committed sentence, never empty
    assert!(!result.record.decision.is_empty());
    assert!(!result.record.rationale.is_empty());
    assert!(!result.record.risks.is_empty());
    assert!(!result.record.action_plan.is_empty());
    assert_eq!(result.stages.len(), 3);

    let history = GetHistoryHandler::new(repo)
        .handle(GetHistoryQuery {
            owner: UserId::new("integration-user").unwrap(),
            limit: None,
        })
        .await
        .unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].decision, result.record.decision);
    assert!(history[0].dilemma_preview.starts_with("Should I quit"));
}

#[tokio::test]
async fn out_of_bounds_input_makes_zero_model_calls() {
    for bad in ["Too short", &"x".repeat(3001)] {
        let repo = Arc::new(InMemoryRunRepository::new());
        let client = ScriptedModelClient::new();
        let captured = client.requests();

        let err = handler(client, repo.clone())
            .handle(command(bad))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::InvalidInput);
        assert_eq!(captured.lock().unwrap().len(), 0);
        assert_eq!(repo.run_count().await, 0);
    }
}

#[tokio::test]
async fn prompts_chain_stage_outputs_forward() {
    let repo = Arc::new(InMemoryRunRepository::new());
    let client = ScriptedModelClient::new()
        .then_text("ANALYSIS-SENTINEL")
        .then_text("ARBITRATION-SENTINEL")
        .then_text(RECORD_JSON);
    let captured = client.requests();

    handler(client, repo).handle(command(DILEMMA)).await.unwrap();

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].prompt.contains(DILEMMA));
    assert!(requests[1].prompt.contains("ANALYSIS-SENTINEL"));
    assert!(requests[1].prompt.contains(DILEMMA));
    assert!(requests[2].prompt.contains("ANALYSIS-SENTINEL"));
    assert!(requests[2].prompt.contains("ARBITRATION-SENTINEL"));
}

#[tokio::test]
async fn fenced_json_is_recovered() {
    let repo = Arc::new(InMemoryRunRepository::new());
    let client = ScriptedModelClient::new()
        .then_text("analysis")
        .then_text("arbitration")
        .then_text(format!("```json\n{}\n```", RECORD_JSON));

    let result = handler(client, repo)
        .handle(command(DILEMMA))
        .await
        .unwrap();

    assert_eq!(result.record.risks.len(), 2);
}

#[tokio::test]
async fn garbage_output_fails_and_persists_no_record() {
    let repo = Arc::new(InMemoryRunRepository::new());
    let client = ScriptedModelClient::new()
        .then_text("analysis")
        .then_text("arbitration")
        .then_text("Unfortunately I cannot answer in JSON right now.");

    let err = handler(client, repo.clone())
        .handle(command(DILEMMA))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Coercion);
    assert_eq!(err.stage, Some(Stage::Formatting));
    assert_eq!(repo.decision_count().await, 0);

    let history = GetHistoryHandler::new(repo)
        .handle(GetHistoryQuery {
            owner: UserId::new("integration-user").unwrap(),
            limit: None,
        })
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn transient_rate_limit_is_retried_once_then_succeeds() {
    let repo = Arc::new(InMemoryRunRepository::new());
    let client = ScriptedModelClient::new()
        .then_error(ModelError::RateLimited { retry_after_secs: 1 })
        .then_text("analysis")
        .then_text("arbitration")
        .then_text(RECORD_JSON);
    let captured = client.requests();

    let result = handler(client, repo).handle(command(DILEMMA)).await;

    assert!(result.is_ok());
    assert_eq!(captured.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn exhausted_retry_budget_fails_the_run() {
    let repo = Arc::new(InMemoryRunRepository::new());
    let client = ScriptedModelClient::new()
        .then_error(ModelError::RateLimited { retry_after_secs: 1 })
        .then_error(ModelError::RateLimited { retry_after_secs: 1 });
    let captured = client.requests();

    let err = handler(client, repo)
        .handle(command(DILEMMA))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::RateLimited);
    assert_eq!(err.stage, Some(Stage::Analysis));
    assert_eq!(captured.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn provider_errors_are_never_retried() {
    let repo = Arc::new(InMemoryRunRepository::new());
    let client = ScriptedModelClient::new().then_error(ModelError::Provider {
        status: 500,
        message: "internal".to_string(),
    });
    let captured = client.requests();

    let err = handler(client, repo)
        .handle(command(DILEMMA))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Provider);
    assert_eq!(captured.lock().unwrap().len(), 1);
}
