//! PipelineOrchestrator - runs the three stages in strict order.
//!
//! Each stage's prompt embeds the prior stage's output, so there is no
//! parallelism to exploit within a run. Transient provider errors (rate
//! limit, timeout) get one bounded retry with backoff; everything else
//! fails the run at the stage where it happened.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::domain::dilemma::{coerce, DilemmaInput};
use crate::domain::foundation::Timestamp;
use crate::domain::pipeline::{
    analysis_prompt, arbitration_prompt, formatting_prompt, system_prompt, FailureKind,
    ModelTier, PipelineRun, Stage, StageConfig, StageResult,
};
use crate::ports::{ModelClient, ModelError, ModelRequest, ModelResponse, RetryPolicy};

/// Concrete model ids for the two stage tiers.
#[derive(Debug, Clone)]
pub struct StageModels {
    /// High-reasoning model for analysis and arbitration.
    pub reasoning: String,
    /// Smaller, faster variant for formatting.
    pub fast: String,
}

impl StageModels {
    fn for_tier(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Reasoning => &self.reasoning,
            ModelTier::Fast => &self.fast,
        }
    }
}

/// Drives one dilemma through analysis, arbitration, and formatting.
pub struct PipelineOrchestrator {
    client: Arc<dyn ModelClient>,
    models: StageModels,
    retry_policy: RetryPolicy,
}

impl PipelineOrchestrator {
    pub fn new(client: Arc<dyn ModelClient>, models: StageModels, retry_policy: RetryPolicy) -> Self {
        Self {
            client,
            models,
            retry_policy,
        }
    }

    /// Executes a full run; always returns a terminal run.
    pub async fn execute(&self, input: DilemmaInput) -> PipelineRun {
        let mut run = PipelineRun::new(input);
        info!(run_id = %run.id(), chars = run.input().len(), "pipeline run started");

        for stage in Stage::ALL {
            if let Err((kind, message)) = self.run_stage(&mut run, stage).await {
                warn!(run_id = %run.id(), %stage, ?kind, %message, "stage failed");
                self.mark_failed(&mut run, Some(stage), kind, message);
                return run;
            }
        }

        let raw = run
            .stage_output(Stage::Formatting)
            .unwrap_or_default()
            .to_string();

        match coerce(&raw) {
            Ok(record) => {
                if run.complete(record).is_err() {
                    self.mark_failed(
                        &mut run,
                        None,
                        FailureKind::Internal,
                        "run refused completion",
                    );
                } else {
                    info!(
                        run_id = %run.id(),
                        total_ms = run.total_elapsed().as_millis() as u64,
                        "pipeline run completed"
                    );
                }
            }
            Err(failure) => {
                warn!(
                    run_id = %run.id(),
                    reason = %failure.reason,
                    raw_len = failure.raw_text.len(),
                    "stage 3 output failed coercion"
                );
                self.mark_failed(
                    &mut run,
                    Some(Stage::Formatting),
                    FailureKind::Coercion,
                    failure.reason,
                );
            }
        }

        run
    }

    async fn run_stage(
        &self,
        run: &mut PipelineRun,
        stage: Stage,
    ) -> Result<(), (FailureKind, String)> {
        run.begin_stage(stage)
            .map_err(|e| (FailureKind::Internal, e.to_string()))?;

        let prompt = match stage {
            Stage::Analysis => analysis_prompt(run.input()),
            Stage::Arbitration => arbitration_prompt(
                run.input(),
                run.stage_output(Stage::Analysis).unwrap_or_default(),
            ),
            Stage::Formatting => formatting_prompt(
                run.input(),
                run.stage_output(Stage::Analysis).unwrap_or_default(),
                run.stage_output(Stage::Arbitration).unwrap_or_default(),
            ),
        };

        let config = StageConfig::for_stage(stage);
        let mut request = ModelRequest::new(prompt, self.models.for_tier(config.tier))
            .with_temperature(config.temperature)
            .with_max_output_tokens(config.max_output_tokens)
            .with_response_format(config.response_format);
        if let Some(persona) = system_prompt(stage) {
            request = request.with_system_prompt(persona);
        }

        let started_at = Timestamp::now();
        let clock = Instant::now();

        let response = self
            .invoke_with_retry(request, stage)
            .await
            .map_err(|e| (classify(&e), e.to_string()))?;

        if response.text.trim().is_empty() {
            return Err((
                FailureKind::EmptyStageOutput,
                format!("{} returned empty text", stage),
            ));
        }

        let elapsed = clock.elapsed();
        info!(
            run_id = %run.id(),
            %stage,
            model = %response.model,
            elapsed_ms = elapsed.as_millis() as u64,
            chars = response.text.len(),
            "stage complete"
        );

        run.complete_stage(StageResult::new(
            stage,
            response.text,
            elapsed,
            started_at,
            response.model,
        ))
        .map_err(|e| (FailureKind::Internal, e.to_string()))
    }

    async fn invoke_with_retry(
        &self,
        request: ModelRequest,
        stage: Stage,
    ) -> Result<ModelResponse, ModelError> {
        let mut retry = 0;
        loop {
            match self.client.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && retry < self.retry_policy.max_retries => {
                    let backoff = self.retry_policy.backoff(retry);
                    warn!(
                        %stage,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient provider error, retrying"
                    );
                    sleep(backoff).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn mark_failed(
        &self,
        run: &mut PipelineRun,
        stage: Option<Stage>,
        kind: FailureKind,
        message: impl Into<String>,
    ) {
        if let Err(err) = run.fail(stage, kind, message) {
            tracing::error!(run_id = %run.id(), error = %err, "could not mark run failed");
        }
    }
}

/// Maps a model error to the run-level failure taxonomy.
fn classify(error: &ModelError) -> FailureKind {
    match error {
        ModelError::RateLimited { .. } => FailureKind::RateLimited,
        ModelError::Timeout { .. } => FailureKind::Timeout,
        ModelError::Provider { .. }
        | ModelError::AuthenticationFailed
        | ModelError::Network(_)
        | ModelError::Parse(_) => FailureKind::Provider,
    }
}
