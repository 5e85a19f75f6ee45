//! PipelineRun - state machine tying one dilemma to its stage results.
//!
//! Transitions are strictly sequential: stage N+1 never starts before
//! stage N's output is recorded. A run that reaches `Completed` or
//! `Failed` is terminal and rejects further mutation.

use std::time::Duration;

use crate::domain::dilemma::{DecisionRecord, DilemmaInput};
use crate::domain::foundation::{RunId, Timestamp};

use super::errors::{FailureKind, FailureReport, RunStateError};
use super::stage::{Stage, StageResult};

/// Lifecycle state of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// Created, no stage started yet.
    Pending,
    /// The given stage is in flight.
    StageRunning(Stage),
    /// The given stage finished; the next has not started.
    StageDone(Stage),
    /// All stages succeeded and coercion produced a record.
    Completed,
    /// Terminal failure.
    Failed(FailureReport),
}

impl RunState {
    /// Short machine-readable state name, used in persistence and logs.
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::StageRunning(_) => "stage_running",
            RunState::StageDone(_) => "stage_done",
            RunState::Completed => "completed",
            RunState::Failed(_) => "failed",
        }
    }

    /// True once the run can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed(_))
    }
}

/// One end-to-end execution of the three-stage pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    id: RunId,
    input: DilemmaInput,
    state: RunState,
    stage_results: Vec<StageResult>,
    record: Option<DecisionRecord>,
    created_at: Timestamp,
    finished_at: Option<Timestamp>,
}

impl PipelineRun {
    /// Creates a pending run for a validated input.
    pub fn new(input: DilemmaInput) -> Self {
        Self {
            id: RunId::new(),
            input,
            state: RunState::Pending,
            stage_results: Vec::with_capacity(Stage::ALL.len()),
            record: None,
            created_at: Timestamp::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn input(&self) -> &DilemmaInput {
        &self.input
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Stage results recorded so far, in stage order.
    pub fn stage_results(&self) -> &[StageResult] {
        &self.stage_results
    }

    /// The output text of a finished stage.
    pub fn stage_output(&self, stage: Stage) -> Option<&str> {
        self.stage_results
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.output.as_str())
    }

    /// The decision record, present only when completed.
    pub fn record(&self) -> Option<&DecisionRecord> {
        self.record.as_ref()
    }

    /// The failure report, present only when failed.
    pub fn failure(&self) -> Option<&FailureReport> {
        match &self.state {
            RunState::Failed(report) => Some(report),
            _ => None,
        }
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    /// Sum of per-stage elapsed durations.
    pub fn total_elapsed(&self) -> Duration {
        self.stage_results.iter().map(|r| r.elapsed).sum()
    }

    /// Marks a stage as running.
    ///
    /// Analysis may only start from `Pending`; any later stage only after
    /// its predecessor is done.
    pub fn begin_stage(&mut self, stage: Stage) -> Result<(), RunStateError> {
        let allowed = match (&self.state, stage) {
            (RunState::Pending, Stage::Analysis) => true,
            (RunState::StageDone(done), next) => done.next() == Some(next),
            _ => false,
        };

        if !allowed {
            return Err(self.transition_error("begin_stage"));
        }

        self.state = RunState::StageRunning(stage);
        Ok(())
    }

    /// Records the output of the currently running stage.
    pub fn complete_stage(&mut self, result: StageResult) -> Result<(), RunStateError> {
        match self.state {
            RunState::StageRunning(stage) if stage == result.stage => {
                self.state = RunState::StageDone(stage);
                self.stage_results.push(result);
                Ok(())
            }
            _ => Err(self.transition_error("complete_stage")),
        }
    }

    /// Completes the run with a validated decision record.
    ///
    /// Only reachable once the formatting stage is done.
    pub fn complete(&mut self, record: DecisionRecord) -> Result<(), RunStateError> {
        if self.state != RunState::StageDone(Stage::Formatting) {
            return Err(self.transition_error("complete"));
        }

        self.record = Some(record);
        self.state = RunState::Completed;
        self.finished_at = Some(Timestamp::now());
        Ok(())
    }

    /// Fails the run terminally, recording the failing stage and kind.
    pub fn fail(
        &mut self,
        stage: Option<Stage>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Result<(), RunStateError> {
        if self.state.is_terminal() {
            return Err(self.transition_error("fail"));
        }

        self.state = RunState::Failed(FailureReport::new(stage, kind, message));
        self.finished_at = Some(Timestamp::now());
        Ok(())
    }

    fn transition_error(&self, attempted: &'static str) -> RunStateError {
        RunStateError {
            attempted,
            state: self.state.label(),
        }
    }
}
