//! Failure taxonomy for pipeline runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stage::Stage;

/// Why a run (or a run mutation) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Input rejected before any model call.
    InvalidInput,
    /// Upstream provider returned a non-success status.
    Provider,
    /// Upstream provider throttled the request.
    RateLimited,
    /// No response within the bounded wait.
    Timeout,
    /// A stage returned empty text.
    EmptyStageOutput,
    /// Stage 3 output did not conform to the schema after recovery.
    Coercion,
    /// Persistence or other internal failure.
    Internal,
}

/// Terminal failure description surfaced to the caller.
///
/// Names the failing stage and error kind; never carries a raw provider
/// stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("pipeline failed at {stage:?}: {message}")]
pub struct FailureReport {
    /// The stage that failed, or None for pre-pipeline rejection.
    pub stage: Option<Stage>,
    /// Classified error kind.
    pub kind: FailureKind,
    /// Short human-readable description.
    pub message: String,
}

impl FailureReport {
    pub fn new(stage: Option<Stage>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    /// Pre-pipeline input rejection.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(None, FailureKind::InvalidInput, message)
    }
}

/// Attempted transition that the run state machine does not allow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid run transition: cannot {attempted} while {state}")]
pub struct RunStateError {
    pub attempted: &'static str,
    pub state: &'static str,
}
