//! HTTP handlers for the dilemma endpoints.
//!
//! These handlers connect Axum routes to application layer operations.

use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::{
    GetHistoryHandler, GetHistoryQuery, SubmitDilemmaCommand, SubmitDilemmaHandler,
};
use crate::domain::foundation::UserId;
use crate::domain::pipeline::{FailureKind, FailureReport};
use crate::ports::ProviderInfo;

use super::dto::{
    DecisionView, ErrorResponse, HealthView, HistoryEntryView, HistoryParams, HistoryView,
    ModelsView, SubmitDilemmaRequest,
};

/// Header carrying the caller's identity. Absent callers share one bucket.
const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state for dilemma handlers.
#[derive(Clone)]
pub struct DilemmaAppState {
    pub submit: Arc<SubmitDilemmaHandler>,
    pub history: Arc<GetHistoryHandler>,
    pub provider_info: ProviderInfo,
}

impl DilemmaAppState {
    pub fn new(
        submit: Arc<SubmitDilemmaHandler>,
        history: Arc<GetHistoryHandler>,
        provider_info: ProviderInfo,
    ) -> Self {
        Self {
            submit,
            history,
            provider_info,
        }
    }
}

/// Resolves the caller identity from the request headers.
fn owner_from_headers(headers: &HeaderMap) -> UserId {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| UserId::new(v).ok())
        .unwrap_or_else(UserId::anonymous)
}

/// POST /api/dilemmas - run the full pipeline for one dilemma.
///
/// # Errors
/// - 400 Bad Request: dilemma outside length bounds
/// - 422 Unprocessable Entity: formatting output could not be coerced
/// - 502 Bad Gateway: provider failure or exhausted retry budget
/// - 504 Gateway Timeout: stage or pipeline deadline exceeded
pub async fn submit_dilemma(
    State(state): State<DilemmaAppState>,
    headers: HeaderMap,
    Json(body): Json<SubmitDilemmaRequest>,
) -> Result<impl IntoResponse, DilemmaApiError> {
    let command = SubmitDilemmaCommand {
        dilemma: body.dilemma,
        owner: owner_from_headers(&headers),
    };

    let result = state.submit.handle(command).await?;
    Ok((StatusCode::OK, Json(DecisionView::from(result))))
}

/// GET /api/dilemmas/history - the caller's most recent decisions.
pub async fn get_history(
    State(state): State<DilemmaAppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, DilemmaApiError> {
    let query = GetHistoryQuery {
        owner: owner_from_headers(&headers),
        limit: params.limit,
    };

    let summaries = state
        .history
        .handle(query)
        .await
        .map_err(|e| DilemmaApiError::Internal(e.to_string()))?;

    let view = HistoryView {
        entries: summaries.into_iter().map(HistoryEntryView::from).collect(),
    };
    Ok((StatusCode::OK, Json(view)))
}

/// GET /api/health - liveness probe.
pub async fn health(State(state): State<DilemmaAppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthView {
            status: "ok",
            provider: state.provider_info.name.clone(),
            reasoning_model: state.provider_info.reasoning_model.clone(),
            fast_model: state.provider_info.fast_model.clone(),
        }),
    )
}

/// GET /api/models - the models serving each pipeline tier.
pub async fn models(State(state): State<DilemmaAppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ModelsView {
            provider: state.provider_info.name.clone(),
            reasoning_model: state.provider_info.reasoning_model.clone(),
            fast_model: state.provider_info.fast_model.clone(),
        }),
    )
}

/// API error type that converts pipeline failures to HTTP responses.
#[derive(Debug)]
pub enum DilemmaApiError {
    Pipeline(FailureReport),
    Internal(String),
}

impl From<FailureReport> for DilemmaApiError {
    fn from(report: FailureReport) -> Self {
        Self::Pipeline(report)
    }
}

fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
        FailureKind::Coercion => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::Provider | FailureKind::RateLimited | FailureKind::EmptyStageOutput => {
            StatusCode::BAD_GATEWAY
        }
        FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure_code(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::InvalidInput => "INVALID_INPUT",
        FailureKind::Coercion => "COERCION_FAILED",
        FailureKind::Timeout => "TIMEOUT",
        FailureKind::Provider => "PROVIDER_ERROR",
        FailureKind::RateLimited => "RATE_LIMITED",
        FailureKind::EmptyStageOutput => "EMPTY_STAGE_OUTPUT",
        FailureKind::Internal => "INTERNAL_ERROR",
    }
}

impl IntoResponse for DilemmaApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            DilemmaApiError::Pipeline(report) => {
                let mut body = ErrorResponse::new(failure_code(report.kind), report.message);
                if let Some(stage) = report.stage {
                    body = body.with_stage(stage.name());
                }
                (failure_status(report.kind), body)
            }
            DilemmaApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", message),
            ),
        };

        (status, Json(body)).into_response()
    }
}
