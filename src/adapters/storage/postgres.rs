//! PostgreSQL implementation of RunRepository.
//!
//! Runs and decision records land in two tables. Stage results and
//! failure reports are stored as JSONB so the row layout stays stable
//! while the pipeline evolves.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, Row};

use crate::domain::dilemma::DecisionRecord;
use crate::domain::foundation::{RunId, Timestamp, UserId};
use crate::domain::pipeline::PipelineRun;
use crate::ports::{DecisionSummary, RepositoryError, RunRepository};

/// Characters of the dilemma stored for history listings.
const PREVIEW_CHARS: usize = 120;

/// PostgreSQL-backed storage for pipeline runs and decision records.
#[derive(Clone)]
pub struct PostgresRunRepository {
    pool: PgPool,
}

impl PostgresRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// JSONB shape of one stage result row fragment.
#[derive(Serialize)]
struct StageResultRow<'a> {
    stage: &'a str,
    model: &'a str,
    elapsed_ms: u64,
    started_at: Timestamp,
}

fn storage_err(context: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(format!("{context}: {e}"))
}

#[async_trait]
impl RunRepository for PostgresRunRepository {
    async fn save_run(&self, run: &PipelineRun, owner: &UserId) -> Result<(), RepositoryError> {
        let stage_results: Vec<StageResultRow<'_>> = run
            .stage_results()
            .iter()
            .map(|r| StageResultRow {
                stage: r.stage.name(),
                model: &r.model,
                elapsed_ms: r.elapsed.as_millis() as u64,
                started_at: r.started_at,
            })
            .collect();

        let stage_results = serde_json::to_value(&stage_results)
            .map_err(|e| storage_err("failed to encode stage results", e))?;

        let failure = run
            .failure()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| storage_err("failed to encode failure report", e))?;

        sqlx::query(
            r#"
            INSERT INTO pipeline_runs (
                id, owner_id, dilemma, state, stage_results, failure,
                total_elapsed_ms, created_at, finished_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                state = EXCLUDED.state,
                stage_results = EXCLUDED.stage_results,
                failure = EXCLUDED.failure,
                total_elapsed_ms = EXCLUDED.total_elapsed_ms,
                finished_at = EXCLUDED.finished_at
            "#,
        )
        .bind(*run.id().as_uuid())
        .bind(owner.as_str())
        .bind(run.input().as_str())
        .bind(run.state().label())
        .bind(stage_results)
        .bind(failure)
        .bind(run.total_elapsed().as_millis() as i64)
        .bind(*run.created_at().as_datetime())
        .bind(run.finished_at().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("failed to insert run", e))?;

        Ok(())
    }

    async fn save_decision(
        &self,
        run_id: RunId,
        record: &DecisionRecord,
        owner: &UserId,
    ) -> Result<(), RepositoryError> {
        let body = serde_json::to_value(record)
            .map_err(|e| storage_err("failed to encode decision record", e))?;

        sqlx::query(
            r#"
            INSERT INTO decision_records (run_id, owner_id, decision, record, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (run_id) DO UPDATE SET
                decision = EXCLUDED.decision,
                record = EXCLUDED.record
            "#,
        )
        .bind(*run_id.as_uuid())
        .bind(owner.as_str())
        .bind(&record.decision)
        .bind(body)
        .bind(*record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("failed to insert decision", e))?;

        Ok(())
    }

    async fn find_decision(&self, run_id: RunId) -> Result<Option<DecisionRecord>, RepositoryError> {
        let row = sqlx::query("SELECT record FROM decision_records WHERE run_id = $1")
            .bind(*run_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("failed to load decision", e))?;

        row.map(|row| {
            let body: serde_json::Value = row.get("record");
            serde_json::from_value(body)
                .map_err(|e| storage_err("failed to decode decision record", e))
        })
        .transpose()
    }

    async fn list_recent(
        &self,
        owner: &UserId,
        limit: u32,
    ) -> Result<Vec<DecisionSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT d.run_id, d.decision, d.created_at, r.dilemma, r.total_elapsed_ms
            FROM decision_records d
            JOIN pipeline_runs r ON r.id = d.run_id
            WHERE d.owner_id = $1
            ORDER BY d.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("failed to load history", e))?;

        let summaries = rows
            .into_iter()
            .map(|row| {
                let dilemma: String = row.get("dilemma");
                DecisionSummary {
                    run_id: RunId::from_uuid(row.get("run_id")),
                    dilemma_preview: preview(&dilemma, PREVIEW_CHARS),
                    decision: row.get("decision"),
                    created_at: Timestamp::from_datetime(row.get("created_at")),
                    total_elapsed_ms: row.get::<i64, _>("total_elapsed_ms") as u64,
                }
            })
            .collect();

        Ok(summaries)
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
