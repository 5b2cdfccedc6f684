//! Job model for the `job_queue` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// The only job type the certificate worker knows how to run.
pub const CERTIFICATE_JOB_TYPE: &str = "generate_certificate";

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs are never touched again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Final state written back to a job row.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed { result_data: serde_json::Value },
    Failed { error_message: String },
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed { .. } => JobStatus::Completed,
            JobOutcome::Failed { .. } => JobStatus::Failed,
        }
    }
}

// ============================================================================
// Job Model
// ============================================================================

#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub result_data: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A job handed out by `get_next_job`.
///
/// `id` stays optional: the claim RPC can hand back a record without one, and
/// the batch loop must skip it rather than crash.
#[derive(FromRow, Debug, Clone, PartialEq)]
pub struct ClaimedJob {
    pub id: Option<Uuid>,
    pub job_type: String,
    pub payload: serde_json::Value,
}

impl ClaimedJob {
    pub fn new(id: Uuid, job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Some(id),
            job_type: job_type.into(),
            payload,
        }
    }

    pub fn is_certificate_job(&self) -> bool {
        self.job_type == CERTIFICATE_JOB_TYPE
    }
}

impl From<Job> for ClaimedJob {
    fn from(job: Job) -> Self {
        Self {
            id: Some(job.id),
            job_type: job.job_type,
            payload: job.payload,
        }
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Job {
    /// Insert a new pending job
    pub async fn enqueue(
        job_type: &str,
        payload: &serde_json::Value,
        pool: &PgPool,
    ) -> Result<Self> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO job_queue (job_type, payload, status)
            VALUES ($1, $2, 'pending')
            RETURNING *
            "#,
        )
        .bind(job_type)
        .bind(payload)
        .fetch_one(pool)
        .await?;
        Ok(job)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM job_queue WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(job)
    }

    /// Claim the oldest pending job via the `get_next_job` RPC.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<ClaimedJob>> {
        let claimed = sqlx::query_as::<_, ClaimedJob>(
            "SELECT id, job_type, payload FROM get_next_job()",
        )
        .fetch_optional(pool)
        .await
        .context("get_next_job RPC failed")?;
        Ok(claimed)
    }

    /// Mark completed via the `complete_job` RPC
    pub async fn complete_via_rpc(
        id: Uuid,
        result_data: &serde_json::Value,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query("SELECT complete_job($1, $2)")
            .bind(id)
            .bind(result_data)
            .execute(pool)
            .await
            .context("complete_job RPC failed")?;
        Ok(())
    }

    /// Mark failed via the `fail_job` RPC
    pub async fn fail_via_rpc(id: Uuid, error_message: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("SELECT fail_job($1, $2)")
            .bind(id)
            .bind(error_message)
            .execute(pool)
            .await
            .context("fail_job RPC failed")?;
        Ok(())
    }

    /// Write the final status straight to the row, bypassing the RPCs.
    ///
    /// Only unfinished rows are updated; returns the number of rows touched.
    pub async fn write_outcome(id: Uuid, outcome: &JobOutcome, pool: &PgPool) -> Result<u64> {
        let (result_data, error_message) = match outcome {
            JobOutcome::Completed { result_data } => (Some(result_data), None),
            JobOutcome::Failed { error_message } => (None, Some(error_message.as_str())),
        };

        let rows = sqlx::query(
            r#"
            UPDATE job_queue
            SET status = $2,
                result_data = $3,
                error_message = $4,
                completed_at = NOW()
            WHERE id = $1
              AND status IN ('pending', 'processing')
            "#,
        )
        .bind(id)
        .bind(outcome.status())
        .bind(result_data)
        .bind(error_message)
        .execute(pool)
        .await?
        .rows_affected();

        Ok(rows)
    }

    /// Fail jobs stuck in `processing` since before `cutoff`
    pub async fn fail_stale(
        cutoff: DateTime<Utc>,
        error_message: &str,
        pool: &PgPool,
    ) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE job_queue
            SET status = 'failed',
                error_message = $2,
                completed_at = NOW()
            WHERE status = 'processing'
              AND started_at < $1
            RETURNING id
            "#,
        )
        .bind(cutoff)
        .bind(error_message)
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }

    /// Count jobs in a given status
    pub async fn count_by_status(status: JobStatus, pool: &PgPool) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM job_queue WHERE status = $1")
                .bind(status)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
