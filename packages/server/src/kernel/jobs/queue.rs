//! PostgreSQL-backed job queue implementation.
//!
//! Claims go through the `get_next_job()` stored function, which locks the
//! oldest pending row with `FOR UPDATE SKIP LOCKED`, so concurrent workers
//! never receive the same job.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::job::{ClaimedJob, Job, JobOutcome, CERTIFICATE_JOB_TYPE};
use crate::domains::certificates::models::CertificateJobPayload;
use crate::kernel::BaseJobQueue;

/// Message written to jobs the stale sweep gives up on.
pub const STALE_JOB_MESSAGE: &str = "Job timed out while processing";

/// PostgreSQL job queue backed by the `job_queue` table.
#[derive(Clone)]
pub struct PostgresJobQueue {
    pool: PgPool,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Enqueue a certificate job and return its id.
    pub async fn enqueue_certificate_job(&self, payload: &CertificateJobPayload) -> Result<Uuid> {
        let payload = serde_json::to_value(payload).context("failed to serialize payload")?;
        let job = Job::enqueue(CERTIFICATE_JOB_TYPE, &payload, &self.pool).await?;

        info!(job_id = %job.id, job_type = CERTIFICATE_JOB_TYPE, "job enqueued");
        Ok(job.id)
    }

    /// Fail every job that has sat in `processing` for longer than `older_than`.
    pub async fn fail_stale_jobs(&self, older_than: std::time::Duration) -> Result<Vec<Uuid>> {
        let older_than = ChronoDuration::from_std(older_than)
            .map_err(|e| anyhow!("invalid stale threshold: {}", e))?;
        let cutoff = Utc::now() - older_than;

        let ids = Job::fail_stale(cutoff, STALE_JOB_MESSAGE, &self.pool).await?;
        if !ids.is_empty() {
            warn!(count = ids.len(), "failed stale processing jobs");
        }
        Ok(ids)
    }
}

#[async_trait]
impl BaseJobQueue for PostgresJobQueue {
    async fn get_next_job(&self) -> Result<Option<ClaimedJob>> {
        Job::claim_next(&self.pool).await
    }

    async fn complete_job(&self, job_id: Uuid, result_data: &serde_json::Value) -> Result<()> {
        Job::complete_via_rpc(job_id, result_data, &self.pool).await
    }

    async fn fail_job(&self, job_id: Uuid, error_message: &str) -> Result<()> {
        Job::fail_via_rpc(job_id, error_message, &self.pool).await
    }

    async fn write_status(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<()> {
        let rows = Job::write_outcome(job_id, outcome, &self.pool).await?;
        if rows == 0 {
            return Err(anyhow!(
                "job {} not found or already finished",
                job_id
            ));
        }
        Ok(())
    }
}
