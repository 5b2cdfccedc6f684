//! Writing a job's final status.
//!
//! The queue's `complete_job`/`fail_job` RPCs are the primary path. When the
//! RPC errors or hangs, the status is written directly to the row instead so a
//! job is never left stuck in `processing`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, warn};
use uuid::Uuid;

use super::job::JobOutcome;
use crate::kernel::deadline::with_deadline;
use crate::kernel::BaseJobQueue;

/// Which write actually landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    Primary,
    Fallback,
}

#[async_trait]
pub trait JobStatusUpdater: Send + Sync {
    async fn record(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<StatusWrite>;

    async fn mark_completed(
        &self,
        job_id: Uuid,
        result_data: serde_json::Value,
    ) -> Result<StatusWrite> {
        self.record(job_id, &JobOutcome::Completed { result_data })
            .await
    }

    async fn mark_failed(&self, job_id: Uuid, error_message: &str) -> Result<StatusWrite> {
        self.record(
            job_id,
            &JobOutcome::Failed {
                error_message: error_message.to_string(),
            },
        )
        .await
    }
}

/// Status writes through the queue RPCs.
pub struct RpcStatusUpdater {
    queue: Arc<dyn BaseJobQueue>,
}

impl RpcStatusUpdater {
    pub fn new(queue: Arc<dyn BaseJobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl JobStatusUpdater for RpcStatusUpdater {
    async fn record(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<StatusWrite> {
        match outcome {
            JobOutcome::Completed { result_data } => {
                self.queue.complete_job(job_id, result_data).await?
            }
            JobOutcome::Failed { error_message } => {
                self.queue.fail_job(job_id, error_message).await?
            }
        }
        Ok(StatusWrite::Primary)
    }
}

/// Status writes straight to the job row.
pub struct DirectStatusUpdater {
    queue: Arc<dyn BaseJobQueue>,
}

impl DirectStatusUpdater {
    pub fn new(queue: Arc<dyn BaseJobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl JobStatusUpdater for DirectStatusUpdater {
    async fn record(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<StatusWrite> {
        self.queue.write_status(job_id, outcome).await?;
        Ok(StatusWrite::Fallback)
    }
}

/// Tries `primary` within `timeout`, then `fallback`.
pub struct FallbackStatusUpdater {
    primary: Arc<dyn JobStatusUpdater>,
    fallback: Arc<dyn JobStatusUpdater>,
    timeout: Duration,
}

impl FallbackStatusUpdater {
    pub fn new(
        primary: Arc<dyn JobStatusUpdater>,
        fallback: Arc<dyn JobStatusUpdater>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    /// RPC first, direct row write second.
    pub fn for_queue(queue: Arc<dyn BaseJobQueue>, timeout: Duration) -> Self {
        Self::new(
            Arc::new(RpcStatusUpdater::new(queue.clone())),
            Arc::new(DirectStatusUpdater::new(queue)),
            timeout,
        )
    }
}

#[async_trait]
impl JobStatusUpdater for FallbackStatusUpdater {
    async fn record(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<StatusWrite> {
        let status = outcome.status().as_str();

        match with_deadline(self.timeout, self.primary.record(job_id, outcome)).await {
            Ok(_) => return Ok(StatusWrite::Primary),
            Err(e) => {
                warn!(job_id = %job_id, status, error = %e, "status RPC failed, writing row directly");
            }
        }

        match with_deadline(self.timeout, self.fallback.record(job_id, outcome)).await {
            Ok(_) => Ok(StatusWrite::Fallback),
            Err(e) => {
                error!(job_id = %job_id, status, error = %e, "fallback status write failed");
                Err(anyhow::anyhow!(
                    "failed to mark job {} {}: {}",
                    job_id,
                    status,
                    e
                ))
            }
        }
    }
}
