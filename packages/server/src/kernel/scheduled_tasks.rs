//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! This module provides periodic maintenance that runs beside the worker:
//! - Stale job sweep: jobs stuck in `processing` are marked `failed`
//!
//! # Architecture
//!
//! Scheduled tasks run independently of the batch drain loop.
//!
//! ```text
//! Scheduler (every 5 minutes)
//!     │
//!     └─► PostgresJobQueue::fail_stale_jobs(stale_after)
//!             └─► processing → failed ("Job timed out while processing")
//! ```

use std::time::Duration;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::kernel::jobs::PostgresJobQueue;

/// Every 5 minutes, on the minute.
pub const STALE_SWEEP_SCHEDULE: &str = "0 */5 * * * *";

/// Start all scheduled tasks
pub async fn start_scheduler(queue: PostgresJobQueue, stale_after: Duration) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_job = Job::new_async(STALE_SWEEP_SCHEDULE, move |_uuid, _lock| {
        let queue = queue.clone();
        Box::pin(async move {
            if let Err(e) = run_stale_sweep(&queue, stale_after).await {
                tracing::error!("Stale job sweep failed: {}", e);
            }
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(
        stale_after_mins = stale_after.as_secs() / 60,
        "Scheduled tasks started (stale job sweep every 5 minutes)"
    );
    Ok(scheduler)
}

/// Fail jobs that have been processing for longer than `stale_after`
pub async fn run_stale_sweep(queue: &PostgresJobQueue, stale_after: Duration) -> Result<usize> {
    tracing::debug!("Running stale job sweep");

    let ids = queue.fail_stale_jobs(stale_after).await?;
    for id in &ids {
        tracing::warn!(job_id = %id, "marked stale job failed");
    }

    Ok(ids.len())
}
