//! Job worker service for draining the certificate queue.
//!
//! The `JobWorker` is a long-running service that:
//! - Drains a batch of jobs via `process_job_batch`
//! - Drains again right away when the batch came back full
//! - Otherwise sleeps for `poll_interval`, waking early on shutdown
//!
//! # Architecture
//!
//! ```text
//! JobWorker
//!     │
//!     ├─► process_job_batch (claim via get_next_job, up to batch_size)
//!     │       └─► generate_certificate per job
//!     │       └─► mark completed/failed (RPC, then direct write)
//!     └─► full batch? drain again : sleep(poll_interval)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cert_core::kernel::jobs::{JobWorker, JobWorkerConfig};
//!
//! let worker = JobWorker::new(deps, ProcessorConfig::default());
//! let shutdown = CancellationToken::new();
//! worker.run(shutdown.clone()).await?;
//! ```

use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domains::certificates::activities::{process_job_batch, BatchSummary, ProcessorConfig};
use crate::kernel::CertificateDeps;

/// Configuration for the job worker.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// How long to wait when the last batch was not full
    pub poll_interval: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl JobWorkerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// A job worker that drains the certificate queue until shutdown.
pub struct JobWorker {
    deps: CertificateDeps,
    processor: ProcessorConfig,
    config: JobWorkerConfig,
}

impl JobWorker {
    /// Create a new job worker.
    pub fn new(deps: CertificateDeps, processor: ProcessorConfig) -> Self {
        Self {
            deps,
            processor,
            config: JobWorkerConfig::default(),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(
        deps: CertificateDeps,
        processor: ProcessorConfig,
        config: JobWorkerConfig,
    ) -> Self {
        Self {
            deps,
            processor,
            config,
        }
    }

    pub fn name(&self) -> &'static str {
        "certificate-worker"
    }

    /// Run one drain.
    pub async fn drain_once(&self) -> BatchSummary {
        process_job_batch(&self.deps, &self.processor).await
    }

    /// Drain until `shutdown` is cancelled. A batch in flight is finished first.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.processor.effective_batch_size(),
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "job worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let summary = self.drain_once().await;

            if summary.claimed() >= self.processor.effective_batch_size() {
                debug!(worker_id = %self.config.worker_id, "batch was full, draining again");
                continue;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(worker_id = %self.config.worker_id, "job worker stopped");
        Ok(())
    }
}
