//! Batch drain: claim and run up to `batch_size` pending jobs, one at a time.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::generate_certificate::process_certificate_job;
use crate::kernel::deadline::with_deadline;
use crate::kernel::CertificateDeps;

/// Hard cap on jobs claimed by a single drain.
pub const MAX_BATCH_SIZE: usize = 10;

pub const UNKNOWN_JOB_TYPE_MESSAGE: &str = "Unknown job type";

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Jobs per drain, clamped to `1..=MAX_BATCH_SIZE`
    pub batch_size: usize,
    /// Limit for each call to an external collaborator
    pub call_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl ProcessorConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }
}

/// Counts for one drain.
///
/// A claimed record without an id counts towards `failed` but not `processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Number of queue claims that returned a record, with or without an id.
    pub fn claimed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Drain one batch of jobs. Never fails: every problem ends up in the summary
/// or the job's `error_message`.
pub async fn process_job_batch(deps: &CertificateDeps, config: &ProcessorConfig) -> BatchSummary {
    let mut summary = BatchSummary::default();
    let batch_size = config.effective_batch_size();

    for _ in 0..batch_size {
        let job = match with_deadline(config.call_timeout, deps.job_queue.get_next_job()).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                debug!("job queue empty");
                break;
            }
            Err(e) => {
                error!(error = %e, "failed to claim next job");
                break;
            }
        };

        let Some(job_id) = job.id else {
            warn!(job_type = %job.job_type, "claimed job has no id, skipping");
            summary.failed += 1;
            continue;
        };

        summary.processed += 1;

        if !job.is_certificate_job() {
            warn!(job_id = %job_id, job_type = %job.job_type, "unknown job type");
            // Status write errors are already logged by the updater
            let _ = deps
                .status_updater
                .mark_failed(job_id, UNKNOWN_JOB_TYPE_MESSAGE)
                .await;
            summary.failed += 1;
            continue;
        }

        debug!(job_id = %job_id, "processing certificate job");
        match process_certificate_job(&job.payload, deps, config.call_timeout).await {
            Ok(generated) => {
                let _ = deps
                    .status_updater
                    .mark_completed(job_id, generated.to_result_data())
                    .await;
                summary.succeeded += 1;
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "certificate job failed");
                let _ = deps
                    .status_updater
                    .mark_failed(job_id, &e.to_string())
                    .await;
                summary.failed += 1;
            }
        }
    }

    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "job batch drained"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::certificates::models::CertificateConfig;
    use crate::kernel::jobs::{JobStatus, CERTIFICATE_JOB_TYPE};
    use crate::kernel::test_dependencies::TestDependencies;
    use serde_json::json;

    fn payload(user_id: &str) -> serde_json::Value {
        json!({
            "eventId": "evt-1",
            "userId": user_id,
            "participantName": "Ada Lovelace",
            "eventTitle": "Tech Summit",
            "completionDate": "2024-06-15"
        })
    }

    fn config() -> ProcessorConfig {
        ProcessorConfig {
            call_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[test]
    fn batch_size_is_clamped() {
        let mut config = ProcessorConfig::default();
        assert_eq!(config.effective_batch_size(), 10);
        config.batch_size = 50;
        assert_eq!(config.effective_batch_size(), 10);
        config.batch_size = 0;
        assert_eq!(config.effective_batch_size(), 1);
    }

    #[tokio::test]
    async fn empty_queue_processes_nothing() {
        let test = TestDependencies::new();
        let summary = process_job_batch(&test.deps(), &config()).await;
        assert_eq!(summary, BatchSummary::default());
        assert_eq!(test.job_queue.claims(), 1);
    }

    #[tokio::test]
    async fn drains_at_most_ten_jobs() {
        let test = TestDependencies::new();
        test.certificates
            .set_config("evt-1", CertificateConfig::with_prefix("TS"));
        for i in 0..12 {
            test.job_queue
                .push_job(CERTIFICATE_JOB_TYPE, payload(&format!("u{}", i)));
        }

        let summary = process_job_batch(&test.deps(), &config()).await;

        assert_eq!(summary.processed, 10);
        assert_eq!(summary.succeeded, 10);
        assert_eq!(test.job_queue.count_in(JobStatus::Pending), 2);
        assert_eq!(test.job_queue.count_in(JobStatus::Completed), 10);
    }

    #[tokio::test]
    async fn stops_when_queue_runs_dry() {
        let test = TestDependencies::new();
        test.certificates
            .set_config("evt-1", CertificateConfig::with_prefix("TS"));
        for i in 0..3 {
            test.job_queue
                .push_job(CERTIFICATE_JOB_TYPE, payload(&format!("u{}", i)));
        }

        let summary = process_job_batch(&test.deps(), &config()).await;

        assert_eq!(summary.processed, 3);
        assert_eq!(test.job_queue.claims(), 4);
    }

    #[tokio::test]
    async fn unknown_job_type_is_failed_without_processing() {
        let test = TestDependencies::new();
        let id = test.job_queue.push_job("send_email", json!({}));

        let summary = process_job_batch(&test.deps(), &config()).await;

        assert_eq!(
            summary,
            BatchSummary {
                processed: 1,
                succeeded: 0,
                failed: 1
            }
        );
        assert_eq!(test.job_queue.error_of(id).as_deref(), Some("Unknown job type"));
        assert_eq!(test.renderer.pdf_calls(), 0);
    }

    #[tokio::test]
    async fn job_without_id_is_counted_failed_and_skipped() {
        let test = TestDependencies::new();
        test.job_queue
            .push_job_without_id(CERTIFICATE_JOB_TYPE, payload("u1"));

        let summary = process_job_batch(&test.deps(), &config()).await;

        assert_eq!(
            summary,
            BatchSummary {
                processed: 0,
                succeeded: 0,
                failed: 1
            }
        );
        assert_eq!(summary.claimed(), 1);
        assert!(test.job_queue.rpc_failures().is_empty());
        assert!(test.job_queue.direct_writes().is_empty());
    }

    #[tokio::test]
    async fn failed_job_records_error_message() {
        let test = TestDependencies::new();
        let id = test.job_queue.push_job(CERTIFICATE_JOB_TYPE, payload("u1"));

        let summary = process_job_batch(&test.deps(), &config()).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(test.job_queue.status_of(id), Some(JobStatus::Failed));
        assert_eq!(
            test.job_queue.error_of(id).as_deref(),
            Some("Certificate config not found")
        );
    }

    #[tokio::test]
    async fn status_write_failures_do_not_break_the_batch() {
        let test = TestDependencies::with_job_queue(
            crate::kernel::test_dependencies::MockJobQueue::new()
                .with_failing_rpcs()
                .with_failing_direct_writes(),
        );
        test.certificates
            .set_config("evt-1", CertificateConfig::with_prefix("TS"));
        test.job_queue.push_job(CERTIFICATE_JOB_TYPE, payload("u1"));
        test.job_queue.push_job(CERTIFICATE_JOB_TYPE, payload("u2"));

        let summary = process_job_batch(&test.deps(), &config()).await;

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.succeeded, 2);
    }
}
