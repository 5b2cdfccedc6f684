//! Job infrastructure for the certificate queue.
//!
//! This module provides the kernel-level infrastructure for job execution:
//! - [`Job`] - Job model with queries against `job_queue`
//! - [`PostgresJobQueue`] - Database-backed queue (claim, complete, fail, enqueue)
//! - [`FallbackStatusUpdater`] - RPC status writes with a direct row write fallback
//! - [`JobWorker`] - Long-running service that drains the queue
//!
//! # Architecture
//!
//! ```text
//! certctl enqueue / other services
//!     │
//!     └─► INSERT INTO job_queue (status = 'pending')
//!
//! JobWorker
//!     │
//!     ├─► get_next_job() (FOR UPDATE SKIP LOCKED)
//!     ├─► generate_certificate (domains/certificates)
//!     └─► complete_job / fail_job, falling back to UPDATE job_queue
//! ```
//!
//! Certificate logic lives in its domain.
//! This module only provides the infrastructure.

mod job;
mod queue;
mod status;
mod worker;

pub use job::{ClaimedJob, Job, JobOutcome, JobStatus, CERTIFICATE_JOB_TYPE};
pub use queue::{PostgresJobQueue, STALE_JOB_MESSAGE};
pub use status::{
    DirectStatusUpdater, FallbackStatusUpdater, JobStatusUpdater, RpcStatusUpdater, StatusWrite,
};
pub use worker::{JobWorker, JobWorkerConfig};
