//! Certificate activities - the work a certificate job performs.

pub mod generate_certificate;
pub mod numbering;
pub mod process_jobs;

pub use generate_certificate::{generate_certificate, process_certificate_job};
pub use process_jobs::{process_job_batch, BatchSummary, ProcessorConfig, MAX_BATCH_SIZE};
