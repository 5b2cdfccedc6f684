//! Kernel module - worker infrastructure and dependencies.

pub mod deadline;
pub mod deps;
pub mod jobs;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deadline::{with_deadline, DeadlineError};
pub use deps::{CertificateDeps, StorageUploader};
pub use test_dependencies::TestDependencies;
pub use traits::*;
