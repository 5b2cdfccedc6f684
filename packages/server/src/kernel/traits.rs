// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The certificate pipeline in domains/certificates/activities is written
// against these seams so tests can swap in the doubles from test_dependencies.
//
// Naming convention: Base* for trait names (e.g., BaseJobQueue, BaseCertificateRenderer)

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domains::certificates::models::{
    CertificateConfig, CertificateFileKind, NewCertificate, ParticipantData,
};
use crate::kernel::jobs::{ClaimedJob, JobOutcome};

// =============================================================================
// Job Queue Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseJobQueue: Send + Sync {
    /// Claim the next pending job. Implementations must make the claim exclusive:
    /// two workers never receive the same job.
    async fn get_next_job(&self) -> Result<Option<ClaimedJob>>;

    /// Primary path: mark a job completed through the queue's RPC
    async fn complete_job(&self, job_id: Uuid, result_data: &serde_json::Value) -> Result<()>;

    /// Primary path: mark a job failed through the queue's RPC
    async fn fail_job(&self, job_id: Uuid, error_message: &str) -> Result<()>;

    /// Fallback path: write status, completed_at and result/error straight to the row
    async fn write_status(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<()>;
}

// =============================================================================
// Certificate Service Trait (Infrastructure - config, counters, records)
// =============================================================================

#[async_trait]
pub trait BaseCertificateService: Send + Sync {
    /// Certificate configuration for an event (`None` when the event has none)
    async fn get_certificate_config(&self, event_id: &str) -> Result<Option<CertificateConfig>>;

    /// Number of certificates already issued for an event
    async fn get_current_certificate_count(&self, event_id: &str) -> Result<i64>;

    /// Add one to an event's certificate count
    async fn increment_certificate_counter(&self, event_id: &str) -> Result<()>;

    /// Generic certificate number used when the config has no prefix
    async fn generate_certificate_number(&self, event_id: &str, user_id: &str) -> Result<String>;

    /// Persist an issued certificate
    async fn save_certificate(&self, certificate: &NewCertificate) -> Result<()>;
}

// =============================================================================
// Certificate Renderer Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseCertificateRenderer: Send + Sync {
    /// Render the certificate as a PDF document
    async fn generate_pdf(
        &self,
        config: &CertificateConfig,
        certificate_number: &str,
        data: &ParticipantData,
    ) -> Result<Vec<u8>>;

    /// Render the certificate as a PNG image
    async fn generate_png(
        &self,
        config: &CertificateConfig,
        certificate_number: &str,
        data: &ParticipantData,
    ) -> Result<Vec<u8>>;
}

// =============================================================================
// File Storage Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseCertificateStorage: Send + Sync {
    /// Upload a rendered certificate file and return its public URL
    async fn upload_certificate_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        kind: CertificateFileKind,
        event_id: Option<&str>,
        user_id: &str,
    ) -> Result<String>;
}
