//! Certificate worker dependencies (using traits for testability)
//!
//! This module provides the dependency container used by the certificate
//! activities. All external services use trait abstractions to enable testing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use storage_client::{StorageClient, UploadOptions};

use crate::domains::certificates::models::{CertificateFileKind, STANDALONE_EVENT_ID};
use crate::domains::certificates::rendering::TemplateRenderer;
use crate::domains::certificates::service::PostgresCertificateService;
use crate::kernel::jobs::{FallbackStatusUpdater, JobStatusUpdater, PostgresJobQueue};
use crate::kernel::{
    BaseCertificateRenderer, BaseCertificateService, BaseCertificateStorage, BaseJobQueue,
};

// =============================================================================
// StorageClient Adapter (implements BaseCertificateStorage trait)
// =============================================================================

/// Wrapper around StorageClient that implements BaseCertificateStorage trait
pub struct StorageUploader {
    client: Arc<StorageClient>,
    bucket: String,
}

impl StorageUploader {
    pub fn new(client: Arc<StorageClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// `<event_id|standalone>/<user_id>/<filename>`
    /// Certificates are never overwritten: a path that already holds an
    /// issued certificate fails the upload.
    pub fn upload_options(kind: CertificateFileKind) -> UploadOptions {
        UploadOptions {
            content_type: mime_guess::from_ext(kind.extension())
                .first_or_octet_stream()
                .to_string(),
            upsert: false,
            ..Default::default()
        }
    }

    pub fn object_path(event_id: Option<&str>, user_id: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            event_id.unwrap_or(STANDALONE_EVENT_ID),
            user_id,
            filename
        )
    }
}

#[async_trait]
impl BaseCertificateStorage for StorageUploader {
    async fn upload_certificate_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        kind: CertificateFileKind,
        event_id: Option<&str>,
        user_id: &str,
    ) -> Result<String> {
        let path = Self::object_path(event_id, user_id, filename);

        let stored = self
            .client
            .upload(&self.bucket, &path, bytes, Self::upload_options(kind))
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        tracing::debug!(bucket = %stored.bucket, path = %stored.path, "certificate file uploaded");
        Ok(stored.public_url)
    }
}

// =============================================================================
// CertificateDeps
// =============================================================================

/// Dependencies for certificate job processing (using traits for testability)
#[derive(Clone)]
pub struct CertificateDeps {
    pub job_queue: Arc<dyn BaseJobQueue>,
    pub certificates: Arc<dyn BaseCertificateService>,
    pub renderer: Arc<dyn BaseCertificateRenderer>,
    pub storage: Arc<dyn BaseCertificateStorage>,
    /// RPC status writes with a direct row write as fallback
    pub status_updater: Arc<dyn JobStatusUpdater>,
}

impl CertificateDeps {
    /// Create new CertificateDeps with the default two-tier status updater
    pub fn new(
        job_queue: Arc<dyn BaseJobQueue>,
        certificates: Arc<dyn BaseCertificateService>,
        renderer: Arc<dyn BaseCertificateRenderer>,
        storage: Arc<dyn BaseCertificateStorage>,
        status_timeout: Duration,
    ) -> Self {
        let status_updater = Arc::new(FallbackStatusUpdater::for_queue(
            job_queue.clone(),
            status_timeout,
        ));
        Self {
            job_queue,
            certificates,
            renderer,
            storage,
            status_updater,
        }
    }

    /// Replace the status updater
    pub fn with_status_updater(mut self, status_updater: Arc<dyn JobStatusUpdater>) -> Self {
        self.status_updater = status_updater;
        self
    }

    /// Postgres-backed queue and certificate store, storage-client uploads,
    /// and the built-in template renderer.
    pub fn production(
        pool: PgPool,
        storage_url: &str,
        storage_service_key: &str,
        bucket: &str,
        call_timeout: Duration,
    ) -> Result<Self> {
        let client = StorageClient::new(storage_url, storage_service_key)
            .context("Failed to create storage client")?;

        Ok(Self::new(
            Arc::new(PostgresJobQueue::new(pool.clone())),
            Arc::new(PostgresCertificateService::new(pool)),
            Arc::new(TemplateRenderer::new()),
            Arc::new(StorageUploader::new(Arc::new(client), bucket)),
            call_timeout,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_uses_event_folder() {
        assert_eq!(
            StorageUploader::object_path(Some("evt-1"), "u1", "TS-005.pdf"),
            "evt-1/u1/TS-005.pdf"
        );
    }

    #[test]
    fn standalone_files_share_a_folder() {
        assert_eq!(
            StorageUploader::object_path(None, "u1", "STD-042.png"),
            "standalone/u1/STD-042.png"
        );
    }

    #[test]
    fn content_types_come_from_extension() {
        let pdf = StorageUploader::upload_options(CertificateFileKind::Pdf);
        let png = StorageUploader::upload_options(CertificateFileKind::Png);
        assert_eq!(pdf.content_type, "application/pdf");
        assert_eq!(png.content_type, "image/png");
    }

    #[test]
    fn uploads_never_overwrite() {
        assert!(!StorageUploader::upload_options(CertificateFileKind::Pdf).upsert);
        assert!(!StorageUploader::upload_options(CertificateFileKind::Png).upsert);
    }
}
