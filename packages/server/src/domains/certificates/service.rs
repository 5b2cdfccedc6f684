//! Postgres-backed certificate store: configs, counters and issued certificates.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::activities::numbering::fallback_certificate_number;
use super::models::{CertificateConfig, EventCertificateCounter, NewCertificate};
use crate::kernel::BaseCertificateService;

#[derive(Clone)]
pub struct PostgresCertificateService {
    pool: PgPool,
}

impl PostgresCertificateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseCertificateService for PostgresCertificateService {
    async fn get_certificate_config(&self, event_id: &str) -> Result<Option<CertificateConfig>> {
        CertificateConfig::find_for_event(event_id, &self.pool).await
    }

    async fn get_current_certificate_count(&self, event_id: &str) -> Result<i64> {
        EventCertificateCounter::current(event_id, &self.pool).await
    }

    async fn increment_certificate_counter(&self, event_id: &str) -> Result<()> {
        let counter = EventCertificateCounter::increment(event_id, &self.pool).await?;
        tracing::debug!(
            event_id = %counter.event_id,
            count = counter.certificate_count,
            "certificate counter incremented"
        );
        Ok(())
    }

    async fn generate_certificate_number(&self, event_id: &str, user_id: &str) -> Result<String> {
        Ok(fallback_certificate_number(event_id, user_id, Utc::now()))
    }

    async fn save_certificate(&self, certificate: &NewCertificate) -> Result<()> {
        let saved = certificate.insert(&self.pool).await?;
        tracing::debug!(certificate_id = %saved.id, "certificate saved");
        Ok(())
    }
}
