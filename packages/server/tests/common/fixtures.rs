//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use cert_core::domains::certificates::models::{CertificateConfig, CertificateJobPayload};
use cert_core::kernel::jobs::{Job, CERTIFICATE_JOB_TYPE};
use sqlx::PgPool;
use uuid::Uuid;

/// Payload for Ada's Tech Summit certificate
pub fn event_payload(event_id: &str, user_id: &str) -> CertificateJobPayload {
    CertificateJobPayload {
        event_id: event_id.to_string(),
        user_id: user_id.to_string(),
        participant_name: "Ada Lovelace".to_string(),
        event_title: "Tech Summit".to_string(),
        completion_date: "2024-06-15".to_string(),
        venue: None,
        config: None,
    }
}

/// Standalone payload carrying its own config
pub fn standalone_payload(user_id: &str, prefix: &str) -> CertificateJobPayload {
    CertificateJobPayload {
        config: Some(CertificateConfig::with_prefix(prefix)),
        ..event_payload("standalone", user_id)
    }
}

/// Store a config with the given numbering prefix for an event
pub async fn create_event_config(pool: &PgPool, event_id: &str, prefix: &str) -> Result<()> {
    CertificateConfig::with_prefix(prefix)
        .upsert_for_event(event_id, pool)
        .await
}

/// Enqueue a raw job of any type
pub async fn enqueue_raw(pool: &PgPool, job_type: &str, payload: serde_json::Value) -> Result<Uuid> {
    Ok(Job::enqueue(job_type, &payload, pool).await?.id)
}

/// Enqueue a certificate job
pub async fn enqueue_certificate(pool: &PgPool, payload: &CertificateJobPayload) -> Result<Uuid> {
    enqueue_raw(pool, CERTIFICATE_JOB_TYPE, serde_json::to_value(payload)?).await
}

/// Push a processing job's started_at into the past
pub async fn backdate_started_at(pool: &PgPool, job_id: Uuid, minutes: i64) -> Result<()> {
    sqlx::query(
        "UPDATE job_queue SET started_at = NOW() - make_interval(mins => $2::int) WHERE id = $1",
    )
    .bind(job_id)
    .bind(minutes as i32)
    .execute(pool)
    .await?;
    Ok(())
}
