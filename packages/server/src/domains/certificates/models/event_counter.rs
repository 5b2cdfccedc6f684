use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Running count of certificates issued for an event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventCertificateCounter {
    pub event_id: String,
    pub certificate_count: i32,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries
// =============================================================================

impl EventCertificateCounter {
    /// Current count; events that never issued a certificate count as zero.
    pub async fn current(event_id: &str, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i32>(
            "SELECT certificate_count FROM event_certificate_counters WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(pool)
        .await?;
        Ok(count.map(i64::from).unwrap_or(0))
    }

    /// Add one to the event's count in a single statement and return the new row.
    pub async fn increment(event_id: &str, pool: &PgPool) -> Result<Self> {
        let counter = sqlx::query_as::<_, EventCertificateCounter>(
            r#"
            INSERT INTO event_certificate_counters (event_id, certificate_count)
            VALUES ($1, 1)
            ON CONFLICT (event_id) DO UPDATE SET
                certificate_count = event_certificate_counters.certificate_count + 1,
                updated_at = NOW()
            RETURNING event_id, certificate_count, updated_at
            "#,
        )
        .bind(event_id)
        .fetch_one(pool)
        .await?;
        Ok(counter)
    }
}
