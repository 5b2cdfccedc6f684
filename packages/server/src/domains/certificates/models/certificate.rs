use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// The two artifacts rendered for every certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateFileKind {
    Pdf,
    Png,
}

impl CertificateFileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            CertificateFileKind::Pdf => "pdf",
            CertificateFileKind::Png => "png",
        }
    }

    /// `{certificate_number}.{ext}`
    pub fn file_name(&self, certificate_number: &str) -> String {
        format!("{}.{}", certificate_number, self.extension())
    }
}

impl std::fmt::Display for CertificateFileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificateFileKind::Pdf => write!(f, "PDF"),
            CertificateFileKind::Png => write!(f, "PNG"),
        }
    }
}

/// An issued certificate
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Certificate {
    pub id: Uuid,
    pub event_id: Option<String>,
    pub user_id: String,
    pub certificate_number: String,
    pub participant_name: String,
    pub event_title: String,
    pub completion_date: String,
    pub pdf_url: String,
    pub png_url: String,
    pub created_at: DateTime<Utc>,
}

/// Row to insert once both artifacts are uploaded
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewCertificate {
    #[builder(default)]
    pub event_id: Option<String>,
    pub user_id: String,
    pub certificate_number: String,
    pub participant_name: String,
    pub event_title: String,
    pub completion_date: String,
    pub pdf_url: String,
    pub png_url: String,
}

/// What a successful job reports back; stored as the job's `result_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCertificate {
    pub certificate_number: String,
    pub pdf_url: String,
    pub png_url: String,
}

impl GeneratedCertificate {
    pub fn to_result_data(&self) -> serde_json::Value {
        serde_json::json!({
            "certificateNumber": self.certificate_number,
            "pdfUrl": self.pdf_url,
            "pngUrl": self.png_url,
        })
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl NewCertificate {
    pub async fn insert(&self, pool: &PgPool) -> Result<Certificate> {
        let certificate = sqlx::query_as::<_, Certificate>(
            r#"
            INSERT INTO certificates (
                event_id, user_id, certificate_number, participant_name,
                event_title, completion_date, pdf_url, png_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&self.event_id)
        .bind(&self.user_id)
        .bind(&self.certificate_number)
        .bind(&self.participant_name)
        .bind(&self.event_title)
        .bind(&self.completion_date)
        .bind(&self.pdf_url)
        .bind(&self.png_url)
        .fetch_one(pool)
        .await?;
        Ok(certificate)
    }
}

impl Certificate {
    pub async fn find_by_number(certificate_number: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let certificates = sqlx::query_as::<_, Certificate>(
            "SELECT * FROM certificates WHERE certificate_number = $1 ORDER BY created_at",
        )
        .bind(certificate_number)
        .fetch_all(pool)
        .await?;
        Ok(certificates)
    }

    pub async fn find_by_event(event_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let certificates = sqlx::query_as::<_, Certificate>(
            "SELECT * FROM certificates WHERE event_id = $1 ORDER BY created_at",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;
        Ok(certificates)
    }

    pub async fn find_standalone_for_user(user_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let certificates = sqlx::query_as::<_, Certificate>(
            "SELECT * FROM certificates WHERE event_id IS NULL AND user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(certificates)
    }
}
