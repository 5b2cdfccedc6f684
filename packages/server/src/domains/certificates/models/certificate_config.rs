use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

/// Template descriptor for an event's certificates.
///
/// The worker only reads `cert_id_prefix`; everything else is handed to the
/// renderer. Keys this struct does not know about survive in `extra`. A known
/// key holding a value of the wrong type falls back to that field's default,
/// so one bad value never makes a whole event's config unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub cert_id_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub body_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub signatory_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub signatory_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub accent_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "or_default")]
    pub text_color: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub orientation: Orientation,
    #[serde(deserialize_with = "flag_or_true")]
    pub show_certificate_number: bool,
    #[serde(deserialize_with = "flag_or_true")]
    pub show_venue: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            cert_id_prefix: None,
            title: None,
            subtitle: None,
            body_text: None,
            organization_name: None,
            signatory_name: None,
            signatory_title: None,
            background_color: None,
            accent_color: None,
            text_color: None,
            orientation: Orientation::default(),
            show_certificate_number: true,
            show_venue: true,
            extra: serde_json::Map::new(),
        }
    }
}

fn or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match T::deserialize(&value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            tracing::warn!(value = %value, error = %e, "ignoring mistyped certificate config value");
            Ok(T::default())
        }
    }
}

/// Booleans default to on. `"true"` and `"false"` strings are accepted.
fn flag_or_true<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let flag = match &value {
        Value::Bool(b) => *b,
        Value::String(s) if s.eq_ignore_ascii_case("true") => true,
        Value::String(s) if s.eq_ignore_ascii_case("false") => false,
        Value::Null => true,
        other => {
            tracing::warn!(value = %other, "ignoring mistyped certificate config flag");
            true
        }
    };
    Ok(flag)
}

impl CertificateConfig {
    /// Config with only a numbering prefix set.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            cert_id_prefix: Some(prefix.into()),
            ..Default::default()
        }
    }

    /// Numbering prefix, if one is configured. Blank prefixes count as none.
    pub fn numbering_prefix(&self) -> Option<&str> {
        self.cert_id_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("Certificate of Completion")
    }

    pub fn body_text(&self) -> &str {
        self.body_text
            .as_deref()
            .unwrap_or("This certifies that")
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl CertificateConfig {
    /// Find the certificate configuration for an event
    pub async fn find_for_event(event_id: &str, pool: &PgPool) -> Result<Option<Self>> {
        let config = sqlx::query_scalar::<_, Json<CertificateConfig>>(
            "SELECT config FROM certificate_configs WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(pool)
        .await?;
        Ok(config.map(|Json(c)| c))
    }

    /// Create or replace the configuration for an event
    pub async fn upsert_for_event(&self, event_id: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO certificate_configs (event_id, config)
            VALUES ($1, $2)
            ON CONFLICT (event_id) DO UPDATE SET
                config = EXCLUDED.config,
                updated_at = NOW()
            "#,
        )
        .bind(event_id)
        .bind(Json(self))
        .execute(pool)
        .await?;
        Ok(())
    }
}
