//! Pure object-storage REST client.
//!
//! A minimal client for the managed backend's storage API. Supports uploading
//! objects into a bucket and building their public URLs.
//!
//! # Example
//!
//! ```rust,ignore
//! use storage_client::{StorageClient, UploadOptions};
//!
//! let client = StorageClient::new("https://project.example.co", "service-key")?;
//!
//! let stored = client
//!     .upload("certificates", "evt-1/u1/TS-005.pdf", pdf_bytes, UploadOptions::default())
//!     .await?;
//! println!("{}", stored.public_url);
//! ```

pub mod error;
pub mod types;

pub use error::{Result, StorageError};
pub use types::{StoredObject, UploadOptions, UploadResponse};

use types::ApiErrorBody;
use url::Url;

const OBJECT_PREFIX: &str = "storage/v1/object";

pub struct StorageClient {
    client: reqwest::Client,
    base_url: Url,
    service_key: String,
}

impl StorageClient {
    pub fn new(base_url: &str, service_key: impl Into<String>) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url, service_key)
    }

    /// Build on an existing `reqwest::Client` (shared connection pool, custom timeouts).
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        service_key: impl Into<String>,
    ) -> Result<Self> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            client,
            base_url: Url::parse(&normalized)?,
            service_key: service_key.into(),
        })
    }

    /// Upload `bytes` to `bucket/path`. Returns where the object now lives.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<StoredObject> {
        let url = self.object_url(bucket, path)?;
        let size = bytes.len();

        tracing::debug!(bucket, path, size, "Uploading object");

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("content-type", &options.content_type)
            .header("cache-control", format!("max-age={}", options.cache_control_secs))
            .header("x-upsert", options.upsert.to_string())
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let uploaded: UploadResponse = resp.json().await?;
        tracing::debug!(key = %uploaded.key, "Object uploaded");

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: self.public_url(bucket, path)?,
        })
    }

    /// Public URL of an object in a public bucket.
    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        validate_path(path)?;
        let url = self
            .base_url
            .join(&format!("{}/public/{}/{}", OBJECT_PREFIX, bucket, path))?;
        Ok(url.to_string())
    }

    fn object_url(&self, bucket: &str, path: &str) -> Result<Url> {
        validate_path(path)?;
        Ok(self
            .base_url
            .join(&format!("{}/{}/{}", OBJECT_PREFIX, bucket, path))?)
    }
}

fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|s| s == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Prefer the API's own message; fall back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| body.to_string())
}
