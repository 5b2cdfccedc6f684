use serde::Deserialize;

/// Options for a single object upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub content_type: String,
    /// Overwrite an existing object at the same path. Off by default: the API
    /// then rejects the upload with a 409.
    pub upsert: bool,
    pub cache_control_secs: u32,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            upsert: false,
            cache_control_secs: 3600,
        }
    }
}

/// Response body of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Id")]
    pub id: Option<String>,
}

/// Error body returned by the storage API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<String>,
}

/// A stored object and where it can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub public_url: String,
}
