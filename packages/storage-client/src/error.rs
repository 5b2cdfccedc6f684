use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid storage URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),
}
