use thiserror::Error;

use super::models::CertificateFileKind;

/// Why a certificate job failed.
///
/// The `Display` text is what ends up in `job_queue.error_message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateJobError {
    #[error("Certificate config not found")]
    ConfigNotFound,

    /// Error reported by the config store, surfaced verbatim
    #[error("{0}")]
    Config(String),

    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),

    #[error("Certificate number generation failed: {0}")]
    Numbering(String),

    #[error("PDF generation failed: {0}")]
    PdfGeneration(String),

    #[error("PNG generation failed: {0}")]
    PngGeneration(String),

    #[error("Certificate generation returned no data (PDF={pdf}, PNG={png})")]
    EmptyOutput { pdf: bool, png: bool },

    #[error("{kind} upload failed: {message}")]
    Upload {
        kind: CertificateFileKind,
        message: String,
    },

    #[error("Failed to save certificate: {0}")]
    Save(String),

    #[error("{step} timed out after {secs}s")]
    Timeout { step: &'static str, secs: u64 },
}
