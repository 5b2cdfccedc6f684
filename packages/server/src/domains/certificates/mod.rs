//! Certificates domain - job payloads, numbering, rendering and storage of
//! issued certificates.

pub mod activities;
pub mod errors;
pub mod models;
pub mod rendering;
pub mod service;

pub use errors::CertificateJobError;
pub use service::PostgresCertificateService;
