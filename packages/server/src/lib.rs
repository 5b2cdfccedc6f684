// Certificate Worker - Core
//
// This crate drains the certificate job queue: it claims pending jobs,
// renders certificate PDFs and PNGs, uploads them to object storage and
// records the issued certificates.
//
// Certificate logic lives in domains/certificates; queue plumbing in kernel/jobs.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
