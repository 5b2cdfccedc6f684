use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::domains::certificates::activities::{ProcessorConfig, MAX_BATCH_SIZE};
use crate::kernel::jobs::JobWorkerConfig;

/// Worker configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub storage_url: String,
    pub storage_service_key: String,
    pub certificate_bucket: String,
    pub worker_batch_size: usize,
    pub worker_poll_interval_secs: u64,
    pub external_call_timeout_secs: u64,
    pub stale_job_after_minutes: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            storage_url: env::var("STORAGE_URL").context("STORAGE_URL must be set")?,
            storage_service_key: env::var("STORAGE_SERVICE_KEY")
                .context("STORAGE_SERVICE_KEY must be set")?,
            certificate_bucket: env::var("CERTIFICATE_BUCKET")
                .unwrap_or_else(|_| "certificates".to_string()),
            worker_batch_size: env::var("WORKER_BATCH_SIZE")
                .unwrap_or_else(|_| MAX_BATCH_SIZE.to_string())
                .parse::<usize>()
                .context("WORKER_BATCH_SIZE must be a valid number")?
                .clamp(1, MAX_BATCH_SIZE),
            worker_poll_interval_secs: env::var("WORKER_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("WORKER_POLL_INTERVAL_SECS must be a valid number")?,
            external_call_timeout_secs: env::var("EXTERNAL_CALL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("EXTERNAL_CALL_TIMEOUT_SECS must be a valid number")?,
            stale_job_after_minutes: env::var("STALE_JOB_AFTER_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("STALE_JOB_AFTER_MINUTES must be a valid number")?,
        })
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            batch_size: self.worker_batch_size,
            call_timeout: self.call_timeout(),
        }
    }

    pub fn worker_config(&self) -> JobWorkerConfig {
        JobWorkerConfig {
            poll_interval: Duration::from_secs(self.worker_poll_interval_secs),
            ..Default::default()
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.external_call_timeout_secs)
    }

    pub fn stale_job_after(&self) -> Duration {
        Duration::from_secs(self.stale_job_after_minutes * 60)
    }
}
