//! Certificate Worker
//!
//! Runs the job worker that drains the certificate queue, plus the scheduled
//! stale-job sweep, until Ctrl-C.

use anyhow::{Context, Result};
use cert_core::kernel::jobs::{JobWorker, PostgresJobQueue};
use cert_core::kernel::scheduled_tasks::start_scheduler;
use cert_core::kernel::CertificateDeps;
use cert_core::Config;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cert_core=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting certificate worker");

    let config = Config::from_env()?;

    // Database setup
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let deps = CertificateDeps::production(
        pool.clone(),
        &config.storage_url,
        &config.storage_service_key,
        &config.certificate_bucket,
        config.call_timeout(),
    )?;

    let mut scheduler =
        start_scheduler(PostgresJobQueue::new(pool.clone()), config.stale_job_after()).await?;

    let shutdown = CancellationToken::new();
    let worker = JobWorker::with_config(deps, config.processor_config(), config.worker_config());
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    shutdown.cancel();
    worker_handle.await.context("Worker task panicked")??;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Failed to stop scheduler");
    }
    pool.close().await;

    tracing::info!("Certificate worker stopped");
    Ok(())
}
