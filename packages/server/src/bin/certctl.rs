//! Operator CLI for the certificate queue
//!
//! Runs migrations, enqueues certificate jobs, drains a single batch and
//! sweeps stale jobs. Every command prints one JSON object.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use cert_core::domains::certificates::activities::{process_job_batch, BatchSummary};
use cert_core::domains::certificates::models::{CertificateConfig, CertificateJobPayload};
use cert_core::kernel::jobs::PostgresJobQueue;
use cert_core::kernel::scheduled_tasks::run_stale_sweep;
use cert_core::kernel::CertificateDeps;
use cert_core::Config;

#[derive(Parser)]
#[command(name = "certctl")]
#[command(about = "Certificate job queue CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,

    /// Enqueue a certificate job
    Enqueue {
        /// Event id, or "standalone"
        #[arg(long)]
        event_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        participant_name: String,
        #[arg(long)]
        event_title: String,
        #[arg(long)]
        completion_date: String,
        #[arg(long)]
        venue: Option<String>,
        /// JSON certificate config to send inline (required for standalone)
        #[arg(long)]
        config_file: Option<std::path::PathBuf>,
    },

    /// Drain one batch of jobs
    Drain,

    /// Fail jobs stuck in processing
    Sweep,
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<BatchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

impl Response {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
            job_id: None,
            summary: None,
            count: None,
        }
    }
}

fn output(resp: Response) -> Result<()> {
    println!("{}", serde_json::to_string(&resp)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => cmd_migrate().await,
        Commands::Enqueue {
            event_id,
            user_id,
            participant_name,
            event_title,
            completion_date,
            venue,
            config_file,
        } => {
            let config = match config_file {
                Some(path) => Some(read_config(&path)?),
                None => None,
            };
            cmd_enqueue(CertificateJobPayload {
                event_id,
                user_id,
                participant_name,
                event_title,
                completion_date,
                venue,
                config,
            })
            .await
        }
        Commands::Drain => cmd_drain().await,
        Commands::Sweep => cmd_sweep().await,
    }
}

async fn get_pool() -> Result<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")
}

fn read_config(path: &std::path::Path) -> Result<CertificateConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config in {}", path.display()))
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_migrate() -> Result<()> {
    let pool = get_pool().await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    output(Response {
        message: Some("Migrations applied".to_string()),
        ..Response::ok()
    })
}

async fn cmd_enqueue(payload: CertificateJobPayload) -> Result<()> {
    let queue = PostgresJobQueue::new(get_pool().await?);
    let job_id = queue.enqueue_certificate_job(&payload).await?;

    output(Response {
        job_id: Some(job_id),
        ..Response::ok()
    })
}

async fn cmd_drain() -> Result<()> {
    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let deps = CertificateDeps::production(
        pool,
        &config.storage_url,
        &config.storage_service_key,
        &config.certificate_bucket,
        config.call_timeout(),
    )?;
    let summary = process_job_batch(&deps, &config.processor_config()).await;

    output(Response {
        summary: Some(summary),
        ..Response::ok()
    })
}

async fn cmd_sweep() -> Result<()> {
    dotenvy::dotenv().ok();
    let stale_after_minutes: u64 = std::env::var("STALE_JOB_AFTER_MINUTES")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .context("STALE_JOB_AFTER_MINUTES must be a valid number")?;

    let queue = PostgresJobQueue::new(get_pool().await?);
    let count = run_stale_sweep(
        &queue,
        std::time::Duration::from_secs(stale_after_minutes * 60),
    )
    .await?;

    output(Response {
        count: Some(count),
        ..Response::ok()
    })
}
