//! Single certificate job: config, number, render, upload, count, save.
//!
//! Steps run strictly in that order. Every collaborator call is bounded by the
//! processor's call timeout. Only the counter increment is allowed to fail
//! without failing the job.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::numbering::{event_certificate_number, standalone_certificate_number};
use crate::domains::certificates::errors::CertificateJobError;
use crate::domains::certificates::models::{
    CertificateConfig, CertificateFileKind, CertificateJob, GeneratedCertificate, NewCertificate,
    STANDALONE_EVENT_ID,
};
use crate::kernel::deadline::{with_deadline, DeadlineError};
use crate::kernel::CertificateDeps;

/// Parse a raw job payload and generate its certificate.
pub async fn process_certificate_job(
    payload: &serde_json::Value,
    deps: &CertificateDeps,
    call_timeout: Duration,
) -> Result<GeneratedCertificate, CertificateJobError> {
    let job = CertificateJob::from_payload(payload)?;
    generate_certificate(&job, deps, call_timeout).await
}

/// Generate, upload and record the certificate for one job.
pub async fn generate_certificate(
    job: &CertificateJob,
    deps: &CertificateDeps,
    call_timeout: Duration,
) -> Result<GeneratedCertificate, CertificateJobError> {
    let secs = call_timeout.as_secs();
    let participant = job.participant();

    // 1. Configuration
    let config = resolve_config(job, deps, call_timeout).await?;

    // 2. Number
    let certificate_number = assign_number(job, &config, deps, call_timeout).await?;
    debug!(
        event_id = job.event_id().unwrap_or(STANDALONE_EVENT_ID),
        user_id = job.user_id(),
        certificate_number = %certificate_number,
        "certificate number assigned"
    );

    // 3. Render
    let pdf = with_deadline(
        call_timeout,
        deps.renderer
            .generate_pdf(&config, &certificate_number, participant),
    )
    .await
    .map_err(|e| match e {
        DeadlineError::TimedOut(_) => CertificateJobError::Timeout {
            step: "PDF generation",
            secs,
        },
        DeadlineError::Failed(e) => CertificateJobError::PdfGeneration(e.to_string()),
    })?;

    let png = with_deadline(
        call_timeout,
        deps.renderer
            .generate_png(&config, &certificate_number, participant),
    )
    .await
    .map_err(|e| match e {
        DeadlineError::TimedOut(_) => CertificateJobError::Timeout {
            step: "PNG generation",
            secs,
        },
        DeadlineError::Failed(e) => CertificateJobError::PngGeneration(e.to_string()),
    })?;

    if pdf.is_empty() || png.is_empty() {
        return Err(CertificateJobError::EmptyOutput {
            pdf: !pdf.is_empty(),
            png: !png.is_empty(),
        });
    }

    // 4. Upload both files, then check both results
    let (pdf_url, png_url) = futures::join!(
        upload(job, deps, pdf, CertificateFileKind::Pdf, &certificate_number, call_timeout),
        upload(job, deps, png, CertificateFileKind::Png, &certificate_number, call_timeout),
    );
    let pdf_url = pdf_url?;
    let png_url = png_url?;

    // 5. Counter (best effort)
    if let CertificateJob::Event { event_id, .. } = job {
        if let Err(e) = with_deadline(
            call_timeout,
            deps.certificates.increment_certificate_counter(event_id),
        )
        .await
        {
            warn!(event_id = %event_id, error = %e, "failed to increment certificate counter");
        }
    }

    // 6. Persist
    let record = NewCertificate::builder()
        .event_id(job.event_id().map(str::to_string))
        .user_id(job.user_id())
        .certificate_number(certificate_number.as_str())
        .participant_name(participant.name.as_str())
        .event_title(participant.event_title.as_str())
        .completion_date(participant.completion_date.as_str())
        .pdf_url(pdf_url.as_str())
        .png_url(png_url.as_str())
        .build();

    with_deadline(call_timeout, deps.certificates.save_certificate(&record))
        .await
        .map_err(|e| match e {
            DeadlineError::TimedOut(_) => CertificateJobError::Timeout {
                step: "Certificate save",
                secs,
            },
            DeadlineError::Failed(e) => CertificateJobError::Save(e.to_string()),
        })?;

    info!(
        event_id = job.event_id().unwrap_or(STANDALONE_EVENT_ID),
        user_id = job.user_id(),
        certificate_number = %certificate_number,
        "certificate generated"
    );

    Ok(GeneratedCertificate {
        certificate_number,
        pdf_url,
        png_url,
    })
}

async fn resolve_config(
    job: &CertificateJob,
    deps: &CertificateDeps,
    call_timeout: Duration,
) -> Result<CertificateConfig, CertificateJobError> {
    let event_id = match job {
        CertificateJob::Standalone { config, .. } => return Ok(config.clone()),
        CertificateJob::Event {
            inline_config: Some(config),
            ..
        } => return Ok(config.clone()),
        CertificateJob::Event { event_id, .. } => event_id,
    };

    match with_deadline(
        call_timeout,
        deps.certificates.get_certificate_config(event_id),
    )
    .await
    {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Err(CertificateJobError::ConfigNotFound),
        Err(DeadlineError::TimedOut(_)) => Err(CertificateJobError::Timeout {
            step: "Config fetch",
            secs: call_timeout.as_secs(),
        }),
        Err(DeadlineError::Failed(e)) => Err(CertificateJobError::Config(e.to_string())),
    }
}

async fn assign_number(
    job: &CertificateJob,
    config: &CertificateConfig,
    deps: &CertificateDeps,
    call_timeout: Duration,
) -> Result<String, CertificateJobError> {
    match (config.numbering_prefix(), job) {
        (Some(prefix), CertificateJob::Standalone { .. }) => {
            Ok(standalone_certificate_number(prefix, Utc::now()))
        }
        (Some(prefix), CertificateJob::Event { event_id, .. }) => {
            // Numbers must not repeat within an event, so a failed read is terminal
            let count = with_deadline(
                call_timeout,
                deps.certificates.get_current_certificate_count(event_id),
            )
            .await
            .map_err(|e| match e {
                DeadlineError::TimedOut(_) => CertificateJobError::Timeout {
                    step: "Certificate count read",
                    secs: call_timeout.as_secs(),
                },
                DeadlineError::Failed(e) => CertificateJobError::Numbering(e.to_string()),
            })?;
            Ok(event_certificate_number(prefix, count))
        }
        (None, _) => {
            let event_id = job.event_id().unwrap_or(STANDALONE_EVENT_ID);
            with_deadline(
                call_timeout,
                deps.certificates
                    .generate_certificate_number(event_id, job.user_id()),
            )
            .await
            .map_err(|e| match e {
                DeadlineError::TimedOut(_) => CertificateJobError::Timeout {
                    step: "Certificate number generation",
                    secs: call_timeout.as_secs(),
                },
                DeadlineError::Failed(e) => CertificateJobError::Numbering(e.to_string()),
            })
        }
    }
}

async fn upload(
    job: &CertificateJob,
    deps: &CertificateDeps,
    bytes: Vec<u8>,
    kind: CertificateFileKind,
    certificate_number: &str,
    call_timeout: Duration,
) -> Result<String, CertificateJobError> {
    let filename = kind.file_name(certificate_number);

    with_deadline(
        call_timeout,
        deps.storage.upload_certificate_file(
            bytes,
            &filename,
            kind,
            job.event_id(),
            job.user_id(),
        ),
    )
    .await
    .map_err(|e| match e {
        DeadlineError::TimedOut(_) => CertificateJobError::Timeout {
            step: match kind {
                CertificateFileKind::Pdf => "PDF upload",
                CertificateFileKind::Png => "PNG upload",
            },
            secs: call_timeout.as_secs(),
        },
        DeadlineError::Failed(e) => CertificateJobError::Upload {
            kind,
            message: e.to_string(),
        },
    })
}
