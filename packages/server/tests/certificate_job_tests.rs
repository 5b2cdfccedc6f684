//! Certificate job behaviour against in-memory collaborators.
//!
//! Covers the end-to-end contract of a batch drain: numbering, standalone
//! handling, render/upload failures, status fallback and non-idempotence.

use std::time::Duration;

use cert_core::domains::certificates::activities::{
    process_certificate_job, process_job_batch, BatchSummary, ProcessorConfig,
};
use cert_core::domains::certificates::models::{CertificateConfig, CertificateFileKind};
use cert_core::domains::certificates::CertificateJobError;
use cert_core::kernel::jobs::{JobStatus, CERTIFICATE_JOB_TYPE};
use cert_core::kernel::test_dependencies::{MockJobQueue, MockStorage, TestDependencies};
use cert_core::kernel::BaseCertificateStorage;
use regex::Regex;
use serde_json::json;

fn processor() -> ProcessorConfig {
    ProcessorConfig {
        call_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn ada_payload() -> serde_json::Value {
    json!({
        "eventId": "evt-1",
        "userId": "u1",
        "participantName": "Ada Lovelace",
        "eventTitle": "Tech Summit",
        "completionDate": "2024-06-15"
    })
}

fn standalone_payload(prefix: &str) -> serde_json::Value {
    json!({
        "eventId": "standalone",
        "userId": "u1",
        "participantName": "Ada Lovelace",
        "eventTitle": "Workshop",
        "completionDate": "2024-06-15",
        "config": {"cert_id_prefix": prefix}
    })
}

// =============================================================================
// Numbering
// =============================================================================

#[tokio::test]
async fn prefixed_event_certificate_uses_next_count() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::with_prefix("TS"));
    test.certificates.set_count("evt-1", 4);
    let id = test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());

    let summary = process_job_batch(&test.deps(), &processor()).await;

    assert_eq!(
        summary,
        BatchSummary {
            processed: 1,
            succeeded: 1,
            failed: 0
        }
    );
    let result = test.job_queue.result_of(id).unwrap();
    assert_eq!(result["certificateNumber"], "TS-005");
    assert_eq!(result["pdfUrl"], format!("{}/evt-1/u1/TS-005.pdf", MockStorage::BASE_URL));
    assert_eq!(result["pngUrl"], format!("{}/evt-1/u1/TS-005.png", MockStorage::BASE_URL));

    let saved = test.certificates.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].event_id.as_deref(), Some("evt-1"));
    assert_eq!(saved[0].certificate_number, "TS-005");
    assert_eq!(saved[0].participant_name, "Ada Lovelace");
    assert_eq!(test.certificates.count_of("evt-1"), 5);
}

#[tokio::test]
async fn standalone_certificate_skips_counter_and_has_no_event() {
    let test = TestDependencies::new();
    let id = test
        .job_queue
        .push_job(CERTIFICATE_JOB_TYPE, standalone_payload("STD"));

    process_job_batch(&test.deps(), &processor()).await;

    let number = test.job_queue.result_of(id).unwrap()["certificateNumber"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(Regex::new(r"^STD-\d{3}$").unwrap().is_match(&number), "{}", number);

    let saved = test.certificates.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].event_id, None);
    assert_eq!(test.certificates.count_reads(), 0);
    assert_eq!(test.certificates.increments(), 0);
    assert_eq!(test.certificates.config_fetches(), 0);

    let uploads = test.storage.uploads();
    assert!(uploads.iter().all(|u| u.event_id.is_none()));
}

#[tokio::test]
async fn event_without_prefix_uses_fallback_generator() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::default());

    let generated = process_certificate_job(&ada_payload(), &test.deps(), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(
        test.certificates.generated_numbers(),
        vec![("evt-1".to_string(), "u1".to_string())]
    );
    assert!(Regex::new(r"^CERT-[0-9A-F]{8}-\d{12}-[0-9A-F]{8}$")
        .unwrap()
        .is_match(&generated.certificate_number));
    assert_eq!(test.certificates.count_reads(), 0);
}

#[tokio::test]
async fn rerunning_a_job_issues_a_second_certificate() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::with_prefix("TS"));
    test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());
    test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());

    let summary = process_job_batch(&test.deps(), &processor()).await;

    assert_eq!(summary.succeeded, 2);
    let numbers: Vec<String> = test
        .certificates
        .saved()
        .into_iter()
        .map(|c| c.certificate_number)
        .collect();
    assert_eq!(numbers, vec!["TS-001", "TS-002"]);
}

#[tokio::test]
async fn rerunning_without_prefix_gives_distinct_numbers_and_files() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::default());
    test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());
    test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());

    let summary = process_job_batch(&test.deps(), &processor()).await;

    assert_eq!(summary.succeeded, 2);
    let saved = test.certificates.saved();
    assert_eq!(saved.len(), 2);
    assert_ne!(saved[0].certificate_number, saved[1].certificate_number);
    assert_ne!(saved[0].pdf_url, saved[1].pdf_url);
    assert_ne!(saved[0].png_url, saved[1].png_url);
}

#[tokio::test]
async fn storage_refuses_to_overwrite_an_object() {
    let storage = MockStorage::new();

    let first = storage
        .upload_certificate_file(vec![1], "TS-001.pdf", CertificateFileKind::Pdf, Some("evt-1"), "u1")
        .await
        .unwrap();
    let again = storage
        .upload_certificate_file(vec![2], "TS-001.pdf", CertificateFileKind::Pdf, Some("evt-1"), "u1")
        .await;
    let other_user = storage
        .upload_certificate_file(vec![3], "TS-001.pdf", CertificateFileKind::Pdf, Some("evt-1"), "u2")
        .await;

    assert_eq!(first, format!("{}/evt-1/u1/TS-001.pdf", MockStorage::BASE_URL));
    assert_eq!(again.unwrap_err().to_string(), "The resource already exists");
    assert!(other_user.is_ok());
    assert_eq!(storage.uploads().len(), 2);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn missing_config_fails_job() {
    let test = TestDependencies::new();
    let id = test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());

    let summary = process_job_batch(&test.deps(), &processor()).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(test.job_queue.status_of(id), Some(JobStatus::Failed));
    assert_eq!(
        test.job_queue.error_of(id).as_deref(),
        Some("Certificate config not found")
    );
    assert!(test.job_queue.result_of(id).is_none());
    assert_eq!(test.renderer.pdf_calls(), 0);
}

#[tokio::test]
async fn standalone_without_config_fails_with_config_not_found() {
    let test = TestDependencies::new();
    let mut payload = standalone_payload("STD");
    payload.as_object_mut().unwrap().remove("config");

    let err = process_certificate_job(&payload, &test.deps(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err, CertificateJobError::ConfigNotFound);
}

#[tokio::test]
async fn png_failure_stops_before_upload_and_save() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::with_prefix("TS"));
    test.renderer.fail_png_with("font not found");

    let err = process_certificate_job(&ada_payload(), &test.deps(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "PNG generation failed: font not found");
    assert!(test.storage.uploads().is_empty());
    assert!(test.certificates.saved().is_empty());
    assert_eq!(test.certificates.increments(), 0);
}

#[tokio::test]
async fn empty_pdf_is_reported() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::with_prefix("TS"));
    test.renderer.return_empty_pdf();

    let err = process_certificate_job(&ada_payload(), &test.deps(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Certificate generation returned no data (PDF=false, PNG=true)"
    );
}

#[tokio::test]
async fn pdf_upload_failure_fails_job() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::with_prefix("TS"));
    test.storage
        .fail_uploads_of(CertificateFileKind::Pdf, "quota exceeded");
    let id = test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());

    process_job_batch(&test.deps(), &processor()).await;

    assert_eq!(
        test.job_queue.error_of(id).as_deref(),
        Some("PDF upload failed: quota exceeded")
    );
    assert!(test.certificates.saved().is_empty());
}

// =============================================================================
// Status writes
// =============================================================================

#[tokio::test]
async fn completion_falls_back_to_direct_write() {
    let test = TestDependencies::with_job_queue(MockJobQueue::new().with_failing_rpcs());
    test.certificates
        .set_config("evt-1", CertificateConfig::with_prefix("TS"));
    let id = test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());

    let summary = process_job_batch(&test.deps(), &processor()).await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(test.job_queue.status_of(id), Some(JobStatus::Completed));
    assert_eq!(
        test.job_queue.result_of(id).unwrap()["certificateNumber"],
        "TS-001"
    );
    assert_eq!(test.job_queue.direct_writes(), vec![id]);
    assert!(test.job_queue.rpc_completions().is_empty());
}

#[tokio::test]
async fn failure_falls_back_to_direct_write() {
    let test = TestDependencies::with_job_queue(MockJobQueue::new().with_failing_rpcs());
    let id = test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());

    process_job_batch(&test.deps(), &processor()).await;

    assert_eq!(test.job_queue.status_of(id), Some(JobStatus::Failed));
    assert_eq!(
        test.job_queue.error_of(id).as_deref(),
        Some("Certificate config not found")
    );
    assert_eq!(test.job_queue.direct_writes(), vec![id]);
}

// =============================================================================
// Batching
// =============================================================================

#[tokio::test]
async fn batch_mixes_outcomes() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::with_prefix("TS"));
    let ok = test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());
    let unknown = test.job_queue.push_job("send_email", json!({}));
    test.job_queue
        .push_job_without_id(CERTIFICATE_JOB_TYPE, ada_payload());
    let bad = test
        .job_queue
        .push_job(CERTIFICATE_JOB_TYPE, json!({"eventId": "evt-1"}));

    let summary = process_job_batch(&test.deps(), &processor()).await;

    assert_eq!(
        summary,
        BatchSummary {
            processed: 3,
            succeeded: 1,
            failed: 3
        }
    );
    assert_eq!(test.job_queue.status_of(ok), Some(JobStatus::Completed));
    assert_eq!(
        test.job_queue.error_of(unknown).as_deref(),
        Some("Unknown job type")
    );
    assert!(test
        .job_queue
        .error_of(bad)
        .unwrap()
        .starts_with("Invalid job payload:"));
}

#[tokio::test]
async fn smaller_batch_size_is_respected() {
    let test = TestDependencies::new();
    test.certificates
        .set_config("evt-1", CertificateConfig::with_prefix("TS"));
    for _ in 0..5 {
        test.job_queue.push_job(CERTIFICATE_JOB_TYPE, ada_payload());
    }

    let config = ProcessorConfig {
        batch_size: 3,
        ..processor()
    };
    let summary = process_job_batch(&test.deps(), &config).await;

    assert_eq!(summary.processed, 3);
    assert_eq!(test.job_queue.count_in(JobStatus::Pending), 2);
    assert_eq!(test.job_queue.claims(), 3);
}
