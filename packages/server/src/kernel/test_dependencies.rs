// TestDependencies - mock implementations for testing
//
// Provides in-memory collaborators that can be injected into CertificateDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use super::jobs::{ClaimedJob, JobOutcome, JobStatus};
use super::{
    BaseCertificateRenderer, BaseCertificateService, BaseCertificateStorage, BaseJobQueue,
    CertificateDeps,
};
use crate::domains::certificates::activities::numbering::fallback_certificate_number;
use crate::domains::certificates::models::{
    CertificateConfig, CertificateFileKind, NewCertificate, ParticipantData,
};

// =============================================================================
// Mock Job Queue
// =============================================================================

/// A job row held by [`MockJobQueue`]
#[derive(Debug, Clone)]
pub struct MockJobRow {
    pub id: Option<Uuid>,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub result_data: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

#[derive(Default)]
struct MockJobQueueState {
    rows: Vec<MockJobRow>,
    claims: usize,
    rpc_completions: Vec<Uuid>,
    rpc_failures: Vec<Uuid>,
    direct_writes: Vec<Uuid>,
}

#[derive(Clone, Copy, Default, PartialEq)]
enum RpcBehavior {
    #[default]
    Ok,
    Fail,
    Hang,
}

/// In-memory job queue. Jobs are claimed oldest first.
#[derive(Clone, Default)]
pub struct MockJobQueue {
    state: Arc<Mutex<MockJobQueueState>>,
    rpc_behavior: RpcBehavior,
    fail_direct_writes: bool,
}

impl MockJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// complete_job / fail_job return an error
    pub fn with_failing_rpcs(mut self) -> Self {
        self.rpc_behavior = RpcBehavior::Fail;
        self
    }

    /// complete_job / fail_job never return
    pub fn with_hanging_rpcs(mut self) -> Self {
        self.rpc_behavior = RpcBehavior::Hang;
        self
    }

    pub fn with_failing_direct_writes(mut self) -> Self {
        self.fail_direct_writes = true;
        self
    }

    /// Add a pending job and return its id
    pub fn push_job(&self, job_type: &str, payload: serde_json::Value) -> Uuid {
        let id = Uuid::new_v4();
        self.push_row(Some(id), job_type, payload);
        id
    }

    /// Add a pending job whose claim comes back without an id
    pub fn push_job_without_id(&self, job_type: &str, payload: serde_json::Value) {
        self.push_row(None, job_type, payload);
    }

    fn push_row(&self, id: Option<Uuid>, job_type: &str, payload: serde_json::Value) {
        self.state.lock().unwrap().rows.push(MockJobRow {
            id,
            job_type: job_type.to_string(),
            payload,
            status: JobStatus::Pending,
            result_data: None,
            error_message: None,
        });
    }

    /// Move every pending job to processing
    pub fn claim_all(&self) {
        let mut state = self.state.lock().unwrap();
        for row in state.rows.iter_mut() {
            if row.status == JobStatus::Pending {
                row.status = JobStatus::Processing;
            }
        }
    }

    pub fn row(&self, id: Uuid) -> Option<MockJobRow> {
        self.state
            .lock()
            .unwrap()
            .rows
            .iter()
            .find(|r| r.id == Some(id))
            .cloned()
    }

    pub fn status_of(&self, id: Uuid) -> Option<JobStatus> {
        self.row(id).map(|r| r.status)
    }

    pub fn error_of(&self, id: Uuid) -> Option<String> {
        self.row(id).and_then(|r| r.error_message)
    }

    pub fn result_of(&self, id: Uuid) -> Option<serde_json::Value> {
        self.row(id).and_then(|r| r.result_data)
    }

    pub fn count_in(&self, status: JobStatus) -> usize {
        self.state
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|r| r.status == status)
            .count()
    }

    /// Number of get_next_job calls, including ones that found nothing
    pub fn claims(&self) -> usize {
        self.state.lock().unwrap().claims
    }

    pub fn rpc_completions(&self) -> Vec<Uuid> {
        self.state.lock().unwrap().rpc_completions.clone()
    }

    pub fn rpc_failures(&self) -> Vec<Uuid> {
        self.state.lock().unwrap().rpc_failures.clone()
    }

    pub fn direct_writes(&self) -> Vec<Uuid> {
        self.state.lock().unwrap().direct_writes.clone()
    }

    fn apply(&self, id: Uuid, outcome: &JobOutcome) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let row = state
            .rows
            .iter_mut()
            .find(|r| r.id == Some(id) && !r.status.is_terminal())
            .ok_or_else(|| anyhow!("job {} not found or already finished", id))?;

        row.status = outcome.status();
        match outcome {
            JobOutcome::Completed { result_data } => row.result_data = Some(result_data.clone()),
            JobOutcome::Failed { error_message } => {
                row.error_message = Some(error_message.clone())
            }
        }
        Ok(())
    }

    async fn rpc(&self, id: Uuid, outcome: &JobOutcome) -> Result<()> {
        match self.rpc_behavior {
            RpcBehavior::Ok => {}
            RpcBehavior::Fail => return Err(anyhow!("rpc unavailable")),
            RpcBehavior::Hang => std::future::pending::<()>().await,
        }
        {
            let mut state = self.state.lock().unwrap();
            match outcome {
                JobOutcome::Completed { .. } => state.rpc_completions.push(id),
                JobOutcome::Failed { .. } => state.rpc_failures.push(id),
            }
        }
        self.apply(id, outcome)
    }
}

#[async_trait]
impl BaseJobQueue for MockJobQueue {
    async fn get_next_job(&self) -> Result<Option<ClaimedJob>> {
        let mut state = self.state.lock().unwrap();
        state.claims += 1;

        let Some(row) = state
            .rows
            .iter_mut()
            .find(|r| r.status == JobStatus::Pending)
        else {
            return Ok(None);
        };

        row.status = JobStatus::Processing;
        Ok(Some(ClaimedJob {
            id: row.id,
            job_type: row.job_type.clone(),
            payload: row.payload.clone(),
        }))
    }

    async fn complete_job(&self, job_id: Uuid, result_data: &serde_json::Value) -> Result<()> {
        self.rpc(
            job_id,
            &JobOutcome::Completed {
                result_data: result_data.clone(),
            },
        )
        .await
    }

    async fn fail_job(&self, job_id: Uuid, error_message: &str) -> Result<()> {
        self.rpc(
            job_id,
            &JobOutcome::Failed {
                error_message: error_message.to_string(),
            },
        )
        .await
    }

    async fn write_status(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<()> {
        if self.fail_direct_writes {
            return Err(anyhow!("database unavailable"));
        }
        self.state.lock().unwrap().direct_writes.push(job_id);
        self.apply(job_id, outcome)
    }
}

// =============================================================================
// Mock Certificate Service
// =============================================================================

#[derive(Default)]
struct MockCertificateState {
    configs: HashMap<String, CertificateConfig>,
    counts: HashMap<String, i64>,
    saved: Vec<NewCertificate>,
    config_fetches: usize,
    count_reads: usize,
    increments: usize,
    generated_numbers: Vec<(String, String)>,
    config_error: Option<String>,
    save_error: Option<String>,
    fail_count_reads: bool,
    fail_increments: bool,
}

/// In-memory config store, counters and certificate table
#[derive(Clone, Default)]
pub struct MockCertificateService {
    state: Arc<Mutex<MockCertificateState>>,
}

impl MockCertificateService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&self, event_id: &str, config: CertificateConfig) {
        self.state
            .lock()
            .unwrap()
            .configs
            .insert(event_id.to_string(), config);
    }

    pub fn set_count(&self, event_id: &str, count: i64) {
        self.state
            .lock()
            .unwrap()
            .counts
            .insert(event_id.to_string(), count);
    }

    pub fn fail_config_with(&self, message: &str) {
        self.state.lock().unwrap().config_error = Some(message.to_string());
    }

    pub fn fail_count_reads(&self) {
        self.state.lock().unwrap().fail_count_reads = true;
    }

    pub fn fail_increments(&self) {
        self.state.lock().unwrap().fail_increments = true;
    }

    pub fn fail_saves_with(&self, message: &str) {
        self.state.lock().unwrap().save_error = Some(message.to_string());
    }

    pub fn count_of(&self, event_id: &str) -> i64 {
        self.state
            .lock()
            .unwrap()
            .counts
            .get(event_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn saved(&self) -> Vec<NewCertificate> {
        self.state.lock().unwrap().saved.clone()
    }

    pub fn config_fetches(&self) -> usize {
        self.state.lock().unwrap().config_fetches
    }

    pub fn count_reads(&self) -> usize {
        self.state.lock().unwrap().count_reads
    }

    pub fn increments(&self) -> usize {
        self.state.lock().unwrap().increments
    }

    /// (event_id, user_id) pairs passed to the fallback generator
    pub fn generated_numbers(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().generated_numbers.clone()
    }
}

#[async_trait]
impl BaseCertificateService for MockCertificateService {
    async fn get_certificate_config(&self, event_id: &str) -> Result<Option<CertificateConfig>> {
        let mut state = self.state.lock().unwrap();
        state.config_fetches += 1;
        if let Some(message) = &state.config_error {
            return Err(anyhow!("{}", message));
        }
        Ok(state.configs.get(event_id).cloned())
    }

    async fn get_current_certificate_count(&self, event_id: &str) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        state.count_reads += 1;
        if state.fail_count_reads {
            return Err(anyhow!("count unavailable"));
        }
        Ok(state.counts.get(event_id).copied().unwrap_or(0))
    }

    async fn increment_certificate_counter(&self, event_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.increments += 1;
        if state.fail_increments {
            return Err(anyhow!("counter unavailable"));
        }
        *state.counts.entry(event_id.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn generate_certificate_number(&self, event_id: &str, user_id: &str) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .generated_numbers
            .push((event_id.to_string(), user_id.to_string()));
        Ok(fallback_certificate_number(event_id, user_id, Utc::now()))
    }

    async fn save_certificate(&self, certificate: &NewCertificate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.save_error {
            return Err(anyhow!("{}", message));
        }
        state.saved.push(certificate.clone());
        Ok(())
    }
}

// =============================================================================
// Mock Renderer
// =============================================================================

#[derive(Clone, Default)]
enum RenderBehavior {
    #[default]
    Ok,
    Fail(String),
    Empty,
    Hang,
}

#[derive(Default)]
struct MockRendererState {
    pdf: RenderBehavior,
    png: RenderBehavior,
    pdf_calls: usize,
    png_calls: usize,
}

/// Renderer returning small placeholder documents
#[derive(Clone, Default)]
pub struct MockRenderer {
    state: Arc<Mutex<MockRendererState>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_pdf_with(&self, message: &str) {
        self.state.lock().unwrap().pdf = RenderBehavior::Fail(message.to_string());
    }

    pub fn fail_png_with(&self, message: &str) {
        self.state.lock().unwrap().png = RenderBehavior::Fail(message.to_string());
    }

    pub fn return_empty_pdf(&self) {
        self.state.lock().unwrap().pdf = RenderBehavior::Empty;
    }

    pub fn return_empty_png(&self) {
        self.state.lock().unwrap().png = RenderBehavior::Empty;
    }

    pub fn hang_png(&self) {
        self.state.lock().unwrap().png = RenderBehavior::Hang;
    }

    pub fn pdf_calls(&self) -> usize {
        self.state.lock().unwrap().pdf_calls
    }

    pub fn png_calls(&self) -> usize {
        self.state.lock().unwrap().png_calls
    }

    async fn render(behavior: RenderBehavior, bytes: &[u8]) -> Result<Vec<u8>> {
        match behavior {
            RenderBehavior::Ok => Ok(bytes.to_vec()),
            RenderBehavior::Fail(message) => Err(anyhow!("{}", message)),
            RenderBehavior::Empty => Ok(Vec::new()),
            RenderBehavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl BaseCertificateRenderer for MockRenderer {
    async fn generate_pdf(
        &self,
        _config: &CertificateConfig,
        _certificate_number: &str,
        _data: &ParticipantData,
    ) -> Result<Vec<u8>> {
        let behavior = {
            let mut state = self.state.lock().unwrap();
            state.pdf_calls += 1;
            state.pdf.clone()
        };
        Self::render(behavior, b"%PDF-1.5 mock").await
    }

    async fn generate_png(
        &self,
        _config: &CertificateConfig,
        _certificate_number: &str,
        _data: &ParticipantData,
    ) -> Result<Vec<u8>> {
        let behavior = {
            let mut state = self.state.lock().unwrap();
            state.png_calls += 1;
            state.png.clone()
        };
        Self::render(behavior, b"\x89PNG mock").await
    }
}

// =============================================================================
// Mock Storage
// =============================================================================

/// Arguments captured from an upload call
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub filename: String,
    pub kind: CertificateFileKind,
    pub event_id: Option<String>,
    pub user_id: String,
    pub size: usize,
}

#[derive(Default)]
struct MockStorageState {
    uploads: Vec<UploadCall>,
    failures: HashMap<CertificateFileKind, String>,
    objects: HashSet<String>,
}

/// Storage that records uploads and hands back fake CDN URLs.
///
/// Like the real bucket it refuses to overwrite an existing object.
#[derive(Clone, Default)]
pub struct MockStorage {
    state: Arc<Mutex<MockStorageState>>,
}

impl MockStorage {
    pub const BASE_URL: &'static str = "https://cdn.test/certificates";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads_of(&self, kind: CertificateFileKind, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(kind, message.to_string());
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.state.lock().unwrap().uploads.clone()
    }

    /// Successfully uploaded file names, sorted
    pub fn uploaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.uploads().into_iter().map(|u| u.filename).collect();
        names.sort();
        names
    }
}

#[async_trait]
impl BaseCertificateStorage for MockStorage {
    async fn upload_certificate_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        kind: CertificateFileKind,
        event_id: Option<&str>,
        user_id: &str,
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.failures.get(&kind) {
            return Err(anyhow!("{}", message));
        }
        let path = format!(
            "{}/{}/{}",
            event_id.unwrap_or("standalone"),
            user_id,
            filename
        );
        if !state.objects.insert(path.clone()) {
            return Err(anyhow!("The resource already exists"));
        }
        state.uploads.push(UploadCall {
            filename: filename.to_string(),
            kind,
            event_id: event_id.map(str::to_string),
            user_id: user_id.to_string(),
            size: bytes.len(),
        });
        Ok(format!("{}/{}", Self::BASE_URL, path))
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// All mocks plus a CertificateDeps wired to them
#[derive(Clone, Default)]
pub struct TestDependencies {
    pub job_queue: MockJobQueue,
    pub certificates: MockCertificateService,
    pub renderer: MockRenderer,
    pub storage: MockStorage,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job_queue(job_queue: MockJobQueue) -> Self {
        Self {
            job_queue,
            ..Default::default()
        }
    }

    pub fn deps(&self) -> CertificateDeps {
        CertificateDeps::new(
            Arc::new(self.job_queue.clone()),
            Arc::new(self.certificates.clone()),
            Arc::new(self.renderer.clone()),
            Arc::new(self.storage.clone()),
            Duration::from_secs(5),
        )
    }
}
