//! Certificate job payload: the JSON wire shape and its typed form.

use serde::{Deserialize, Serialize};

use super::certificate_config::CertificateConfig;
use crate::domains::certificates::errors::CertificateJobError;

/// Sentinel `eventId` for certificates that do not belong to an event.
pub const STANDALONE_EVENT_ID: &str = "standalone";

/// Payload exactly as the enqueuer writes it into `job_queue.payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateJobPayload {
    pub event_id: String,
    pub user_id: String,
    pub participant_name: String,
    pub event_title: String,
    pub completion_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CertificateConfig>,
}

/// What gets printed on the certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantData {
    pub name: String,
    pub event_title: String,
    pub completion_date: String,
    pub venue: Option<String>,
}

/// A certificate job, either tied to an event or standalone.
#[derive(Debug, Clone, PartialEq)]
pub enum CertificateJob {
    Event {
        event_id: String,
        user_id: String,
        participant: ParticipantData,
        /// Overrides the stored event config when present.
        inline_config: Option<CertificateConfig>,
    },
    Standalone {
        config: CertificateConfig,
        user_id: String,
        participant: ParticipantData,
    },
}

impl CertificateJob {
    /// Parse a raw `job_queue.payload` value.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, CertificateJobError> {
        let wire: CertificateJobPayload = serde_json::from_value(payload.clone())
            .map_err(|e| CertificateJobError::InvalidPayload(e.to_string()))?;
        Self::try_from(wire)
    }

    /// Backing event, `None` for standalone certificates.
    pub fn event_id(&self) -> Option<&str> {
        match self {
            CertificateJob::Event { event_id, .. } => Some(event_id),
            CertificateJob::Standalone { .. } => None,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            CertificateJob::Event { user_id, .. } | CertificateJob::Standalone { user_id, .. } => {
                user_id
            }
        }
    }

    pub fn participant(&self) -> &ParticipantData {
        match self {
            CertificateJob::Event { participant, .. }
            | CertificateJob::Standalone { participant, .. } => participant,
        }
    }

    pub fn is_standalone(&self) -> bool {
        matches!(self, CertificateJob::Standalone { .. })
    }

    /// Config carried inside the job itself, if any.
    pub fn inline_config(&self) -> Option<&CertificateConfig> {
        match self {
            CertificateJob::Event { inline_config, .. } => inline_config.as_ref(),
            CertificateJob::Standalone { config, .. } => Some(config),
        }
    }
}

impl TryFrom<CertificateJobPayload> for CertificateJob {
    type Error = CertificateJobError;

    fn try_from(wire: CertificateJobPayload) -> Result<Self, Self::Error> {
        if wire.event_id.trim().is_empty() {
            return Err(CertificateJobError::InvalidPayload(
                "eventId must not be empty".into(),
            ));
        }
        if wire.user_id.trim().is_empty() {
            return Err(CertificateJobError::InvalidPayload(
                "userId must not be empty".into(),
            ));
        }

        let participant = ParticipantData {
            name: wire.participant_name,
            event_title: wire.event_title,
            completion_date: wire.completion_date,
            venue: wire.venue.filter(|v| !v.trim().is_empty()),
        };

        if wire.event_id == STANDALONE_EVENT_ID {
            let config = wire.config.ok_or(CertificateJobError::ConfigNotFound)?;
            return Ok(CertificateJob::Standalone {
                config,
                user_id: wire.user_id,
                participant,
            });
        }

        Ok(CertificateJob::Event {
            event_id: wire.event_id,
            user_id: wire.user_id,
            participant,
            inline_config: wire.config,
        })
    }
}

impl From<CertificateJob> for CertificateJobPayload {
    fn from(job: CertificateJob) -> Self {
        match job {
            CertificateJob::Event {
                event_id,
                user_id,
                participant,
                inline_config,
            } => Self {
                event_id,
                user_id,
                participant_name: participant.name,
                event_title: participant.event_title,
                completion_date: participant.completion_date,
                venue: participant.venue,
                config: inline_config,
            },
            CertificateJob::Standalone {
                config,
                user_id,
                participant,
            } => Self {
                event_id: STANDALONE_EVENT_ID.to_string(),
                user_id,
                participant_name: participant.name,
                event_title: participant.event_title,
                completion_date: participant.completion_date,
                venue: participant.venue,
                config: Some(config),
            },
        }
    }
}
