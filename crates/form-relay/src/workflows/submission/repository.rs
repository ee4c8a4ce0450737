use serde::{Deserialize, Serialize};

use super::domain::{LedgerEntry, Section};
use super::payload::SubmissionPayload;

/// Append-only store receiving one row per processed submission.
pub trait StatusLedger: Send + Sync {
    /// Confirms the store can be located before anything is written.
    fn verify(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    fn append(&self, entry: LedgerEntry) -> Result<(), LedgerError>;
}

/// Error enumeration for ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("status ledger location is not configured")]
    NotConfigured,
    #[error("status ledger not found at {location}")]
    StoreNotFound { location: String },
    #[error("status ledger rejected the row: {0}")]
    Rejected(String),
    #[error("status ledger io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("status ledger csv failure: {0}")]
    Csv(#[from] csv::Error),
}

/// Outbound hook fanning a payload out to the document/mail build.
pub trait DispatchPublisher: Send + Sync {
    /// Confirms endpoint and credentials are present before anything is written.
    fn verify(&self) -> Result<(), DispatchError> {
        Ok(())
    }

    fn publish(&self, event: &DispatchEvent) -> Result<(), DispatchError>;
}

/// Dispatch error; `Rejected` keeps the remote status and body for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch {setting} is not configured")]
    NotConfigured { setting: &'static str },
    #[error("dispatch endpoint rejected the event with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("dispatch transport unavailable: {0}")]
    Transport(String),
}

/// Webhook body: an event-type discriminator plus the full payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub event_type: String,
    pub client_payload: ClientPayload,
}

/// Payload fields in the shape the document/mail job reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPayload {
    pub submission_id: String,
    pub complaint_id: String,
    pub submission_timestamp: String,
    pub form_title: String,
    pub contact_consent: String,
    pub status: String,
    pub email_to: Vec<String>,
    pub sections: Vec<Section>,
}

impl DispatchEvent {
    pub fn from_payload(event_type: &str, payload: &SubmissionPayload) -> Self {
        Self {
            event_type: event_type.to_string(),
            client_payload: ClientPayload {
                submission_id: payload.submission_id().0.clone(),
                complaint_id: payload.case_id().0.clone(),
                submission_timestamp: payload.timestamp().to_string(),
                form_title: payload.form_title().to_string(),
                contact_consent: if payload.consent() { "yes" } else { "no" }.to_string(),
                status: payload.status().to_string(),
                email_to: payload.recipients().to_vec(),
                sections: payload.sections().to_vec(),
            },
        }
    }
}
