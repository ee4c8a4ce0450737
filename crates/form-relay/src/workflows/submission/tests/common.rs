use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::config::{DispatchConfig, IntakeConfig};
use crate::workflows::submission::domain::{AnswerInput, LedgerEntry, Question, SubmissionEvent};
use crate::workflows::submission::repository::{
    DispatchError, DispatchEvent, DispatchPublisher, LedgerError, StatusLedger,
};
use crate::workflows::submission::{FixedClock, SubmissionService};

pub(super) const INTERNAL: &str = "lab@clinic.test";

pub(super) fn at(raw: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(raw).expect("valid timestamp")
}

pub(super) fn intake_config() -> IntakeConfig {
    IntakeConfig {
        internal_recipient: INTERNAL.to_string(),
        ..IntakeConfig::default()
    }
}

pub(super) fn dispatch_config() -> DispatchConfig {
    DispatchConfig::default()
}

pub(super) fn questions() -> Vec<Question> {
    vec![
        Question::answerable("q-desc", "Describe the issue"),
        Question::section_break("pb-contact", "Contact"),
        Question::answerable("q-consent", "Agree to contact?"),
        Question::answerable("q-email", "Email"),
        Question::answerable("q-phone", "Phone"),
    ]
}

pub(super) fn answers(consent: &str) -> Vec<AnswerInput> {
    vec![
        AnswerInput::new("q-consent", "Agree to contact?", consent),
        AnswerInput::new("q-email", "Email", "a@b.com"),
        AnswerInput::new("q-phone", "Phone", "555-1111"),
    ]
}

pub(super) fn event(consent: &str) -> SubmissionEvent {
    let mut event = SubmissionEvent::new(at("2025-03-07T08:05:12Z"), answers(consent));
    event.form_id = Some("complaints".to_string());
    event.questions = Some(questions());
    event.response_index = 4;
    event
}

pub(super) fn build_service() -> (
    SubmissionService<MemoryLedger, MemoryDispatcher>,
    Arc<MemoryLedger>,
    Arc<MemoryDispatcher>,
) {
    let ledger = Arc::new(MemoryLedger::default());
    let dispatcher = Arc::new(MemoryDispatcher::default());
    let service = service_with(ledger.clone(), dispatcher.clone());
    (service, ledger, dispatcher)
}

pub(super) fn service_with<L, D>(ledger: Arc<L>, dispatcher: Arc<D>) -> SubmissionService<L, D>
where
    L: StatusLedger + 'static,
    D: DispatchPublisher + 'static,
{
    SubmissionService::with_clock(
        ledger,
        dispatcher,
        &intake_config(),
        &dispatch_config(),
        Arc::new(FixedClock(at("2025-03-07T09:05:40+01:00"))),
    )
}

#[derive(Default, Clone)]
pub(super) struct MemoryLedger {
    rows: Arc<Mutex<Vec<LedgerEntry>>>,
}

impl MemoryLedger {
    pub(super) fn rows(&self) -> Vec<LedgerEntry> {
        self.rows.lock().expect("ledger mutex poisoned").clone()
    }
}

impl StatusLedger for MemoryLedger {
    fn append(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
        self.rows.lock().expect("ledger mutex poisoned").push(entry);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDispatcher {
    events: Arc<Mutex<Vec<DispatchEvent>>>,
}

impl MemoryDispatcher {
    pub(super) fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().expect("dispatch mutex poisoned").clone()
    }
}

impl DispatchPublisher for MemoryDispatcher {
    fn publish(&self, event: &DispatchEvent) -> Result<(), DispatchError> {
        self.events
            .lock()
            .expect("dispatch mutex poisoned")
            .push(event.clone());
        Ok(())
    }
}

pub(super) struct MissingLedger;

impl StatusLedger for MissingLedger {
    fn verify(&self) -> Result<(), LedgerError> {
        Err(LedgerError::StoreNotFound {
            location: "/srv/ledger.csv".to_string(),
        })
    }

    fn append(&self, _entry: LedgerEntry) -> Result<(), LedgerError> {
        panic!("append must not run when the ledger cannot be located");
    }
}

pub(super) struct UnconfiguredDispatcher;

impl DispatchPublisher for UnconfiguredDispatcher {
    fn verify(&self) -> Result<(), DispatchError> {
        Err(DispatchError::NotConfigured { setting: "token" })
    }

    fn publish(&self, _event: &DispatchEvent) -> Result<(), DispatchError> {
        panic!("publish must not run without credentials");
    }
}

pub(super) struct RejectingDispatcher;

impl DispatchPublisher for RejectingDispatcher {
    fn publish(&self, _event: &DispatchEvent) -> Result<(), DispatchError> {
        Err(DispatchError::Rejected {
            status: 404,
            body: "{\"message\":\"Not Found\"}".to_string(),
        })
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
