use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, FixedOffset, SecondsFormat};
use tracing::{debug, info, warn};

use super::case_id::{CaseIdGenerator, Clock, SystemClock};
use super::catalog::QuestionCatalog;
use super::domain::{
    LedgerEntry, PipelineNotice, Question, Section, SubmissionEvent, SubmissionReceipt,
};
use super::payload::{PayloadAssembler, SubmissionMetadata, SubmissionPayload};
use super::privacy::PrivacyPolicy;
use super::repository::{
    DispatchError, DispatchEvent, DispatchPublisher, LedgerError, StatusLedger,
};
use super::sections::{assemble_sections, sections_from_fields};
use crate::config::{DispatchConfig, IntakeConfig};

/// Result of the pure transformation, before any collaborator is touched.
#[derive(Debug, Clone)]
pub struct TransformedSubmission {
    pub payload: SubmissionPayload,
    pub notices: Vec<PipelineNotice>,
}

/// Service composing catalog lookup, privacy handling, and the two collaborators.
pub struct SubmissionService<L, D> {
    privacy: Arc<PrivacyPolicy>,
    case_ids: CaseIdGenerator,
    assembler: PayloadAssembler,
    default_form_title: String,
    event_type: String,
    clock: Arc<dyn Clock>,
    catalogs: RwLock<HashMap<String, Arc<QuestionCatalog>>>,
    ledger: Arc<L>,
    dispatcher: Arc<D>,
}

impl<L, D> SubmissionService<L, D>
where
    L: StatusLedger + 'static,
    D: DispatchPublisher + 'static,
{
    pub fn new(
        ledger: Arc<L>,
        dispatcher: Arc<D>,
        intake: &IntakeConfig,
        dispatch: &DispatchConfig,
    ) -> Self {
        Self::with_clock(ledger, dispatcher, intake, dispatch, Arc::new(SystemClock))
    }

    pub fn with_clock(
        ledger: Arc<L>,
        dispatcher: Arc<D>,
        intake: &IntakeConfig,
        dispatch: &DispatchConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            privacy: Arc::new(PrivacyPolicy::from(intake)),
            case_ids: CaseIdGenerator::new(intake.case_prefix.clone()),
            assembler: PayloadAssembler::new(
                intake.internal_recipient.clone(),
                intake.status_label.clone(),
            ),
            default_form_title: intake.form_title.clone(),
            event_type: dispatch.event_type.clone(),
            clock,
            catalogs: RwLock::new(HashMap::new()),
            ledger,
            dispatcher,
        }
    }

    /// Builds and caches the catalog for a form definition. Rebuilding from the
    /// same definition is idempotent, so concurrent registrations are harmless.
    pub fn register_form(&self, form_id: &str, questions: &[Question]) -> Arc<QuestionCatalog> {
        let catalog = Arc::new(QuestionCatalog::build(questions));
        debug!(form_id, entries = catalog.len(), "question catalog built");
        if let Ok(mut catalogs) = self.catalogs.write() {
            catalogs.insert(form_id.to_string(), catalog.clone());
        }
        catalog
    }

    pub fn catalog(&self, form_id: &str) -> Option<Arc<QuestionCatalog>> {
        self.catalogs
            .read()
            .ok()
            .and_then(|catalogs| catalogs.get(form_id).cloned())
    }

    fn resolve_catalog(&self, event: &SubmissionEvent) -> Arc<QuestionCatalog> {
        match (&event.questions, event.form_id.as_deref()) {
            (Some(questions), Some(form_id)) => self.register_form(form_id, questions),
            (Some(questions), None) => Arc::new(QuestionCatalog::build(questions)),
            (None, Some(form_id)) => self.catalog(form_id).unwrap_or_default(),
            (None, None) => Arc::default(),
        }
    }

    /// Runs the pure pipeline: sections, consent, redaction, case id, payload.
    pub fn transform(&self, event: &SubmissionEvent) -> TransformedSubmission {
        self.transform_at(event, self.clock.now())
    }

    fn transform_at(
        &self,
        event: &SubmissionEvent,
        received_at: DateTime<FixedOffset>,
    ) -> TransformedSubmission {
        let catalog = self.resolve_catalog(event);

        let (sections, mut notices): (Vec<Section>, Vec<PipelineNotice>) =
            if !event.sections.is_empty() {
                (event.sections.clone(), Vec::new())
            } else if event.answers.is_empty() && !event.fields.is_empty() {
                (sections_from_fields(&event.fields), Vec::new())
            } else {
                let assembly = assemble_sections(&catalog, &event.answers);
                (assembly.sections, assembly.notices)
            };

        // Pre-grouped sections may leave the consent answer in the field map only.
        let consent = if !event.sections.is_empty() && !event.fields.is_empty() {
            let mut basis = sections.clone();
            basis.extend(sections_from_fields(&event.fields));
            self.privacy.extract_consent(&basis)
        } else {
            self.privacy.extract_consent(&sections)
        };
        notices.extend(consent.notice);

        let redacted = self.privacy.redact(&sections, consent.granted);
        drop(sections);
        let contact_email = self.privacy.contact_email(&redacted);

        let metadata = SubmissionMetadata {
            submission_id: event.submission_id(),
            case_id: self.case_ids.generate(&received_at),
            form_title: event
                .form_title
                .as_deref()
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .unwrap_or(&self.default_form_title)
                .to_string(),
            submitted_at: event.submitted_at,
        };

        if redacted.redacted_rows() > 0 {
            debug!(
                rows = redacted.redacted_rows(),
                "pii rows blanked without contact consent"
            );
        }

        let payload = self.assembler.assemble(metadata, redacted, contact_email);
        TransformedSubmission { payload, notices }
    }

    /// Transforms a submission, appends the ledger row, then dispatches.
    pub fn process(
        &self,
        event: &SubmissionEvent,
    ) -> Result<SubmissionReceipt, SubmissionServiceError> {
        self.ledger.verify()?;
        self.dispatcher.verify()?;

        let received_at = self.clock.now();
        let TransformedSubmission { payload, notices } = self.transform_at(event, received_at);
        for notice in &notices {
            warn!(case_id = %payload.case_id(), %notice, "submission notice");
        }

        let created_at = received_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.ledger.append(LedgerEntry::received(
            payload.case_id(),
            created_at,
            payload.status(),
        ))?;

        self.dispatcher
            .publish(&DispatchEvent::from_payload(&self.event_type, &payload))?;

        info!(
            submission_id = %payload.submission_id(),
            case_id = %payload.case_id(),
            consent = payload.consent(),
            recipients = payload.recipients().len(),
            "submission dispatched"
        );

        Ok(SubmissionReceipt {
            submission_id: payload.submission_id().clone(),
            case_id: payload.case_id().clone(),
            consent: payload.consent(),
            recipients: payload.recipients().to_vec(),
            notices,
        })
    }
}

/// Error raised by the submission service. Every variant aborts the submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionServiceError {
    #[error("configuration missing: {setting}")]
    ConfigurationMissing { setting: String },
    #[error(transparent)]
    Ledger(LedgerError),
    #[error(transparent)]
    Dispatch(DispatchError),
}

impl From<LedgerError> for SubmissionServiceError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::NotConfigured => Self::ConfigurationMissing {
                setting: "LEDGER_PATH".to_string(),
            },
            LedgerError::StoreNotFound { location } => Self::ConfigurationMissing {
                setting: format!("LEDGER_PATH (no ledger at {location})"),
            },
            other => Self::Ledger(other),
        }
    }
}

impl From<DispatchError> for SubmissionServiceError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::NotConfigured { setting } => Self::ConfigurationMissing {
                setting: format!("DISPATCH_{}", setting.to_ascii_uppercase()),
            },
            other => Self::Dispatch(other),
        }
    }
}
