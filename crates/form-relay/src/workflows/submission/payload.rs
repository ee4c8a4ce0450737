use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;

use super::domain::{CaseId, Section, SubmissionId};
use super::privacy::RedactedSections;

/// Ordered recipient list: the internal address first, at most one contact after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn internal(address: &str) -> Self {
        Self(vec![address.trim().to_string()])
    }

    fn add_contact(&mut self, address: &str) {
        let address = address.trim();
        if address.is_empty() || self.0.len() > 1 {
            return;
        }
        if self
            .0
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(address))
        {
            return;
        }
        self.0.push(address.to_string());
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Submission metadata computed by the caller before assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionMetadata {
    pub submission_id: SubmissionId,
    pub case_id: CaseId,
    pub form_title: String,
    pub submitted_at: DateTime<FixedOffset>,
}

/// Record handed to the status ledger and the dispatch endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    submission_id: SubmissionId,
    case_id: CaseId,
    form_title: String,
    timestamp: String,
    consent: bool,
    status: String,
    recipients: Recipients,
    sections: Vec<Section>,
}

impl SubmissionPayload {
    pub fn submission_id(&self) -> &SubmissionId {
        &self.submission_id
    }

    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    pub fn form_title(&self) -> &str {
        &self.form_title
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn consent(&self) -> bool {
        self.consent
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

/// Composes the immutable payload from redacted sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadAssembler {
    internal_recipient: String,
    status_label: String,
}

impl PayloadAssembler {
    pub fn new(internal_recipient: impl Into<String>, status_label: impl Into<String>) -> Self {
        Self {
            internal_recipient: internal_recipient.into(),
            status_label: status_label.into(),
        }
    }

    pub fn internal_recipient(&self) -> &str {
        &self.internal_recipient
    }

    pub fn status_label(&self) -> &str {
        &self.status_label
    }

    /// `contact_email` only reaches the recipient list when consent was granted.
    pub fn assemble(
        &self,
        metadata: SubmissionMetadata,
        sections: RedactedSections,
        contact_email: Option<String>,
    ) -> SubmissionPayload {
        let consent = sections.consent();
        let mut recipients = Recipients::internal(&self.internal_recipient);
        if consent {
            if let Some(address) = contact_email.as_deref() {
                if address.contains('@') {
                    recipients.add_contact(address);
                }
            }
        }

        SubmissionPayload {
            submission_id: metadata.submission_id,
            case_id: metadata.case_id,
            form_title: metadata.form_title,
            timestamp: metadata
                .submitted_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            consent,
            status: self.status_label.clone(),
            recipients,
            sections: sections.into_sections(),
        }
    }
}
