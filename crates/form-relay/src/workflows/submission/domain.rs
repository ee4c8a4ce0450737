use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Section title used before the first page break and for unknown questions.
pub const DEFAULT_SECTION_TITLE: &str = "Form Details";
/// Label used when a question carries no title.
pub const UNTITLED_QUESTION: &str = "Untitled Question";
/// Separator between the values of a multi-valued answer.
pub const MULTI_VALUE_SEPARATOR: &str = ", ";

/// Question definition as exposed by the form platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_section_break: bool,
}

impl Question {
    pub fn answerable(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_section_break: false,
        }
    }

    pub fn section_break(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_section_break: true,
        }
    }
}

/// Catalog view of a single answerable question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: String,
    pub section_title: String,
}

/// Semantic role a question plays for privacy handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionRole {
    Consent,
    ContactEmail,
    Pii,
}

impl QuestionRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "consent" => Some(Self::Consent),
            "contact_email" | "contactemail" | "email" => Some(Self::ContactEmail),
            "pii" => Some(Self::Pii),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            QuestionRole::Consent => "consent",
            QuestionRole::ContactEmail => "contact_email",
            QuestionRole::Pii => "pii",
        }
    }
}

/// Raw answer value as delivered by the response platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RawAnswer {
    #[default]
    Empty,
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
    Many(Vec<RawAnswer>),
}

impl RawAnswer {
    /// Flattens the answer into row text. Grid answers nest, so lists recurse.
    pub fn to_row_value(&self) -> String {
        match self {
            RawAnswer::Empty => String::new(),
            RawAnswer::Flag(flag) => flag.to_string(),
            RawAnswer::Number(number) => number.to_string(),
            RawAnswer::Text(text) => text.trim().to_string(),
            RawAnswer::Many(values) => values
                .iter()
                .map(RawAnswer::to_row_value)
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_SEPARATOR),
        }
    }
}

impl From<&str> for RawAnswer {
    fn from(value: &str) -> Self {
        RawAnswer::Text(value.to_string())
    }
}

/// One answered question inside an inbound submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerInput {
    pub question_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: RawAnswer,
}

impl AnswerInput {
    pub fn new(
        question_id: impl Into<String>,
        title: impl Into<String>,
        value: impl Into<RawAnswer>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            title: title.into(),
            value: value.into(),
        }
    }
}

/// A single `(label, value)` pair shown in the generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredRow {
    pub label: String,
    pub value: String,
    #[serde(skip)]
    pub question_id: Option<String>,
}

impl AnsweredRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            question_id: None,
        }
    }
}

/// Ordered group of rows sharing a page-break title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub rows: Vec<AnsweredRow>,
}

/// Inbound submission event, one per form response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEvent {
    #[serde(default)]
    pub form_id: Option<String>,
    #[serde(default)]
    pub form_title: Option<String>,
    #[serde(default)]
    pub submission_id: Option<String>,
    pub submitted_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub response_index: u64,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    /// Pre-grouped sections from senders that build them upstream. They bypass
    /// the catalog but still go through consent and redaction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

impl SubmissionEvent {
    pub fn new(submitted_at: DateTime<FixedOffset>, answers: Vec<AnswerInput>) -> Self {
        Self {
            form_id: None,
            form_title: None,
            submission_id: None,
            submitted_at,
            response_index: 0,
            questions: None,
            answers,
            fields: serde_json::Map::new(),
            sections: Vec::new(),
        }
    }

    /// Explicit id when the sender supplied one, otherwise timestamp plus response position.
    pub fn submission_id(&self) -> SubmissionId {
        match self
            .submission_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            Some(id) => SubmissionId(id.to_string()),
            None => SubmissionId::derive(&self.submitted_at, self.response_index),
        }
    }
}

/// Identifier disambiguating raw submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn derive(submitted_at: &DateTime<FixedOffset>, response_index: u64) -> Self {
        Self(format!(
            "{}#{}",
            submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            response_index
        ))
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-facing case label, `PREFIX-YYYYMMDD-HHMM`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaseId(pub String);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-fatal conditions observed while transforming a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineNotice {
    CatalogLookupMiss { question_id: String },
    ConsentAmbiguous { reason: String },
}

impl fmt::Display for PipelineNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineNotice::CatalogLookupMiss { question_id } => {
                write!(f, "question '{question_id}' missing from catalog")
            }
            PipelineNotice::ConsentAmbiguous { reason } => {
                write!(f, "consent treated as declined: {reason}")
            }
        }
    }
}

/// Row appended to the status ledger for every processed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "Case ID")]
    pub case_id: String,
    #[serde(rename = "Created At")]
    pub created_at: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Updated At")]
    pub updated_at: String,
    #[serde(rename = "Note")]
    pub note: String,
}

impl LedgerEntry {
    pub fn received(case_id: &CaseId, created_at: String, status: &str) -> Self {
        Self {
            case_id: case_id.0.clone(),
            updated_at: created_at.clone(),
            created_at,
            status: status.to_string(),
            note: String::new(),
        }
    }
}

/// Summary of a processed submission exposed to API and CLI callers.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission_id: SubmissionId,
    pub case_id: CaseId,
    pub consent: bool,
    pub recipients: Vec<String>,
    pub notices: Vec<PipelineNotice>,
}
