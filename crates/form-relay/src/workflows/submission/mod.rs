//! Form submission intake: section grouping, consent-gated redaction, case
//! labelling, and hand-off to the status ledger and the dispatch endpoint.

pub mod case_id;
pub mod catalog;
pub mod dispatch;
pub mod domain;
pub mod envelope;
pub mod ledger;
pub mod payload;
pub mod privacy;
pub mod repository;
pub mod router;
pub mod sections;
pub mod service;

#[cfg(test)]
mod tests;

pub use case_id::{CaseIdGenerator, Clock, FixedClock, SystemClock};
pub use catalog::QuestionCatalog;
pub use dispatch::HttpDispatchPublisher;
pub use domain::{
    AnswerInput, AnsweredRow, CaseId, CatalogEntry, LedgerEntry, PipelineNotice, Question,
    QuestionRole, RawAnswer, Section, SubmissionEvent, SubmissionId, SubmissionReceipt,
};
pub use envelope::{parse_event, EventError};
pub use ledger::CsvStatusLedger;
pub use payload::{PayloadAssembler, Recipients, SubmissionMetadata, SubmissionPayload};
pub use privacy::{ConsentDecision, PrivacyPolicy, RedactedSections};
pub use repository::{
    ClientPayload, DispatchError, DispatchEvent, DispatchPublisher, LedgerError, StatusLedger,
};
pub use router::submission_router;
pub use sections::{assemble_sections, sections_from_fields, SectionAssembly, FIELD_MAP_ROLES};
pub use service::{SubmissionService, SubmissionServiceError, TransformedSubmission};
