use super::common::*;
use crate::workflows::submission::domain::{
    AnswerInput, AnsweredRow, PipelineNotice, Section, SubmissionEvent, DEFAULT_SECTION_TITLE,
};

fn row_value<'a>(
    payload: &'a crate::workflows::submission::SubmissionPayload,
    label: &str,
) -> &'a str {
    payload
        .sections()
        .iter()
        .flat_map(|section| section.rows.iter())
        .find(|row| row.label == label)
        .map(|row| row.value.as_str())
        .unwrap_or_else(|| panic!("row '{label}' missing"))
}

#[test]
fn consenting_submitter_is_added_and_rows_kept() {
    let (service, _, _) = build_service();
    let transformed = service.transform(&event("Yes"));
    let payload = &transformed.payload;

    assert!(payload.consent());
    assert_eq!(payload.recipients().as_slice(), [INTERNAL, "a@b.com"]);
    assert_eq!(row_value(payload, "Email"), "a@b.com");
    assert_eq!(row_value(payload, "Phone"), "555-1111");
    assert!(transformed.notices.is_empty());
}

#[test]
fn declined_consent_blanks_contact_rows() {
    let (service, _, _) = build_service();
    let transformed = service.transform(&event("No"));
    let payload = &transformed.payload;

    assert!(!payload.consent());
    assert_eq!(payload.recipients().as_slice(), [INTERNAL]);
    assert_eq!(row_value(payload, "Email"), "");
    assert_eq!(row_value(payload, "Phone"), "");
    assert_eq!(row_value(payload, "Agree to contact?"), "No");
    assert!(transformed.notices.is_empty(), "a plain 'No' is not ambiguous");
}

#[test]
fn question_missing_from_catalog_still_produces_row() {
    let (service, _, _) = build_service();
    let mut event = event("Yes");
    event
        .answers
        .push(AnswerInput::new("q-new", "Preferred call time", "Mornings"));

    let transformed = service.transform(&event);
    let fallback = transformed
        .payload
        .sections()
        .iter()
        .find(|section| section.title == DEFAULT_SECTION_TITLE)
        .expect("default section present");
    assert_eq!(fallback.rows.len(), 1);
    assert_eq!(fallback.rows[0].label, "Preferred call time");
    assert_eq!(fallback.rows[0].value, "Mornings");
    assert!(transformed.notices.contains(&PipelineNotice::CatalogLookupMiss {
        question_id: "q-new".to_string()
    }));
}

#[test]
fn empty_submission_is_valid_and_closed() {
    let (service, _, _) = build_service();
    let event = SubmissionEvent::new(at("2025-03-07T08:05:12Z"), Vec::new());

    let transformed = service.transform(&event);
    assert!(transformed.payload.sections().is_empty());
    assert!(!transformed.payload.consent());
    assert_eq!(transformed.payload.recipients().as_slice(), [INTERNAL]);
    assert!(matches!(
        transformed.notices.as_slice(),
        [PipelineNotice::ConsentAmbiguous { .. }]
    ));
}

#[test]
fn consent_without_email_keeps_single_recipient() {
    let (service, _, _) = build_service();
    let mut event = event("yes");
    event.answers.retain(|answer| answer.question_id != "q-email");

    let payload = service.transform(&event).payload;
    assert!(payload.consent());
    assert_eq!(payload.recipients().len(), 1);
}

#[test]
fn email_without_at_sign_is_not_a_recipient() {
    let (service, _, _) = build_service();
    let mut event = event("Yes");
    event.answers[1] = AnswerInput::new("q-email", "Email", "call me instead");

    let payload = service.transform(&event).payload;
    assert_eq!(payload.recipients().as_slice(), [INTERNAL]);
}

#[test]
fn submitter_matching_internal_address_is_deduplicated() {
    let (service, _, _) = build_service();
    let mut event = event("Yes");
    event.answers[1] = AnswerInput::new("q-email", "Email", "LAB@clinic.test");

    let payload = service.transform(&event).payload;
    assert_eq!(payload.recipients().as_slice(), [INTERNAL]);
}

#[test]
fn unrecognized_consent_answer_fails_closed() {
    let (service, _, _) = build_service();
    let transformed = service.transform(&event("Maybe later"));

    assert!(!transformed.payload.consent());
    assert_eq!(row_value(&transformed.payload, "Email"), "");
    assert!(matches!(
        transformed.notices.as_slice(),
        [PipelineNotice::ConsentAmbiguous { .. }]
    ));
}

#[test]
fn rerunning_yields_identical_ordering() {
    let (service, _, _) = build_service();
    let mut event = event("No");
    event
        .answers
        .insert(0, AnswerInput::new("q-desc", "Describe the issue", "Chipped"));

    let first = serde_json::to_string(service.transform(&event).payload.sections())
        .expect("serialize sections");
    let second = serde_json::to_string(service.transform(&event).payload.sections())
        .expect("serialize sections");
    assert_eq!(first, second);
}

#[test]
fn payload_carries_case_and_submission_ids() {
    let (service, _, _) = build_service();
    let payload = service.transform(&event("Yes")).payload;

    assert_eq!(payload.case_id().0, "CMP-20250307-0905");
    assert_eq!(payload.submission_id().0, "2025-03-07T08:05:12Z#4");
    assert_eq!(payload.timestamp(), "2025-03-07T08:05:12Z");
    assert_eq!(payload.form_title(), "Customer Complaint Form");
    assert_eq!(payload.status(), "Received");
}

#[test]
fn flat_field_maps_are_supported() {
    let (service, _, _) = build_service();
    let mut event = SubmissionEvent::new(at("2025-03-07T08:05:12Z"), Vec::new());
    event.submission_id = Some("legacy-17".to_string());
    let fields = serde_json::json!({
        "agree_to_contact": "no",
        "email_address": "a@b.com",
        "lot_number": "L-42"
    });
    event.fields = fields.as_object().expect("object").clone();

    let payload = service.transform(&event).payload;
    assert_eq!(payload.submission_id().0, "legacy-17");
    assert_eq!(payload.sections().len(), 1);
    assert_eq!(row_value(&payload, "Email Address"), "");
    assert_eq!(row_value(&payload, "Lot Number"), "L-42");
}

#[test]
fn contact_consent_field_grants_consent_and_adds_email() {
    let (service, _, _) = build_service();
    let mut event = SubmissionEvent::new(at("2025-03-07T08:05:12Z"), Vec::new());
    let fields = serde_json::json!({
        "contact_consent": "yes",
        "email_address": "a@b.com",
        "lot_number": "L-42"
    });
    event.fields = fields.as_object().expect("object").clone();

    let transformed = service.transform(&event);
    assert!(transformed.payload.consent());
    assert!(transformed.notices.is_empty());
    assert_eq!(
        transformed.payload.recipients().as_slice(),
        [INTERNAL.to_string(), "a@b.com".to_string()]
    );
    assert_eq!(row_value(&transformed.payload, "Email Address"), "a@b.com");
}

#[test]
fn contact_consent_field_declined_blanks_every_email_key() {
    let (service, _, _) = build_service();
    let mut event = SubmissionEvent::new(at("2025-03-07T08:05:12Z"), Vec::new());
    let fields = serde_json::json!({
        "contact_consent": "no",
        "email": "a@b.com",
        "email_address_2": "c@d.com",
        "lot_number": "L-42"
    });
    event.fields = fields.as_object().expect("object").clone();

    let transformed = service.transform(&event);
    assert!(!transformed.payload.consent());
    assert!(transformed.notices.is_empty());
    assert_eq!(transformed.payload.recipients().len(), 1);
    assert_eq!(row_value(&transformed.payload, "Email"), "");
    assert_eq!(row_value(&transformed.payload, "Email Address 2"), "");
    assert_eq!(row_value(&transformed.payload, "Lot Number"), "L-42");
}

#[test]
fn registered_catalog_is_reused_when_event_omits_questions() {
    let (service, _, _) = build_service();
    service.register_form("complaints", &questions());

    let mut event = event("Yes");
    event.questions = None;
    let transformed = service.transform(&event);

    assert!(transformed.notices.is_empty());
    assert_eq!(transformed.payload.sections()[0].title, "Contact");
}

fn pregrouped_event(consent: &str) -> SubmissionEvent {
    let mut event = SubmissionEvent::new(at("2025-03-07T08:05:12Z"), Vec::new());
    event.submission_id = Some("S-17".to_string());
    event.sections = vec![
        Section {
            title: "Complaint".to_string(),
            rows: vec![AnsweredRow::new("Issue", "Cracked veneer")],
        },
        Section {
            title: "Contact".to_string(),
            rows: vec![
                AnsweredRow::new("Your name", "Ada"),
                AnsweredRow::new("Email", "a@b.com"),
            ],
        },
    ];
    let fields = serde_json::json!({ "contact_consent": consent });
    event.fields = fields.as_object().expect("object").clone();
    event
}

#[test]
fn pregrouped_sections_still_pass_through_redaction() {
    let (service, _, _) = build_service();
    let transformed = service.transform(&pregrouped_event("no"));
    let payload = &transformed.payload;

    let titles: Vec<&str> = payload
        .sections()
        .iter()
        .map(|section| section.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Complaint", "Contact"]);
    assert_eq!(row_value(payload, "Issue"), "Cracked veneer");
    assert_eq!(row_value(payload, "Your name"), "");
    assert_eq!(row_value(payload, "Email"), "");
    assert_eq!(payload.recipients().len(), 1);
    assert!(transformed.notices.is_empty());
}

#[test]
fn pregrouped_sections_read_consent_from_the_field_map() {
    let (service, _, _) = build_service();
    let payload = service.transform(&pregrouped_event("yes")).payload;

    assert!(payload.consent());
    assert_eq!(row_value(&payload, "Your name"), "Ada");
    assert_eq!(
        payload.recipients().as_slice(),
        [INTERNAL.to_string(), "a@b.com".to_string()]
    );
}
