use crate::workflows::submission::domain::{AnsweredRow, PipelineNotice, QuestionRole, Section};
use crate::workflows::submission::privacy::PrivacyPolicy;

fn policy() -> PrivacyPolicy {
    PrivacyPolicy::new("agree", "contact", &["yes"], &["email", "phone", "name"])
}

fn row(id: &str, label: &str, value: &str) -> AnsweredRow {
    AnsweredRow {
        label: label.to_string(),
        value: value.to_string(),
        question_id: Some(id.to_string()),
    }
}

fn sections(consent: &str) -> Vec<Section> {
    vec![
        Section {
            title: "Details".to_string(),
            rows: vec![
                row("q1", "Your name", "Ada"),
                row("q2", "Lot number", "L-42"),
            ],
        },
        Section {
            title: "Contact".to_string(),
            rows: vec![
                row("q3", "Do you AGREE to be CONTACTED?", consent),
                row("q4", "E-mail (work email)", "ada@example.com"),
                row("q5", "Mobile", "555-0000"),
            ],
        },
    ]
}

#[test]
fn consent_matching_is_case_insensitive_and_trimmed() {
    let decision = policy().extract_consent(&sections("  YES "));
    assert!(decision.granted);
    assert!(decision.notice.is_none());
}

#[test]
fn first_matching_consent_row_wins() {
    let mut input = sections("yes");
    input[0].rows.insert(0, row("q0", "Agree to contact (legacy)", "no"));
    assert!(!policy().extract_consent(&input).granted);
}

#[test]
fn redaction_is_noop_with_consent() {
    let input = sections("yes");
    let redacted = policy().redact(&input, true);
    assert_eq!(redacted.sections(), input.as_slice());
    assert_eq!(redacted.redacted_rows(), 0);
}

#[test]
fn redaction_blanks_keyword_rows_and_leaves_input_untouched() {
    let input = sections("no");
    let redacted = policy().redact(&input, false);

    let values: Vec<&str> = redacted
        .sections()
        .iter()
        .flat_map(|section| section.rows.iter())
        .map(|row| row.value.as_str())
        .collect();
    assert_eq!(values, vec!["", "L-42", "no", "", "555-0000"]);
    assert_eq!(redacted.redacted_rows(), 2);
    assert_eq!(input[0].rows[0].value, "Ada");
}

#[test]
fn explicit_roles_override_label_matching() {
    let policy = policy()
        .with_question_role("q5", QuestionRole::Pii)
        .with_question_role("q1", QuestionRole::Consent);
    let input = sections("no");

    let decision = policy.extract_consent(&input);
    assert!(!decision.granted, "q1 answered 'Ada' is not affirmative");
    assert!(decision.notice.is_some());

    let redacted = policy.redact(&input, false);
    let mobile = &redacted.sections()[1].rows[2];
    assert_eq!(mobile.value, "");
    let name = &redacted.sections()[0].rows[0];
    assert_eq!(name.value, "Ada", "consent-role rows are never blanked");
}

#[test]
fn contact_email_role_is_used_for_recipient_lookup() {
    let policy = policy()
        .with_email_token("mail")
        .with_question_role("q2", QuestionRole::ContactEmail);
    let mut input = sections("yes");
    input[0].rows[1].value = "lot@example.com".to_string();

    let redacted = policy.redact(&input, true);
    assert_eq!(
        policy.contact_email(&redacted).as_deref(),
        Some("lot@example.com")
    );
}

#[test]
fn contact_email_is_gone_after_redaction() {
    let redacted = policy().redact(&sections("no"), false);
    assert_eq!(policy().contact_email(&redacted), None);
}

#[test]
fn blank_consent_tokens_match_no_label() {
    let policy = PrivacyPolicy::new("  ", "", &["yes"], &["name"]);
    let input = vec![Section {
        title: "Details".to_string(),
        rows: vec![row("q1", "Favourite colour", "yes"), row("q2", "Your name", "Ada")],
    }];

    let decision = policy.extract_consent(&input);
    assert!(!decision.granted);
    assert!(matches!(
        decision.notice,
        Some(PipelineNotice::ConsentAmbiguous { .. })
    ));
}

#[test]
fn constructor_keeps_configured_negatives_and_normalizes_values() {
    let policy = PrivacyPolicy::new(" AGREE ", "Contact", &[" YES "], &[" Name "]);
    let declined = policy.extract_consent(&sections("No"));
    assert!(!declined.granted);
    assert!(declined.notice.is_none(), "'no' is a known negative");

    let granted = policy.extract_consent(&sections("yes"));
    assert!(granted.granted);

    let redacted = policy.redact(&sections("no"), false);
    assert_eq!(redacted.sections()[0].rows[0].value, "");
}
