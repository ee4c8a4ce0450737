use crate::infra::{
    read_event, resolve_event_path, InMemoryDispatchPublisher, InMemoryStatusLedger,
};
use chrono::{DateTime, FixedOffset, Local};
use clap::Args;
use form_relay::config::AppConfig;
use form_relay::error::AppError;
use form_relay::telemetry;
use form_relay::workflows::submission::{
    AnswerInput, CsvStatusLedger, HttpDispatchPublisher, Question, RawAnswer, SubmissionEvent,
    SubmissionService,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct ProcessArgs {
    /// Submission event JSON. Falls back to GITHUB_EVENT_PATH, LOCAL_EVENT_PATH, then sample_event.json.
    #[arg(long)]
    pub(crate) event: Option<PathBuf>,
    /// Print the assembled payload without touching the ledger or dispatch endpoint.
    #[arg(long)]
    pub(crate) dry_run: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the full dispatch body for every sample submission.
    #[arg(long)]
    pub(crate) show_payloads: bool,
}

pub(crate) fn run_process(args: ProcessArgs) -> Result<(), AppError> {
    let ProcessArgs { event, dry_run } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let path = resolve_event_path(event);
    let event = read_event(&path)?;

    if dry_run {
        let service = SubmissionService::new(
            Arc::new(InMemoryStatusLedger::default()),
            Arc::new(InMemoryDispatchPublisher::default()),
            &config.intake,
            &config.dispatch,
        );
        let transformed = service.transform(&event);
        for notice in &transformed.notices {
            println!("notice: {}", notice);
        }
        println!("{}", serde_json::to_string_pretty(&transformed.payload)?);
        return Ok(());
    }

    let service = SubmissionService::new(
        Arc::new(CsvStatusLedger::new(config.ledger.path.clone())),
        Arc::new(HttpDispatchPublisher::from_config(&config.dispatch)?),
        &config.intake,
        &config.dispatch,
    );
    let receipt = service.process(&event)?;
    info!(event = %path.display(), case_id = %receipt.case_id, "event processed");

    let summary = json!({
        "status": "ok",
        "submission_id": receipt.submission_id,
        "case_id": receipt.case_id,
        "recipients": receipt.recipients,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let ledger = Arc::new(InMemoryStatusLedger::default());
    let dispatcher = Arc::new(InMemoryDispatchPublisher::default());
    let service = SubmissionService::new(
        ledger.clone(),
        dispatcher.clone(),
        &config.intake,
        &config.dispatch,
    );

    let catalog = service.register_form("demo-complaints", &demo_questions());
    println!("Form relay demo");
    println!("- catalog 'demo-complaints' with {} answerable questions", catalog.len());

    let submitted_at = Local::now().fixed_offset();
    let samples = [
        ("consent given", "Yes"),
        ("consent declined", "No"),
        ("consent unclear", "Maybe later"),
    ];

    for (index, (label, consent)) in samples.iter().enumerate() {
        let event = demo_event(submitted_at, index as u64 + 1, consent);
        match service.process(&event) {
            Ok(receipt) => {
                println!(
                    "\n{}: case {} (consent {}) -> {}",
                    label,
                    receipt.case_id,
                    if receipt.consent { "yes" } else { "no" },
                    receipt.recipients.join(", ")
                );
                for notice in &receipt.notices {
                    println!("  notice: {}", notice);
                }
            }
            Err(err) => println!("\n{}: rejected: {}", label, err),
        }
    }

    println!("\nLedger rows:");
    for row in ledger.rows() {
        println!("  - {} | {} | {}", row.case_id, row.created_at, row.status);
    }

    for event in dispatcher.events() {
        println!(
            "\nDispatched {} for {}",
            event.event_type, event.client_payload.complaint_id
        );
        for section in &event.client_payload.sections {
            println!("  [{}]", section.title);
            for row in &section.rows {
                let value = if row.value.is_empty() {
                    "(redacted or empty)"
                } else {
                    row.value.as_str()
                };
                println!("    {}: {}", row.label, value);
            }
        }
        if args.show_payloads {
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    Ok(())
}

fn demo_questions() -> Vec<Question> {
    vec![
        Question::answerable("product", "Affected product"),
        Question::answerable("issue", "Describe the issue"),
        Question::section_break("contact-break", "Contact Information"),
        Question::answerable("name", "Your name"),
        Question::answerable("email", "Email address"),
        Question::answerable("phone", "Phone number"),
        Question::answerable("consent", "Do you agree that we may contact you?"),
    ]
}

fn demo_event(submitted_at: DateTime<FixedOffset>, index: u64, consent: &str) -> SubmissionEvent {
    let mut event = SubmissionEvent::new(
        submitted_at,
        vec![
            AnswerInput::new(
                "product",
                "Affected product",
                RawAnswer::Many(vec!["Aligner".into(), "Retainer".into()]),
            ),
            AnswerInput::new("issue", "Describe the issue", "Crack along the left edge"),
            AnswerInput::new("name", "Your name", "Ada Lovelace"),
            AnswerInput::new("email", "Email address", "ada@example.test"),
            AnswerInput::new("phone", "Phone number", "+44 20 7946 0000"),
            AnswerInput::new("consent", "Do you agree that we may contact you?", consent),
        ],
    );
    event.form_id = Some("demo-complaints".to_string());
    event.response_index = index;
    event
}
