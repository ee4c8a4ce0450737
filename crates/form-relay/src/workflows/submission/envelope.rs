use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use tracing::debug;

use super::domain::{Section, SubmissionEvent};

/// Error raised while reading an inbound event file.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("submission event is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dispatch envelope carries neither submission_id nor complaint_id")]
    MissingSubmissionId,
}

/// Reads a native submission event, or a `repository_dispatch` envelope whose
/// `client_payload` carries the submission, optionally wrapped in `data`.
///
/// Envelopes without a usable timestamp are stamped with `received_at`.
pub fn parse_event(
    raw: &str,
    received_at: DateTime<FixedOffset>,
) -> Result<SubmissionEvent, EventError> {
    let value: Value = serde_json::from_str(raw)?;
    if value.get("client_payload").is_some() {
        from_envelope(&value, received_at)
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

pub fn from_envelope(
    envelope: &Value,
    received_at: DateTime<FixedOffset>,
) -> Result<SubmissionEvent, EventError> {
    let empty = Map::new();
    let client_payload = envelope
        .get("client_payload")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    // `data` wins over top-level keys of the same name.
    let mut merged = client_payload
        .get("data")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    for (key, value) in client_payload {
        if key != "data" && !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    let pick = |keys: &[&str]| {
        keys.iter().find_map(|key| {
            scalar_text(client_payload.get(*key)).or_else(|| scalar_text(merged.get(*key)))
        })
    };

    let submission_id =
        pick(&["submission_id", "complaint_id"]).ok_or(EventError::MissingSubmissionId)?;

    let submitted_at = match pick(&["submission_timestamp", "timestamp"]) {
        Some(raw) => DateTime::parse_from_rfc3339(&raw).unwrap_or_else(|_| {
            debug!(timestamp = %raw, "envelope timestamp is not RFC 3339; using receipt time");
            received_at
        }),
        None => received_at,
    };

    let explicit_sections = [client_payload.get("sections"), merged.get("sections")]
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            Value::Array(items) if !items.is_empty() => Some(value.clone()),
            _ => None,
        });
    let sections = match explicit_sections {
        Some(items) => serde_json::from_value::<Vec<Section>>(items)?,
        None => Vec::new(),
    };

    let mut event = SubmissionEvent::new(submitted_at, Vec::new());
    event.submission_id = Some(submission_id);
    event.form_title = pick(&["form_title"]);
    event.fields = merged;
    event.sections = sections;
    Ok(event)
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
