use std::collections::HashMap;

use serde_json::Value;

use super::catalog::QuestionCatalog;
use super::domain::{
    AnswerInput, AnsweredRow, PipelineNotice, QuestionRole, Section, DEFAULT_SECTION_TITLE,
    MULTI_VALUE_SEPARATOR, UNTITLED_QUESTION,
};

/// Section title for submissions delivered as a flat field map.
pub const FIELD_MAP_SECTION_TITLE: &str = "Form Responses";

const TECHNICAL_FIELD_KEYS: &[&str] = &[
    "submission_id",
    "complaint_id",
    "complaintid",
    "timestamp",
    "submission_timestamp",
    "form_title",
    "email_to",
    "sections",
];

/// Roles of the well-known keys in flat field maps, used unless configuration
/// assigns the key another role.
pub const FIELD_MAP_ROLES: &[(&str, QuestionRole)] = &[
    ("contact_consent", QuestionRole::Consent),
    ("email_address", QuestionRole::ContactEmail),
    ("email", QuestionRole::ContactEmail),
    ("email_address_2", QuestionRole::ContactEmail),
];

/// Sections grouped from one submission plus the catalog misses seen on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionAssembly {
    pub sections: Vec<Section>,
    pub notices: Vec<PipelineNotice>,
}

/// Groups answers into sections in first-seen order, rows in encounter order.
pub fn assemble_sections(catalog: &QuestionCatalog, answers: &[AnswerInput]) -> SectionAssembly {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<AnsweredRow>> = HashMap::new();
    let mut notices = Vec::new();

    for answer in answers {
        let (label, section_title) = match catalog.lookup(&answer.question_id) {
            Some(entry) => (entry.label.clone(), entry.section_title.clone()),
            None => {
                notices.push(PipelineNotice::CatalogLookupMiss {
                    question_id: answer.question_id.clone(),
                });
                let title = answer.title.trim();
                let label = if title.is_empty() {
                    UNTITLED_QUESTION.to_string()
                } else {
                    title.to_string()
                };
                (label, DEFAULT_SECTION_TITLE.to_string())
            }
        };

        let row = AnsweredRow {
            label,
            value: answer.value.to_row_value(),
            question_id: Some(answer.question_id.clone()),
        };

        grouped
            .entry(section_title.clone())
            .or_insert_with(|| {
                order.push(section_title);
                Vec::new()
            })
            .push(row);
    }

    let sections = order
        .into_iter()
        .map(|title| {
            let rows = grouped.remove(&title).unwrap_or_default();
            Section { title, rows }
        })
        .collect();

    SectionAssembly { sections, notices }
}

/// Builds a single section from a flat `snake_case` field map, skipping
/// transport keys and blank values. Keys keep their delivered order.
pub fn sections_from_fields(fields: &serde_json::Map<String, Value>) -> Vec<Section> {
    let rows: Vec<AnsweredRow> = fields
        .iter()
        .filter(|(key, _)| !TECHNICAL_FIELD_KEYS.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let value = field_value_text(value);
            if value.is_empty() {
                return None;
            }
            let label = title_label(key);
            if label.is_empty() {
                return None;
            }
            Some(AnsweredRow {
                label,
                value,
                question_id: Some(key.clone()),
            })
        })
        .collect();

    if rows.is_empty() {
        return Vec::new();
    }

    vec![Section {
        title: FIELD_MAP_SECTION_TITLE.to_string(),
        rows,
    }]
}

/// `lot_serial_number` -> `Lot Serial Number`.
pub fn title_label(key: &str) -> String {
    key.replace("__", " ")
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(field_value_text)
            .collect::<Vec<_>>()
            .join(MULTI_VALUE_SEPARATOR),
        other => other.to_string(),
    }
}
