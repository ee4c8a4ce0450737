use std::collections::BTreeMap;

use super::domain::{AnsweredRow, PipelineNotice, QuestionRole, Section};
use super::sections::FIELD_MAP_ROLES;
use crate::config::IntakeConfig;

/// Consent and PII matching rules injected from deployment configuration.
///
/// Explicit question-id roles always win, configured ones ahead of the
/// built-in field-map keys. Label substring matching is only consulted for
/// rows whose question carries no explicit role. Blank tokens never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyPolicy {
    agreement_token: String,
    contact_token: String,
    affirmative_values: Vec<String>,
    negative_values: Vec<String>,
    pii_keywords: Vec<String>,
    email_token: String,
    question_roles: BTreeMap<String, QuestionRole>,
}

impl PrivacyPolicy {
    pub fn new(
        agreement_token: &str,
        contact_token: &str,
        affirmative_values: &[&str],
        pii_keywords: &[&str],
    ) -> Self {
        let config = IntakeConfig {
            agreement_token: agreement_token.to_string(),
            contact_token: contact_token.to_string(),
            affirmative_values: affirmative_values.iter().map(|value| value.to_string()).collect(),
            pii_keywords: pii_keywords.iter().map(|keyword| keyword.to_string()).collect(),
            ..IntakeConfig::default()
        };
        Self::from(&config)
    }

    pub fn with_question_role(mut self, question_id: impl Into<String>, role: QuestionRole) -> Self {
        self.question_roles.insert(question_id.into(), role);
        self
    }

    pub fn with_email_token(mut self, token: &str) -> Self {
        self.email_token = token.trim().to_lowercase();
        self
    }

    fn explicit_role(&self, row: &AnsweredRow) -> Option<QuestionRole> {
        row.question_id
            .as_deref()
            .and_then(|id| self.question_roles.get(id))
            .copied()
    }

    fn label_is_consent(&self, label: &str) -> bool {
        if self.agreement_token.is_empty() || self.contact_token.is_empty() {
            return false;
        }
        let label = label.to_lowercase();
        label.contains(&self.agreement_token) && label.contains(&self.contact_token)
    }

    fn is_pii(&self, row: &AnsweredRow) -> bool {
        match self.explicit_role(row) {
            Some(QuestionRole::Pii | QuestionRole::ContactEmail) => true,
            Some(QuestionRole::Consent) => false,
            None => {
                let label = row.label.to_lowercase();
                self.pii_keywords
                    .iter()
                    .any(|keyword| label.contains(keyword.as_str()))
            }
        }
    }

    fn is_contact_email(&self, row: &AnsweredRow) -> bool {
        match self.explicit_role(row) {
            Some(role) => role == QuestionRole::ContactEmail,
            None => {
                !self.email_token.is_empty()
                    && row.label.to_lowercase().contains(&self.email_token)
            }
        }
    }

    /// Finds the consent row and reads it fail-closed.
    pub fn extract_consent(&self, sections: &[Section]) -> ConsentDecision {
        let rows = || sections.iter().flat_map(|section| section.rows.iter());
        let has_explicit = rows().any(|row| self.explicit_role(row) == Some(QuestionRole::Consent));

        let consent_row = if has_explicit {
            rows().find(|row| self.explicit_role(row) == Some(QuestionRole::Consent))
        } else {
            rows().find(|row| self.explicit_role(row).is_none() && self.label_is_consent(&row.label))
        };

        let Some(row) = consent_row else {
            return ConsentDecision {
                granted: false,
                notice: Some(PipelineNotice::ConsentAmbiguous {
                    reason: "no consent question answered".to_string(),
                }),
            };
        };

        let answer = row.value.trim().to_lowercase();
        if self.affirmative_values.iter().any(|value| *value == answer) {
            return ConsentDecision {
                granted: true,
                notice: None,
            };
        }

        let notice = if self.negative_values.iter().any(|value| *value == answer) {
            None
        } else {
            Some(PipelineNotice::ConsentAmbiguous {
                reason: format!("unrecognized answer '{}' to '{}'", row.value.trim(), row.label),
            })
        };

        ConsentDecision {
            granted: false,
            notice,
        }
    }

    /// Produces the copy of `sections` that may leave the pipeline.
    pub fn redact(&self, sections: &[Section], consent: bool) -> RedactedSections {
        if consent {
            return RedactedSections {
                sections: sections.to_vec(),
                consent,
                redacted_rows: 0,
            };
        }

        let mut redacted_rows = 0;
        let sections = sections
            .iter()
            .map(|section| Section {
                title: section.title.clone(),
                rows: section
                    .rows
                    .iter()
                    .map(|row| {
                        if self.is_pii(row) {
                            redacted_rows += 1;
                            AnsweredRow {
                                value: String::new(),
                                ..row.clone()
                            }
                        } else {
                            row.clone()
                        }
                    })
                    .collect(),
            })
            .collect();

        RedactedSections {
            sections,
            consent,
            redacted_rows,
        }
    }

    /// First email-like contact value that survived redaction.
    pub fn contact_email(&self, sections: &RedactedSections) -> Option<String> {
        sections
            .sections
            .iter()
            .flat_map(|section| section.rows.iter())
            .filter(|row| self.is_contact_email(row))
            .map(|row| row.value.trim())
            .find(|value| value.contains('@'))
            .map(str::to_string)
    }
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self::from(&IntakeConfig::default())
    }
}

impl From<&IntakeConfig> for PrivacyPolicy {
    fn from(config: &IntakeConfig) -> Self {
        let mut question_roles = config.question_roles.clone();
        for (key, role) in FIELD_MAP_ROLES {
            question_roles.entry(key.to_string()).or_insert(*role);
        }

        Self {
            agreement_token: config.agreement_token.trim().to_lowercase(),
            contact_token: config.contact_token.trim().to_lowercase(),
            affirmative_values: normalize(config.affirmative_values.iter().map(String::as_str)),
            negative_values: normalize(config.negative_values.iter().map(String::as_str)),
            pii_keywords: normalize(config.pii_keywords.iter().map(String::as_str)),
            email_token: config.email_token.trim().to_lowercase(),
            question_roles,
        }
    }
}

/// Outcome of consent extraction; `granted` is false unless the answer was affirmative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentDecision {
    pub granted: bool,
    pub notice: Option<PipelineNotice>,
}

/// Sections that went through [`PrivacyPolicy::redact`]. Only the redactor
/// can build one, and the payload assembler accepts nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedSections {
    sections: Vec<Section>,
    consent: bool,
    redacted_rows: usize,
}

impl RedactedSections {
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn consent(&self) -> bool {
        self.consent
    }

    pub fn redacted_rows(&self) -> usize {
        self.redacted_rows
    }

    pub(crate) fn into_sections(self) -> Vec<Section> {
        self.sections
    }
}

fn normalize<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}
