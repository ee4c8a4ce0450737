use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{CatalogEntry, Question, DEFAULT_SECTION_TITLE, UNTITLED_QUESTION};

/// Immutable lookup from question id to its label and owning section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestionCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl QuestionCatalog {
    /// Walks the form definition once. Page breaks open a new section for every
    /// question that follows; a blank break title falls back to the default section.
    pub fn build(questions: &[Question]) -> Self {
        let (_, entries) = questions.iter().fold(
            (DEFAULT_SECTION_TITLE.to_string(), BTreeMap::new()),
            |(current_section, mut entries), question| {
                let title = question.title.trim();

                if question.is_section_break {
                    let next_section = if title.is_empty() {
                        DEFAULT_SECTION_TITLE.to_string()
                    } else {
                        title.to_string()
                    };
                    return (next_section, entries);
                }

                let label = if title.is_empty() {
                    UNTITLED_QUESTION.to_string()
                } else {
                    title.to_string()
                };
                entries
                    .entry(question.id.clone())
                    .or_insert_with(|| CatalogEntry {
                        label,
                        section_title: current_section.clone(),
                    });
                (current_section, entries)
            },
        );

        Self { entries }
    }

    pub fn lookup(&self, question_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Vec<Question> {
        vec![
            Question::answerable("q-name", "Full name"),
            Question::section_break("pb-1", "Product"),
            Question::answerable("q-lot", "Lot number"),
            Question::answerable("q-untitled", "   "),
            Question::section_break("pb-2", ""),
            Question::answerable("q-notes", "Notes"),
            Question::section_break("pb-3", " Contact "),
            Question::answerable("q-email", "Email"),
        ]
    }

    #[test]
    fn questions_before_first_break_use_default_section() {
        let catalog = QuestionCatalog::build(&form());
        let entry = catalog.lookup("q-name").expect("entry present");
        assert_eq!(entry.section_title, DEFAULT_SECTION_TITLE);
        assert_eq!(entry.label, "Full name");
    }

    #[test]
    fn page_breaks_set_section_for_following_questions() {
        let catalog = QuestionCatalog::build(&form());
        assert_eq!(catalog.lookup("q-lot").unwrap().section_title, "Product");
        assert_eq!(catalog.lookup("q-email").unwrap().section_title, "Contact");
    }

    #[test]
    fn blank_break_title_returns_to_default_section() {
        let catalog = QuestionCatalog::build(&form());
        assert_eq!(
            catalog.lookup("q-notes").unwrap().section_title,
            DEFAULT_SECTION_TITLE
        );
    }

    #[test]
    fn breaks_are_not_catalogued_and_blank_titles_get_placeholder() {
        let catalog = QuestionCatalog::build(&form());
        assert_eq!(catalog.len(), 5);
        assert!(catalog.lookup("pb-1").is_none());
        assert_eq!(catalog.lookup("q-untitled").unwrap().label, UNTITLED_QUESTION);
    }

    #[test]
    fn empty_form_yields_empty_catalog() {
        assert!(QuestionCatalog::build(&[]).is_empty());
    }
}
