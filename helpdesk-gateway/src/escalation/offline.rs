//! Canned answers served when the generator could not be reached.

use helpdesk_core::{EscalationSettings, OfflineAnswer};
use helpdesk_knowledge::SearchHit;

/// A retrieved section is only quoted when it carries this much text.
const MIN_SECTION_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct OfflineResponder {
    rules: Vec<OfflineAnswer>,
    default_answer: String,
}

impl OfflineResponder {
    pub fn new(rules: Vec<OfflineAnswer>, default_answer: impl Into<String>) -> Self {
        Self {
            rules,
            default_answer: default_answer.into(),
        }
    }

    pub fn from_settings(settings: &EscalationSettings) -> Self {
        Self::new(
            settings.offline_answers.clone(),
            settings.default_answer.clone(),
        )
    }

    /// Pick the offline answer for a question.
    ///
    /// Keyword rules are checked in order against the lowercased question.
    /// Without a matching rule the best retrieved section is quoted, and
    /// the default apology is the last resort.
    pub fn answer(&self, question: &str, hits: &[SearchHit<'_>]) -> String {
        let question = question.to_lowercase();

        let rule = self.rules.iter().find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| question.contains(&keyword.to_lowercase()))
        });
        if let Some(rule) = rule {
            return rule.answer.clone();
        }

        if let Some(hit) = hits.first() {
            let text = hit.section.text();
            if text.chars().count() > MIN_SECTION_CHARS {
                return text;
            }
        }

        self.default_answer.clone()
    }
}
