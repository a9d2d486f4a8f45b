//! Heuristic detection of generated answers that dodge the question.

use helpdesk_core::EscalationSettings;

/// Phrases that mark an answer as a fallback unless disabled in settings.
pub const DEFAULT_FALLBACK_PHRASES: &[&str] = &[
    "i'm not sure",
    "i don't know",
    "i cannot provide",
    "i'm unable to",
    "i don't have enough information",
    "i'm sorry, but",
    "unfortunately, i",
    "i cannot answer",
    "i don't have access to",
    "i'm not able to",
    "i don't have information",
    "i cannot help",
];

/// Case-insensitive substring matcher over a phrase list.
#[derive(Debug, Clone)]
pub struct FallbackClassifier {
    phrases: Vec<String>,
}

impl FallbackClassifier {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for phrase in phrases {
            let phrase = normalize(phrase.as_ref());
            if !phrase.trim().is_empty() && !normalized.contains(&phrase) {
                normalized.push(phrase);
            }
        }
        Self { phrases: normalized }
    }

    /// Built-in phrases with the settings map applied on top.
    ///
    /// `true` adds a phrase, `false` removes a built-in one.
    pub fn from_settings(settings: &EscalationSettings) -> Self {
        let mut phrases: Vec<String> = DEFAULT_FALLBACK_PHRASES
            .iter()
            .map(|p| p.to_string())
            .collect();

        for (phrase, enabled) in &settings.fallback_phrases {
            let phrase = normalize(phrase);
            if *enabled {
                phrases.push(phrase);
            } else {
                phrases.retain(|existing| *existing != phrase);
            }
        }

        Self::new(phrases)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// First configured phrase found in the answer
    pub fn matched_phrase(&self, answer: &str) -> Option<&str> {
        let answer = normalize(answer);
        self.phrases
            .iter()
            .find(|phrase| answer.contains(phrase.as_str()))
            .map(String::as_str)
    }

    /// Whether the answer should be escalated
    pub fn classify(&self, answer: &str) -> bool {
        self.matched_phrase(answer).is_some()
    }
}

impl Default for FallbackClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_PHRASES)
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'")
}
