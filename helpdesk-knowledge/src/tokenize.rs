//! Case-insensitive keyword tokenization shared by queries and sections.

use std::collections::HashSet;

/// Function words that never count as relevance on their own.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "about", "all", "am", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by",
    "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "how", "i", "if",
    "in", "into", "is", "it", "its", "me", "my", "no", "not", "of", "on", "or", "our", "please",
    "should", "so", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "to", "us", "was", "we", "were", "what", "when", "where", "which", "who", "why", "will",
    "with", "would", "you", "your",
];

/// Lowercased alphanumeric runs with stopwords removed.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
}

impl Tokenizer {
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn tokens(&self, text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .filter(|word| !self.stopwords.contains(word))
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_punctuation_and_lowercases() {
        let tokens = Tokenizer::new(Vec::<String>::new()).tokens("How long do REFUNDS take? (5-7 days)");
        let mut sorted: Vec<_> = tokens.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, vec!["5", "7", "days", "do", "how", "long", "refunds", "take"]);
    }

    #[test]
    fn test_default_stopwords_removed() {
        let tokens = Tokenizer::default().tokens("What is the airspeed of a swallow?");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("airspeed"));
        assert!(tokens.contains("swallow"));
    }

    #[test]
    fn test_custom_stopwords_are_case_insensitive() {
        let tokens = Tokenizer::new(["Refunds"]).tokens("refunds take time");
        assert!(!tokens.contains("refunds"));
        assert!(tokens.contains("take"));
    }

    #[test]
    fn test_unicode_letters_kept() {
        let tokens = Tokenizer::default().tokens("Café déjà-vu");
        assert!(tokens.contains("café"));
        assert!(tokens.contains("déjà"));
        assert!(tokens.contains("vu"));
    }
}
