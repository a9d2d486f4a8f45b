//! Bounded prompt assembly from retrieved knowledge sections.

use helpdesk_core::PromptSettings;
use helpdesk_knowledge::SearchHit;
use tracing::debug;

use super::Prompt;

/// Default instruction preamble for the support assistant.
pub const DEFAULT_PREAMBLE: &str = "You are a helpful customer support assistant. \
Use the following knowledge base to answer customer questions. \
If the knowledge base doesn't contain relevant information, be honest and say \
you don't have enough information to help.";

const KNOWLEDGE_HEADER: &str = "Knowledge Base:";

const CLOSING_INSTRUCTION: &str = "Please provide a helpful, accurate response based on \
the knowledge base. If you cannot provide a satisfactory answer, indicate this clearly.";

const NO_CONTEXT_INSTRUCTION: &str = "No knowledge base entries match this question. \
Say that you don't have enough information to help rather than guessing.";

const USER_PREFIX: &str = "Customer question: ";

/// Shortest question room a configured budget must leave.
pub const MIN_QUESTION_CHARS: usize = 200;

/// The preamble leaves too little of the budget for a question.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "prompt.max_chars ({max_chars}) leaves room for {available} question characters, at least {min} required"
)]
pub struct PromptBudgetError {
    pub max_chars: usize,
    pub available: usize,
    pub min: usize,
}

/// Prompt plus a record of which sections made it in.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub prompt: Prompt,
    /// Titles of the sections included, in score order
    pub kept_titles: Vec<String>,
    /// Lowest-scoring sections left out to respect the budget
    pub dropped: usize,
}

/// Builds prompts within a fixed character budget.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    preamble: String,
    max_chars: usize,
}

impl ContextBuilder {
    pub fn new(preamble: impl Into<String>, max_chars: usize) -> Self {
        Self {
            preamble: preamble.into(),
            max_chars,
        }
    }

    pub fn from_settings(settings: &PromptSettings) -> Self {
        let preamble = settings
            .preamble
            .clone()
            .unwrap_or_else(|| DEFAULT_PREAMBLE.to_string());
        Self::new(preamble, settings.max_chars)
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Longest question (in characters) that still fits with no sections.
    pub fn max_question_chars(&self) -> usize {
        let overhead =
            self.render_system(&[]).chars().count() + USER_PREFIX.chars().count();
        self.max_chars.saturating_sub(overhead)
    }

    /// Reject budgets that cannot fit a reasonable question.
    pub fn check_budget(&self) -> Result<(), PromptBudgetError> {
        let available = self.max_question_chars();
        if available < MIN_QUESTION_CHARS {
            return Err(PromptBudgetError {
                max_chars: self.max_chars,
                available,
                min: MIN_QUESTION_CHARS,
            });
        }
        Ok(())
    }

    /// Assemble the prompt for a question and its ranked hits.
    ///
    /// Hits must be in descending score order. Sections are dropped from the
    /// tail until the prompt fits; the question itself is never shortened.
    pub fn build(&self, question: &str, hits: &[SearchHit<'_>]) -> BuiltPrompt {
        let user = format!("{USER_PREFIX}{question}");
        let user_chars = user.chars().count();

        let mut kept = hits.len();
        let system = loop {
            let system = self.render_system(&hits[..kept]);
            if kept == 0 || system.chars().count() + user_chars <= self.max_chars {
                break system;
            }
            kept -= 1;
        };

        let dropped = hits.len() - kept;
        let kept_titles: Vec<String> = hits[..kept]
            .iter()
            .map(|hit| hit.section.title().to_string())
            .collect();

        debug!(
            "Prompt built with {} section(s) ({} dropped): {:?}",
            kept, dropped, kept_titles
        );

        BuiltPrompt {
            prompt: Prompt { system, user },
            kept_titles,
            dropped,
        }
    }

    fn render_system(&self, hits: &[SearchHit<'_>]) -> String {
        if hits.is_empty() {
            return format!("{}\n\n{}", self.preamble, NO_CONTEXT_INSTRUCTION);
        }

        let knowledge = hits
            .iter()
            .map(|hit| hit.section.text())
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "{}\n\n{}\n{}\n\n{}",
            self.preamble, KNOWLEDGE_HEADER, knowledge, CLOSING_INSTRUCTION
        )
    }
}
