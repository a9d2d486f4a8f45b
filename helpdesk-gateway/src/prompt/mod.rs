//! Prompt assembly for the generation call.
//!
//! A prompt is a system message (instructions plus retrieved knowledge) and a
//! user message carrying the customer question.

pub mod context;

use serde::Serialize;

pub use context::{
    BuiltPrompt, ContextBuilder, DEFAULT_PREAMBLE, MIN_QUESTION_CHARS, PromptBudgetError,
};

/// System and user text sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Characters across both messages, the unit of the prompt budget
    pub fn char_count(&self) -> usize {
        self.system.chars().count() + self.user.chars().count()
    }
}
