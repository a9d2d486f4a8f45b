//! Per-message chat orchestration.
//!
//! A question moves through retrieval, prompt assembly, generation and
//! classification, and ends either answered or escalated to a ticket:
//!
//! ```text
//! Received -> Retrieved -> Generated -> Classified -> Answered | Escalated
//! ```
//!
//! Generation failures skip classification and always escalate.

use std::sync::Arc;
use std::time::Duration;

use helpdesk_core::Settings;
use helpdesk_db::{DbError, HelpdeskDbPool, Ticket, TicketRepository};
use helpdesk_knowledge::KnowledgeIndex;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::escalation::{FallbackClassifier, OfflineResponder};
use crate::log_bridge::EXCHANGE_EVENT_KIND;
use crate::prompt::{ContextBuilder, Prompt, PromptBudgetError};
use crate::providers::{GenerationError, ResponseGenerator};

/// Longest accepted contact string, in characters
pub const MAX_CONTACT_CHARS: usize = 255;

/// Input rejected before any work is done.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("question is longer than {max} characters")]
    QuestionTooLong { max: usize },
    #[error("contact is longer than {max} characters")]
    ContactTooLong { max: usize },
    #[error("message id must not be empty")]
    EmptyMessageId,
}

/// Errors that end a request without a response
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("ticket storage failed: {0}")]
    Persistence(#[from] DbError),
}

/// Result of one processed question
#[derive(Debug, Clone, Serialize)]
pub struct ChatExchange {
    pub question: String,
    /// Titles of the sections retrieved for the question, best first
    pub retrieved_sections: Vec<String>,
    /// Text returned to the customer
    pub response: String,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<i64>,
    /// Correlation id for feedback, only set on answered exchanges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_error: Option<GenerationError>,
}

impl ChatExchange {
    pub fn ticket_created(&self) -> bool {
        self.ticket_id.is_some()
    }
}

/// Blank contacts become `None`; overlong ones are rejected.
pub fn normalize_contact(contact: Option<&str>) -> Result<Option<String>, ValidationError> {
    match contact.map(str::trim) {
        None | Some("") => Ok(None),
        Some(contact) if contact.chars().count() > MAX_CONTACT_CHARS => {
            Err(ValidationError::ContactTooLong {
                max: MAX_CONTACT_CHARS,
            })
        }
        Some(contact) => Ok(Some(contact.to_string())),
    }
}

/// Composes retrieval, generation and escalation for each message.
pub struct ChatOrchestrator {
    index: Arc<KnowledgeIndex>,
    context: ContextBuilder,
    generator: Arc<dyn ResponseGenerator>,
    classifier: FallbackClassifier,
    offline: OfflineResponder,
    db: HelpdeskDbPool,
    generation_permits: Semaphore,
    generation_timeout: Duration,
    ticket_notice: String,
    failure_notice: String,
}

impl ChatOrchestrator {
    /// Fails when the prompt settings leave too little room for a question.
    pub fn new(
        index: Arc<KnowledgeIndex>,
        generator: Arc<dyn ResponseGenerator>,
        db: HelpdeskDbPool,
        settings: &Settings,
    ) -> Result<Self, PromptBudgetError> {
        let context = ContextBuilder::from_settings(&settings.prompt);
        context.check_budget()?;

        Ok(Self {
            index,
            context,
            generator,
            classifier: FallbackClassifier::from_settings(&settings.escalation),
            offline: OfflineResponder::from_settings(&settings.escalation),
            db,
            generation_permits: Semaphore::new(settings.generation.max_concurrent.max(1)),
            generation_timeout: Duration::from_secs(settings.generation.timeout_seconds),
            ticket_notice: settings.escalation.ticket_notice.clone(),
            failure_notice: settings.escalation.generation_failure_notice.clone(),
        })
    }

    /// Override the generation deadline (queueing included).
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    pub fn db(&self) -> &HelpdeskDbPool {
        &self.db
    }

    /// Answer a question, escalating it when the answer is unusable.
    pub async fn chat(
        &self,
        question: &str,
        contact: Option<&str>,
    ) -> Result<ChatExchange, ChatError> {
        let contact = self.validate(question, contact)?;

        let hits = self.index.search(question);
        let retrieved_sections: Vec<String> = hits
            .iter()
            .map(|hit| hit.section.title().to_string())
            .collect();

        let built = self.context.build(question, &hits);

        match self.generate(&built.prompt).await {
            Err(error) => {
                let offline = self.offline.answer(question, &hits);
                let ticket = self.open_ticket(question, contact.as_deref()).await?;
                warn!(
                    event_kind = EXCHANGE_EVENT_KIND,
                    ticket_id = ticket.id,
                    reason = error.as_str(),
                    "Generation failed, escalated question to ticket #{}",
                    ticket.id
                );

                Ok(ChatExchange {
                    question: question.to_string(),
                    retrieved_sections,
                    response: format!("{}\n\n{}", offline, self.failure_notice),
                    is_fallback: true,
                    ticket_id: Some(ticket.id),
                    message_id: None,
                    generation_error: Some(error),
                })
            }
            Ok(answer) => {
                if let Some(phrase) = self.classifier.matched_phrase(&answer) {
                    let phrase = phrase.to_string();
                    let ticket = self.open_ticket(question, contact.as_deref()).await?;
                    warn!(
                        event_kind = EXCHANGE_EVENT_KIND,
                        ticket_id = ticket.id,
                        reason = "fallback_phrase",
                        "Answer matched fallback phrase {:?}, escalated to ticket #{}",
                        phrase,
                        ticket.id
                    );

                    Ok(ChatExchange {
                        question: question.to_string(),
                        retrieved_sections,
                        response: format!("{}\n\n{}", answer, self.ticket_notice),
                        is_fallback: true,
                        ticket_id: Some(ticket.id),
                        message_id: None,
                        generation_error: None,
                    })
                } else {
                    let message_id = uuid::Uuid::new_v4().to_string();
                    info!(
                        event_kind = EXCHANGE_EVENT_KIND,
                        message_id = %message_id,
                        sections = retrieved_sections.len(),
                        "Answered question"
                    );

                    Ok(ChatExchange {
                        question: question.to_string(),
                        retrieved_sections,
                        response: answer,
                        is_fallback: false,
                        ticket_id: None,
                        message_id: Some(message_id),
                        generation_error: None,
                    })
                }
            }
        }
    }

    /// Explicitly open a ticket for a question.
    pub async fn create_ticket(
        &self,
        question: &str,
        contact: Option<&str>,
    ) -> Result<Ticket, ChatError> {
        if question.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }
        let contact = normalize_contact(contact)?;
        let ticket = self.open_ticket(question, contact.as_deref()).await?;
        info!(ticket_id = ticket.id, "Ticket #{} created on request", ticket.id);
        Ok(ticket)
    }

    fn validate(
        &self,
        question: &str,
        contact: Option<&str>,
    ) -> Result<Option<String>, ValidationError> {
        if question.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }
        let max = self.context.max_question_chars();
        if question.chars().count() > max {
            return Err(ValidationError::QuestionTooLong { max });
        }
        normalize_contact(contact)
    }

    async fn open_ticket(&self, question: &str, contact: Option<&str>) -> Result<Ticket, DbError> {
        TicketRepository::create(self.db.pool(), question, contact)
            .await
            .inspect_err(|e| warn!("Failed to store ticket: {}", e))
    }

    /// One bounded generation call; waiting for a permit counts against
    /// the deadline.
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let deadline = Instant::now() + self.generation_timeout;

        let _permit =
            match tokio::time::timeout_at(deadline, self.generation_permits.acquire()).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(GenerationError::Unavailable),
                Err(_) => {
                    warn!("No generation slot freed up before the deadline");
                    return Err(GenerationError::Unavailable);
                }
            };

        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout_at(deadline, self.generator.generate(prompt, remaining)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} did not answer within {:?}",
                    self.generator.name(),
                    self.generation_timeout
                );
                Err(GenerationError::Unavailable)
            }
        }
    }
}
