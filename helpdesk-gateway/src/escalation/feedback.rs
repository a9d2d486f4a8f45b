//! Negative feedback on an answer re-escalates the original question.

use helpdesk_db::{FeedbackEvent, FeedbackRepository, HelpdeskDbPool};
use serde::Serialize;
use tracing::{info, warn};

use crate::chat::{ChatError, ValidationError, normalize_contact};
use crate::log_bridge::EXCHANGE_EVENT_KIND;

/// What a feedback submission did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackOutcome {
    pub ticket_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<i64>,
    /// Feedback for this message had already been recorded
    pub duplicate: bool,
}

#[derive(Debug, Clone)]
pub struct FeedbackHandler {
    db: HelpdeskDbPool,
}

impl FeedbackHandler {
    pub fn new(db: HelpdeskDbPool) -> Self {
        Self { db }
    }

    /// Record feedback at most once per message id.
    ///
    /// `helpful == false` opens a ticket for `original_question`; repeated
    /// submissions for the same message are acknowledged without effect.
    pub async fn record(
        &self,
        message_id: &str,
        helpful: bool,
        contact: Option<&str>,
        original_question: &str,
    ) -> Result<FeedbackOutcome, ChatError> {
        let message_id = message_id.trim();
        if message_id.is_empty() {
            return Err(ValidationError::EmptyMessageId.into());
        }
        if !helpful && original_question.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }
        let contact = normalize_contact(contact)?;

        let event = FeedbackEvent {
            message_id: message_id.to_string(),
            helpful,
            contact,
            original_question: original_question.to_string(),
        };

        let record = FeedbackRepository::record(self.db.pool(), &event)
            .await
            .inspect_err(|e| warn!("Failed to store feedback for {}: {}", message_id, e))?;

        if record.duplicate {
            info!(message_id, "Duplicate feedback acknowledged");
        }

        let ticket_id = record.ticket.map(|ticket| ticket.id);
        if let Some(id) = ticket_id {
            warn!(
                event_kind = EXCHANGE_EVENT_KIND,
                ticket_id = id,
                reason = "negative_feedback",
                "Answer {} marked unhelpful, escalated to ticket #{}",
                message_id,
                id
            );
        }

        Ok(FeedbackOutcome {
            ticket_created: ticket_id.is_some(),
            ticket_id,
            duplicate: record.duplicate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_db::TicketRepository;
    use helpdesk_db::test_helpers::create_test_pool;

    #[tokio::test]
    async fn test_negative_feedback_opens_one_ticket() {
        let db = create_test_pool().await.unwrap();
        let handler = FeedbackHandler::new(db.clone());

        let outcome = handler
            .record("msg-1", false, Some("user@example.com"), "How do I export data?")
            .await
            .unwrap();
        assert!(outcome.ticket_created);
        assert!(!outcome.duplicate);

        let ticket = TicketRepository::get_by_id(db.pool(), outcome.ticket_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.question, "How do I export data?");
        assert_eq!(ticket.contact.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn test_positive_feedback_opens_nothing() {
        let db = create_test_pool().await.unwrap();
        let handler = FeedbackHandler::new(db.clone());

        let outcome = handler.record("msg-2", true, None, "").await.unwrap();
        assert_eq!(
            outcome,
            FeedbackOutcome {
                ticket_created: false,
                ticket_id: None,
                duplicate: false,
            }
        );
        assert_eq!(TicketRepository::count(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_repeat_submission_is_duplicate() {
        let db = create_test_pool().await.unwrap();
        let handler = FeedbackHandler::new(db.clone());

        handler.record("msg-3", false, None, "Where is my order?").await.unwrap();
        let again = handler
            .record("msg-3", false, None, "Where is my order?")
            .await
            .unwrap();

        assert!(again.duplicate);
        assert!(!again.ticket_created);
        assert_eq!(TicketRepository::count(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_validation() {
        let db = create_test_pool().await.unwrap();
        let handler = FeedbackHandler::new(db);

        let empty_id = handler.record("  ", false, None, "Question").await;
        assert!(matches!(
            empty_id,
            Err(ChatError::Validation(ValidationError::EmptyMessageId))
        ));

        let empty_question = handler.record("msg-4", false, None, " ").await;
        assert!(matches!(
            empty_question,
            Err(ChatError::Validation(ValidationError::EmptyQuestion))
        ));
    }
}
