//! Feedback events on answered messages.
//!
//! The first event for a `message_id` wins: it is stored together with the
//! ticket it escalated to (if any) in one transaction, and every later event
//! for the same id is reported as a duplicate without side effects.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::tickets::{Ticket, TicketRepository};

/// A helpful / not-helpful judgment on a generated answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub message_id: String,
    pub helpful: bool,
    pub contact: Option<String>,
    pub original_question: String,
}

/// Outcome of recording a feedback event
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    /// Ticket opened by this event (negative feedback only)
    pub ticket: Option<Ticket>,
    /// True when feedback for this message was already recorded
    pub duplicate: bool,
}

/// Stored feedback row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFeedback {
    pub message_id: String,
    pub helpful: bool,
    pub contact: Option<String>,
    pub original_question: String,
    pub ticket_id: Option<i64>,
    pub created_at: i64,
}

/// Feedback repository for database operations
pub struct FeedbackRepository;

impl FeedbackRepository {
    /// Record a feedback event at most once per message id.
    ///
    /// Negative feedback opens a ticket for the original question inside the
    /// same transaction as the feedback row.
    pub async fn record(pool: &SqlitePool, event: &FeedbackEvent) -> DbResult<FeedbackRecord> {
        if !event.helpful && event.original_question.trim().is_empty() {
            return Err(DbError::EmptyQuestion);
        }

        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO feedback (message_id, helpful, contact, original_question, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&event.message_id)
        .bind(event.helpful)
        .bind(&event.contact)
        .bind(&event.original_question)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            debug!("Ignoring repeated feedback for message {}", event.message_id);
            return Ok(FeedbackRecord {
                ticket: None,
                duplicate: true,
            });
        }

        let ticket = if event.helpful {
            None
        } else {
            let ticket = TicketRepository::insert(
                &mut *tx,
                &event.original_question,
                event.contact.as_deref(),
            )
            .await?;

            sqlx::query("UPDATE feedback SET ticket_id = ? WHERE message_id = ?")
                .bind(ticket.id)
                .bind(&event.message_id)
                .execute(&mut *tx)
                .await?;

            Some(ticket)
        };

        tx.commit().await?;

        info!(
            "Recorded {} feedback for message {}",
            if event.helpful { "positive" } else { "negative" },
            event.message_id
        );

        Ok(FeedbackRecord {
            ticket,
            duplicate: false,
        })
    }

    /// Look up the stored feedback for a message
    pub async fn get(pool: &SqlitePool, message_id: &str) -> DbResult<Option<StoredFeedback>> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            "SELECT message_id, helpful, contact, original_question, ticket_id, created_at
             FROM feedback
             WHERE message_id = ?",
        )
        .bind(message_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(StoredFeedback::from))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FeedbackRow {
    message_id: String,
    helpful: bool,
    contact: Option<String>,
    original_question: String,
    ticket_id: Option<i64>,
    created_at: i64,
}

impl From<FeedbackRow> for StoredFeedback {
    fn from(row: FeedbackRow) -> Self {
        Self {
            message_id: row.message_id,
            helpful: row.helpful,
            contact: row.contact,
            original_question: row.original_question,
            ticket_id: row.ticket_id,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_pool;

    fn event(message_id: &str, helpful: bool) -> FeedbackEvent {
        FeedbackEvent {
            message_id: message_id.to_string(),
            helpful,
            contact: Some("user@example.com".to_string()),
            original_question: "How do I reset my password?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_negative_feedback_creates_ticket() {
        let db = create_test_pool().await.unwrap();
        let pool = db.pool();

        let record = FeedbackRepository::record(pool, &event("msg-1", false))
            .await
            .unwrap();

        assert!(!record.duplicate);
        let ticket = record.ticket.unwrap();
        assert_eq!(ticket.question, "How do I reset my password?");
        assert_eq!(ticket.contact.as_deref(), Some("user@example.com"));

        let stored = FeedbackRepository::get(pool, "msg-1").await.unwrap().unwrap();
        assert!(!stored.helpful);
        assert_eq!(stored.ticket_id, Some(ticket.id));
    }

    #[tokio::test]
    async fn test_positive_feedback_creates_no_ticket() {
        let db = create_test_pool().await.unwrap();
        let pool = db.pool();

        let record = FeedbackRepository::record(pool, &event("msg-2", true))
            .await
            .unwrap();

        assert!(record.ticket.is_none());
        assert!(!record.duplicate);
        assert_eq!(TicketRepository::count(pool).await.unwrap(), 0);

        let stored = FeedbackRepository::get(pool, "msg-2").await.unwrap().unwrap();
        assert!(stored.helpful);
        assert!(stored.ticket_id.is_none());
    }

    #[tokio::test]
    async fn test_repeated_feedback_is_ignored() {
        let db = create_test_pool().await.unwrap();
        let pool = db.pool();

        let first = FeedbackRepository::record(pool, &event("msg-3", false))
            .await
            .unwrap();
        let second = FeedbackRepository::record(pool, &event("msg-3", false))
            .await
            .unwrap();
        let flipped = FeedbackRepository::record(pool, &event("msg-3", true))
            .await
            .unwrap();

        assert!(first.ticket.is_some());
        assert!(second.duplicate && second.ticket.is_none());
        assert!(flipped.duplicate && flipped.ticket.is_none());
        assert_eq!(TicketRepository::count(pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_negative_feedback_requires_question() {
        let db = create_test_pool().await.unwrap();
        let pool = db.pool();

        let mut blank = event("msg-4", false);
        blank.original_question = "  ".to_string();

        let result = FeedbackRepository::record(pool, &blank).await;
        assert!(matches!(result, Err(DbError::EmptyQuestion)));
        assert!(FeedbackRepository::get(pool, "msg-4").await.unwrap().is_none());
    }
}
