//! Support ticket storage.
//!
//! Tickets are append-only: every escalation inserts a new row, identical
//! questions included. Ids come from an `AUTOINCREMENT` column so they are
//! assigned monotonically and never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};

/// Ticket lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(DbError::InvalidStatus(s.to_string())),
        }
    }
}

/// A stored escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: TicketStatus,
}

/// Ticket repository for database operations
pub struct TicketRepository;

impl TicketRepository {
    /// Create a new open ticket.
    ///
    /// Blank questions are rejected; blank contacts are stored as NULL.
    pub async fn create(
        pool: &SqlitePool,
        question: &str,
        contact: Option<&str>,
    ) -> DbResult<Ticket> {
        Self::insert(pool, question, contact).await
    }

    /// Insert a ticket through any SQLite executor (pool or open transaction).
    pub(crate) async fn insert<'e, E>(
        executor: E,
        question: &str,
        contact: Option<&str>,
    ) -> DbResult<Ticket>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if question.trim().is_empty() {
            return Err(DbError::EmptyQuestion);
        }
        let contact = contact
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let created_at = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO tickets (question, contact, created_at, status)
             VALUES (?, ?, ?, ?)",
        )
        .bind(question)
        .bind(&contact)
        .bind(created_at)
        .bind(TicketStatus::Open.to_string())
        .execute(executor)
        .await?;

        let id = result.last_insert_rowid();
        info!("Created ticket #{}", id);

        Ok(Ticket {
            id,
            question: question.to_string(),
            contact,
            created_at: timestamp_to_datetime(created_at)?,
            status: TicketStatus::Open,
        })
    }

    /// Get a ticket by id
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> DbResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            "SELECT id, question, contact, created_at, status
             FROM tickets
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }

    /// List every ticket, oldest (lowest id) first
    pub async fn list_all(pool: &SqlitePool) -> DbResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT id, question, contact, created_at, status
             FROM tickets
             ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Ticket::try_from).collect()
    }

    /// Count all tickets
    pub async fn count(pool: &SqlitePool) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

fn timestamp_to_datetime(ts: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0).ok_or(DbError::InvalidTimestamp(ts))
}

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    question: String,
    contact: Option<String>,
    created_at: i64,
    status: String,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = DbError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            question: row.question,
            contact: row.contact,
            created_at: timestamp_to_datetime(row.created_at)?,
            status: row.status.parse()?,
        })
    }
}
