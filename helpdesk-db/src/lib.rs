//! helpdesk-db: SQLite storage for escalation tickets and feedback.
//!
//! This crate provides database operations for:
//! - Append-only support tickets
//! - At-most-once feedback events keyed by message id

pub mod error;
pub mod feedback;
pub mod helpdesk_db;
mod sqlite_runtime;
pub mod tickets;

// Re-export commonly used types
pub use error::{DbError, DbResult};
pub use feedback::{FeedbackEvent, FeedbackRecord, FeedbackRepository, StoredFeedback};
pub use helpdesk_db::HelpdeskDbPool;
pub use tickets::{Ticket, TicketRepository, TicketStatus};

// Re-export test helpers when running tests or when test-helpers feature is enabled
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
