//! Escalation policy: when an exchange becomes a support ticket.

pub mod classifier;
pub mod feedback;
pub mod offline;

pub use classifier::{DEFAULT_FALLBACK_PHRASES, FallbackClassifier};
pub use feedback::{FeedbackHandler, FeedbackOutcome};
pub use offline::OfflineResponder;
