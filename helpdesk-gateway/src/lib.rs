pub mod chat;
pub mod escalation;
pub mod log_bridge;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod state;

pub use chat::{ChatError, ChatExchange, ChatOrchestrator, ValidationError};
pub use escalation::{FallbackClassifier, FeedbackHandler, FeedbackOutcome, OfflineResponder};
pub use prompt::{BuiltPrompt, ContextBuilder, Prompt, PromptBudgetError};
pub use providers::{GenerationError, OpenAiCompatibleClient, ResponseGenerator};
pub use state::{AppState, LogEntry};
