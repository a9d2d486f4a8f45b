use std::sync::OnceLock;

use helpdesk_db::HelpdeskDbPool;
use tokio::sync::broadcast;

use crate::chat::ChatOrchestrator;
use crate::escalation::FeedbackHandler;

/// Log entry for broadcasting events to operator listeners
#[derive(Debug, Clone)]
pub enum LogEntry {
    /// HTTP request handled
    HttpRequest {
        method: String,
        path: String,
        status: u16,
    },
    /// Question answered without escalation
    ChatAnswered {
        message_id: String,
        question: String,
    },
    /// Ticket opened
    Escalated {
        ticket_id: i64,
        reason: String,
        question: String,
    },
    /// Feedback received on an answer
    Feedback {
        message_id: String,
        helpful: bool,
        duplicate: bool,
    },
    /// WebSocket event
    WebSocket { event: String, client_id: String },
    /// Forwarded tracing event
    Trace {
        level: String,
        target: String,
        message: String,
    },
}

fn shorten(text: &str) -> String {
    if text.chars().count() > 50 {
        format!("{}...", text.chars().take(50).collect::<String>())
    } else {
        text.to_string()
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use chrono::Utc;
        let timestamp = Utc::now().format("%H:%M:%S");

        match self {
            LogEntry::HttpRequest {
                method,
                path,
                status,
            } => write!(f, "[{}] [HTTP] {} {} {}", timestamp, method, path, status),
            LogEntry::ChatAnswered {
                message_id,
                question,
            } => write!(
                f,
                "[{}] [ANSWERED] {} {}",
                timestamp,
                message_id,
                shorten(question)
            ),
            LogEntry::Escalated {
                ticket_id,
                reason,
                question,
            } => write!(
                f,
                "[{}] [TICKET] #{} ({}) {}",
                timestamp,
                ticket_id,
                reason,
                shorten(question)
            ),
            LogEntry::Feedback {
                message_id,
                helpful,
                duplicate,
            } => write!(
                f,
                "[{}] [FEEDBACK] {} {}{}",
                timestamp,
                message_id,
                if *helpful { "helpful" } else { "unhelpful" },
                if *duplicate { " (duplicate)" } else { "" }
            ),
            LogEntry::WebSocket { event, client_id } => {
                write!(f, "[{}] [WS] {} {}", timestamp, event, client_id)
            }
            LogEntry::Trace {
                level,
                target,
                message,
            } => write!(f, "[{}] [{}] {}: {}", timestamp, level, target, message),
        }
    }
}

static GLOBAL_LOG_TX: OnceLock<broadcast::Sender<LogEntry>> = OnceLock::new();

/// Broadcast an entry on the process-wide operator stream, if one is installed.
pub fn emit_global_log(entry: LogEntry) {
    if let Some(tx) = GLOBAL_LOG_TX.get() {
        let _ = tx.send(entry);
    }
}

/// Shared application state
pub struct AppState {
    pub orchestrator: ChatOrchestrator,
    pub feedback: FeedbackHandler,
    /// Log broadcast channel
    log_tx: broadcast::Sender<LogEntry>,
}

impl AppState {
    pub fn new(orchestrator: ChatOrchestrator, feedback: FeedbackHandler) -> Self {
        let (log_tx, _) = broadcast::channel(100);
        Self {
            orchestrator,
            feedback,
            log_tx,
        }
    }

    /// Route tracing events forwarded by the log bridge into this state's channel.
    pub fn install_global_log(&self) {
        let _ = GLOBAL_LOG_TX.set(self.log_tx.clone());
    }

    pub fn db(&self) -> &HelpdeskDbPool {
        self.orchestrator.db()
    }

    /// Get a receiver for log entries
    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogEntry> {
        self.log_tx.subscribe()
    }

    /// Broadcast a log entry
    pub fn log(&self, entry: LogEntry) {
        let _ = self.log_tx.send(entry);
    }
}
