use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use crate::state::{LogEntry, emit_global_log};

/// Forwards tracing events to the operator log stream.
pub struct GatewayLogBridge;

impl<S> Layer<S> for GatewayLogBridge
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // Exchange outcomes are broadcast separately as structured
        // `ChatAnswered` / `Escalated` / `Feedback` entries.
        if visitor.event_kind.as_deref() == Some(EXCHANGE_EVENT_KIND) {
            return;
        }

        let metadata = event.metadata();
        emit_global_log(LogEntry::Trace {
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message: visitor.message,
        });
    }
}

/// `event_kind` value of tracing events that describe an exchange outcome
pub const EXCHANGE_EVENT_KIND: &str = "exchange";

#[derive(Default)]
struct MessageVisitor {
    message: String,
    event_kind: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value).trim_matches('"').to_string();
        }
        if field.name() == "event_kind" {
            self.event_kind = Some(format!("{:?}", value).trim_matches('"').to_string());
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
        if field.name() == "event_kind" {
            self.event_kind = Some(value.to_string());
        }
    }
}
