use courtside_core::audit::{AuditEvent, AuditOutcome, AuditSink};
use tracing::{info, warn};

/// Writes every audit event to the log stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let conversation_id =
            event.conversation_id.as_ref().map(|id| id.as_str()).unwrap_or("unknown");
        let metadata = event
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",");

        match event.outcome {
            AuditOutcome::Success => info!(
                event_name = %event.event_type,
                audit_event_id = %event.event_id,
                correlation_id = %event.correlation_id,
                conversation_id,
                category = ?event.category,
                actor = %event.actor,
                metadata = %metadata,
                "audit event"
            ),
            AuditOutcome::Rejected | AuditOutcome::Failed => warn!(
                event_name = %event.event_type,
                audit_event_id = %event.event_id,
                correlation_id = %event.correlation_id,
                conversation_id,
                category = ?event.category,
                actor = %event.actor,
                outcome = ?event.outcome,
                metadata = %metadata,
                "audit event"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use courtside_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
    use courtside_core::domain::conversation::ConversationId;

    use super::TracingAuditSink;

    #[test]
    fn emits_without_a_subscriber_installed() {
        let sink = TracingAuditSink;
        sink.emit(
            AuditEvent::new(
                Some(ConversationId::new("chat-1")),
                "corr-1",
                "dialog.transition_rejected",
                AuditCategory::Dialog,
                "dialog-runtime",
                AuditOutcome::Rejected,
            )
            .with_metadata("from", "Idle"),
        );
        sink.emit(AuditEvent::new(
            None,
            "corr-2",
            "dialog.transition_applied",
            AuditCategory::Dialog,
            "dialog-runtime",
            AuditOutcome::Success,
        ));
    }
}
