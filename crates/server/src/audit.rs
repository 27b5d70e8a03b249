use balloonbot_core::audit::{AuditEvent, AuditOutcome, AuditSink};
use tracing::{info, warn};

/// Writes audit events to the process log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let conversation =
            event.conversation.map(|key| key.to_string()).unwrap_or_else(|| "unknown".to_owned());
        let session_id =
            event.session_id.map(|id| id.to_string()).unwrap_or_else(|| "none".to_owned());

        match event.outcome {
            AuditOutcome::Failed => warn!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                conversation = %conversation,
                session_id = %session_id,
                category = ?event.category,
                metadata = ?event.metadata,
                "audit event"
            ),
            AuditOutcome::Success | AuditOutcome::Rejected => info!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                conversation = %conversation,
                session_id = %session_id,
                category = ?event.category,
                outcome = ?event.outcome,
                metadata = ?event.metadata,
                "audit event"
            ),
        }
    }
}
