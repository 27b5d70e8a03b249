use std::sync::Arc;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::flows::engine::ConversationEngine;
use crate::flows::states::{Reply, ReplyKind, TransitionOutcome};
use crate::membership::MembershipOracle;
use crate::pricing::{HeliumCalculator, StandardCalculator};
use crate::session::{ConversationKey, SessionStore};

const ACTOR: &str = "conversation-service";

/// Runs conversations end to end: gate on `/start`, route text to the current
/// state, keep the session arena in step and report every decision to the
/// audit sink.
pub struct ConversationService<C = StandardCalculator> {
    engine: ConversationEngine<C>,
    oracle: Arc<dyn MembershipOracle>,
    sessions: SessionStore,
    audit: Arc<dyn AuditSink>,
}

impl<C> ConversationService<C>
where
    C: HeliumCalculator,
{
    pub fn new(
        engine: ConversationEngine<C>,
        oracle: Arc<dyn MembershipOracle>,
        sessions: SessionStore,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { engine, oracle, sessions, audit }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles `/start`. Any earlier session of this conversation is dropped
    /// before the membership check, whatever its answer.
    pub async fn start(&self, key: ConversationKey, correlation_id: &str) -> Reply {
        if let Some(previous) = self.sessions.close(&key) {
            let context = AuditContext::new(Some(key), Some(previous.id), correlation_id, ACTOR);
            self.audit.emit(
                AuditEvent::new(
                    &context,
                    "conversation.discarded",
                    AuditCategory::Flow,
                    AuditOutcome::Success,
                )
                .with_metadata("state", previous.state.kind().to_string()),
            );
        }

        let is_member = self.check_membership(key, correlation_id).await;
        let outcome = self.engine.start(is_member);

        match &outcome.to {
            Some(state) => {
                let session = self.sessions.open(key, state.clone());
                let context = AuditContext::new(Some(key), Some(session.id), correlation_id, ACTOR);
                self.audit.emit(
                    AuditEvent::new(
                        &context,
                        "conversation.started",
                        AuditCategory::Flow,
                        AuditOutcome::Success,
                    )
                    .with_metadata("to", outcome.to_kind().to_string()),
                );
            }
            None => {
                let context = AuditContext::new(Some(key), None, correlation_id, ACTOR);
                self.audit.emit(AuditEvent::new(
                    &context,
                    "membership.rejected",
                    AuditCategory::Membership,
                    AuditOutcome::Rejected,
                ));
            }
        }

        outcome.reply
    }

    /// Routes free text to the conversation's current state. Returns `None`
    /// when the conversation has no live session.
    pub fn handle_text(
        &self,
        key: ConversationKey,
        text: &str,
        correlation_id: &str,
    ) -> Option<Reply> {
        let session = self.sessions.get(&key)?;
        let outcome = self.engine.apply(&session.state, text);

        match (&outcome.to, outcome.reply.kind) {
            (Some(next), ReplyKind::Prompt) => {
                self.sessions.advance(&key, session.id, next.clone());
            }
            (Some(_), _) => {}
            (None, _) => {
                self.sessions.finish(&key, session.id);
            }
        }

        let context = AuditContext::new(Some(key), Some(session.id), correlation_id, ACTOR);
        self.audit.emit(transition_event(&context, &outcome));
        Some(outcome.reply)
    }

    async fn check_membership(&self, key: ConversationKey, correlation_id: &str) -> bool {
        match self.oracle.is_member(key.user_id).await {
            Ok(is_member) => is_member,
            Err(error) => {
                let context = AuditContext::new(Some(key), None, correlation_id, ACTOR);
                self.audit.emit(
                    AuditEvent::new(
                        &context,
                        "membership.check_failed",
                        AuditCategory::Membership,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error", error.to_string()),
                );
                false
            }
        }
    }
}

fn transition_event(context: &AuditContext, outcome: &TransitionOutcome) -> AuditEvent {
    use AuditCategory::{Flow, Membership, Pricing};
    use AuditOutcome::{Failed, Rejected, Success};

    let (event_type, category, result) = match outcome.reply.kind {
        ReplyKind::Prompt => ("conversation.transition_applied", Flow, Success),
        ReplyKind::Reprompt(_) => ("conversation.input_rejected", Flow, Rejected),
        ReplyKind::Estimate => ("conversation.completed", Pricing, Success),
        ReplyKind::NoPricingData => ("pricing.no_data", Pricing, Rejected),
        ReplyKind::CalculationFailed => ("pricing.calculation_failed", Pricing, Failed),
        ReplyKind::Rejected => ("membership.rejected", Membership, Rejected),
    };

    let event = AuditEvent::new(context, event_type, category, result)
        .with_metadata("from", outcome.from.to_string())
        .with_metadata("to", outcome.to_kind().to_string());
    match outcome.reply.kind {
        ReplyKind::Reprompt(problem) => event.with_metadata("problem", format!("{problem:?}")),
        _ => event,
    }
}
