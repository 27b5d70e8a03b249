use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::{
    DispatchError, EventContext, EventDispatcher, HandlerResult, TelegramEnvelope,
};
use crate::keyboard::OutgoingMessage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("telegram asked to retry after {retry_after_secs}s: {description}")]
    Throttled { retry_after_secs: u64, description: String },
}

impl TransportError {
    /// Wait requested by the server, if it sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Throttled { retry_after_secs, .. } => {
                Some(Duration::from_secs(*retry_after_secs))
            }
            Self::Receive(_) | Self::Send(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PollingError {
    #[error("update polling failed {attempts} times in a row; last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: TransportError },
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 8, base_delay_ms: 500, max_delay_ms: 30_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Source of updates and sink for replies.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    /// Next batch of updates, possibly empty. `None` means the stream is closed.
    async fn next_updates(&self) -> Result<Option<Vec<TelegramEnvelope>>, TransportError>;
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollingStats {
    pub updates_received: u64,
    pub replies_sent: u64,
    pub failed_updates: u64,
}

pub struct PollingRunner {
    transport: Arc<dyn UpdateTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl PollingRunner {
    pub fn new(
        transport: Arc<dyn UpdateTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    /// Pumps updates until the transport closes. Updates are handled one at a
    /// time in arrival order. Consecutive receive failures back off and give up
    /// after `max_retries`; any successful poll resets the count.
    pub async fn start(&self) -> Result<PollingStats, PollingError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Like [`PollingRunner::start`], but stops polling once `shutdown`
    /// resolves. A batch already received is always handled to the end.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<PollingStats, PollingError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut stats = PollingStats::default();
        let mut failures: u32 = 0;

        info!(event_name = "system.telegram.polling_started", "telegram update polling started");

        loop {
            let polled = tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!(
                        event_name = "system.telegram.polling_stopped",
                        updates_received = stats.updates_received,
                        replies_sent = stats.replies_sent,
                        "telegram update polling stopped on shutdown"
                    );
                    return Ok(stats);
                }
                polled = self.transport.next_updates() => polled,
            };

            let batch = match polled {
                Ok(Some(batch)) => {
                    failures = 0;
                    batch
                }
                Ok(None) => {
                    info!(
                        event_name = "system.telegram.polling_stopped",
                        updates_received = stats.updates_received,
                        replies_sent = stats.replies_sent,
                        "telegram update stream closed"
                    );
                    return Ok(stats);
                }
                Err(error) => {
                    failures += 1;
                    warn!(
                        event_name = "ingress.telegram.poll_failed",
                        attempt = failures,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %error,
                        "telegram update poll failed"
                    );

                    if failures > self.reconnect_policy.max_retries {
                        return Err(PollingError::RetriesExhausted {
                            attempts: failures,
                            last_error: error,
                        });
                    }

                    let delay = self.retry_delay(&error, failures - 1);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
            };

            for envelope in batch {
                stats.updates_received += 1;
                match self.process(&envelope).await {
                    Ok(true) => stats.replies_sent += 1,
                    Ok(false) => {}
                    Err(error) => {
                        stats.failed_updates += 1;
                        warn!(
                            event_name = "ingress.telegram.update_failed",
                            update_id = envelope.update_id,
                            correlation_id = %envelope.correlation_id(),
                            error = %error,
                            "update handling failed; continuing polling loop"
                        );
                    }
                }
            }
        }
    }

    /// Returns whether a reply was delivered.
    async fn process(&self, envelope: &TelegramEnvelope) -> Result<bool, ProcessError> {
        let correlation_id = envelope.correlation_id();
        let chat_id = envelope.event.chat_id().unwrap_or_default();

        info!(
            event_name = "ingress.telegram.update_received",
            update_id = envelope.update_id,
            event_type = ?envelope.event.event_type(),
            correlation_id = %correlation_id,
            chat_id,
            "received telegram update"
        );

        let context = EventContext { correlation_id: correlation_id.clone() };
        let HandlerResult::Responded(message) =
            self.dispatcher.dispatch(envelope, &context).await?
        else {
            debug!(
                event_name = "ingress.telegram.update_handled",
                correlation_id = %correlation_id,
                chat_id,
                "update produced no reply"
            );
            return Ok(false);
        };

        self.send_with_retry(&message, &correlation_id).await?;
        debug!(
            event_name = "egress.telegram.reply_sent",
            correlation_id = %correlation_id,
            chat_id = message.chat_id,
            "reply sent"
        );
        Ok(true)
    }

    /// The session has already moved on when a reply is sent, so a failed
    /// send is retried with the same budget as polling before it is dropped.
    async fn send_with_retry(
        &self,
        message: &OutgoingMessage,
        correlation_id: &str,
    ) -> Result<(), TransportError> {
        let mut failures: u32 = 0;
        loop {
            let error = match self.transport.send(message).await {
                Ok(()) => return Ok(()),
                Err(error) => error,
            };

            failures += 1;
            warn!(
                event_name = "egress.telegram.send_failed",
                correlation_id,
                chat_id = message.chat_id,
                attempt = failures,
                max_retries = self.reconnect_policy.max_retries,
                error = %error,
                "telegram reply send failed"
            );
            if failures > self.reconnect_policy.max_retries {
                return Err(error);
            }

            let delay = self.retry_delay(&error, failures - 1);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    fn retry_delay(&self, error: &TransportError, attempt: u32) -> Duration {
        error.retry_after().unwrap_or_else(|| self.reconnect_policy.backoff(attempt))
    }
}
