use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use balloonbot_core::config::TelegramConfig;
use balloonbot_core::membership::{MembershipError, MembershipOracle};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::api::{
    ApiResponse, BotIdentity, ChatMember, GetChatMemberRequest, GetUpdatesRequest,
    SendMessageRequest, Update,
};
use crate::events::TelegramEnvelope;
use crate::keyboard::OutgoingMessage;
use crate::polling::{TransportError, UpdateTransport};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram api error {code}: {description}")]
    Api { code: i32, description: String, retry_after: Option<u64> },
    #[error("telegram api answered ok without a result")]
    MissingResult,
}

/// Bot API client. The token only ever appears in request paths and is
/// stripped from transport errors.
pub struct TelegramBotClient {
    http: Client,
    base_url: String,
    token: SecretString,
    required_channel: String,
    poll_timeout_secs: u64,
    next_offset: AtomicI64,
}

impl TelegramBotClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|error| ApiError::Http(error.without_url()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            token: config.bot_token.clone(),
            required_channel: config.required_channel.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
            next_offset: AtomicI64::new(0),
        })
    }

    pub async fn call<P, R>(&self, method: &str, payload: &P) -> Result<R, ApiError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token.expose_secret());
        debug!(event_name = "egress.telegram.api_call", method, "calling telegram api");

        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|error| ApiError::Http(error.without_url()))?;
        let body: ApiResponse<R> =
            response.json().await.map_err(|error| ApiError::Http(error.without_url()))?;

        if !body.ok {
            return Err(ApiError::Api {
                code: body.error_code.unwrap_or_default(),
                description: body.description.unwrap_or_else(|| "unknown error".to_owned()),
                retry_after: body.parameters.and_then(|parameters| parameters.retry_after),
            });
        }
        body.result.ok_or(ApiError::MissingResult)
    }

    pub async fn get_me(&self) -> Result<BotIdentity, ApiError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-polls for updates after the last acknowledged one.
    pub async fn get_updates(&self) -> Result<Vec<Update>, ApiError> {
        let offset = self.next_offset.load(Ordering::SeqCst);
        let request = GetUpdatesRequest {
            offset: (offset > 0).then_some(offset),
            timeout: self.poll_timeout_secs,
            allowed_updates: vec!["message".to_owned()],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;

        if let Some(last) = updates.iter().map(|update| update.update_id).max() {
            self.next_offset.fetch_max(last + 1, Ordering::SeqCst);
        }
        Ok(updates)
    }

    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<(), ApiError> {
        let _sent: Value = self.call("sendMessage", request).await?;
        Ok(())
    }

    pub async fn chat_member(&self, user_id: i64) -> Result<ChatMember, ApiError> {
        let request = GetChatMemberRequest { chat_id: self.required_channel.clone(), user_id };
        self.call("getChatMember", &request).await
    }
}

#[async_trait]
impl UpdateTransport for TelegramBotClient {
    async fn next_updates(&self) -> Result<Option<Vec<TelegramEnvelope>>, TransportError> {
        let updates = self
            .get_updates()
            .await
            .map_err(|error| transport_error(error, TransportError::Receive))?;
        Ok(Some(updates.into_iter().map(TelegramEnvelope::from_update).collect()))
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.send_message(&message.to_request())
            .await
            .map_err(|error| transport_error(error, TransportError::Send))
    }
}

/// Flood-control answers keep their `retry_after` so the runner can wait it out.
fn transport_error(error: ApiError, other: fn(String) -> TransportError) -> TransportError {
    match error {
        ApiError::Api { retry_after: Some(retry_after_secs), description, .. } => {
            TransportError::Throttled { retry_after_secs, description }
        }
        error => other(error.to_string()),
    }
}

#[async_trait]
impl MembershipOracle for TelegramBotClient {
    async fn is_member(&self, user_id: i64) -> Result<bool, MembershipError> {
        self.chat_member(user_id)
            .await
            .map(|member| member.is_subscribed())
            .map_err(|error| MembershipError(error.to_string()))
    }
}
