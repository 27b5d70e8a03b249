use std::sync::Arc;

use balloonbot_core::config::{AppConfig, ConfigError};
use balloonbot_core::flows::{ConversationEngine, ConversationService};
use balloonbot_core::pricing::StandardCalculator;
use balloonbot_core::session::SessionStore;
use balloonbot_telegram::api::BotIdentity;
use balloonbot_telegram::client::{ApiError, TelegramBotClient};
use balloonbot_telegram::events::conversation_dispatcher;
use balloonbot_telegram::polling::{PollingRunner, ReconnectPolicy};
use thiserror::Error;
use tracing::info;

use crate::audit::TracingAuditSink;

pub struct Application {
    pub config: AppConfig,
    pub bot: BotIdentity,
    pub sessions: SessionStore,
    pub runner: PollingRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("telegram client setup failed: {0}")]
    Client(#[source] ApiError),
    #[error("telegram rejected the bot token or is unreachable: {0}")]
    Identity(#[source] ApiError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        required_channel = %config.telegram.required_channel,
        "starting application bootstrap"
    );

    let client =
        Arc::new(TelegramBotClient::new(&config.telegram).map_err(BootstrapError::Client)?);
    let bot = client.get_me().await.map_err(BootstrapError::Identity)?;
    info!(
        event_name = "system.bootstrap.bot_identified",
        correlation_id = "bootstrap",
        bot_id = bot.id,
        bot_username = bot.username.as_deref().unwrap_or("unknown"),
        "telegram bot token accepted"
    );

    let sessions = SessionStore::new();
    let engine = ConversationEngine::new(
        StandardCalculator::default(),
        config.telegram.required_channel.clone(),
    );
    let service = Arc::new(ConversationService::new(
        engine,
        client.clone(),
        sessions.clone(),
        Arc::new(TracingAuditSink),
    ));
    let runner =
        PollingRunner::new(client, conversation_dispatcher(service), ReconnectPolicy::default());

    Ok(Application { config, bot, sessions, runner })
}
