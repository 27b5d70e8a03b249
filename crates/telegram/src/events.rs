use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use balloonbot_core::flows::ConversationService;
use balloonbot_core::pricing::HeliumCalculator;
use balloonbot_core::session::ConversationKey;
use thiserror::Error;

use crate::api::Update;
use crate::keyboard::OutgoingMessage;

pub const START_COMMAND: &str = "start";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelegramEnvelope {
    pub update_id: i64,
    pub event: TelegramEvent,
}

impl TelegramEnvelope {
    pub fn from_update(update: Update) -> Self {
        let update_id = update.update_id;
        let kind = update.kind().to_owned();

        let event = match update.message {
            Some(message) => {
                let chat_id = message.chat.id;
                let user_id = message.from.map(|user| user.id);
                match message.text {
                    Some(text) => match parse_command(&text) {
                        Some((command, args)) => {
                            TelegramEvent::Command(CommandEvent { chat_id, user_id, command, args })
                        }
                        None => TelegramEvent::TextMessage(TextMessageEvent {
                            chat_id,
                            user_id,
                            text,
                        }),
                    },
                    None => TelegramEvent::Unsupported { kind: "non_text_message".to_owned() },
                }
            }
            None => TelegramEvent::Unsupported { kind },
        };

        Self { update_id, event }
    }

    pub fn correlation_id(&self) -> String {
        format!("update-{}", self.update_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelegramEvent {
    Command(CommandEvent),
    TextMessage(TextMessageEvent),
    Unsupported { kind: String },
}

impl TelegramEvent {
    pub fn event_type(&self) -> TelegramEventType {
        match self {
            Self::Command(_) => TelegramEventType::Command,
            Self::TextMessage(_) => TelegramEventType::TextMessage,
            Self::Unsupported { .. } => TelegramEventType::Unsupported,
        }
    }

    pub fn chat_id(&self) -> Option<i64> {
        match self {
            Self::Command(event) => Some(event.chat_id),
            Self::TextMessage(event) => Some(event.chat_id),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TelegramEventType {
    Command,
    TextMessage,
    Unsupported,
}

/// `/name@bot args`, with `name` lowercased and the bot mention dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEvent {
    pub chat_id: i64,
    pub user_id: Option<i64>,
    pub command: String,
    pub args: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMessageEvent {
    pub chat_id: i64,
    pub user_id: Option<i64>,
    pub text: String,
}

fn parse_command(text: &str) -> Option<(String, String)> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args.to_owned()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(OutgoingMessage),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("message in chat {chat_id} has no sender")]
    MissingSender { chat_id: i64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> TelegramEventType;
    async fn handle(
        &self,
        envelope: &TelegramEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<TelegramEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &TelegramEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn conversation_dispatcher<C>(service: Arc<ConversationService<C>>) -> EventDispatcher
where
    C: HeliumCalculator + 'static,
{
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(StartCommandHandler::new(service.clone()));
    dispatcher.register(TextMessageHandler::new(service));
    dispatcher
}

pub struct StartCommandHandler<C> {
    service: Arc<ConversationService<C>>,
}

impl<C> StartCommandHandler<C>
where
    C: HeliumCalculator,
{
    pub fn new(service: Arc<ConversationService<C>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<C> EventHandler for StartCommandHandler<C>
where
    C: HeliumCalculator + 'static,
{
    fn event_type(&self) -> TelegramEventType {
        TelegramEventType::Command
    }

    async fn handle(
        &self,
        envelope: &TelegramEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let TelegramEvent::Command(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if event.command != START_COMMAND {
            return Ok(HandlerResult::Ignored);
        }

        let user_id =
            event.user_id.ok_or(EventHandlerError::MissingSender { chat_id: event.chat_id })?;
        let key = ConversationKey::new(event.chat_id, user_id);
        let reply = self.service.start(key, &ctx.correlation_id).await;
        Ok(HandlerResult::Responded(OutgoingMessage::from_reply(event.chat_id, &reply)))
    }
}

pub struct TextMessageHandler<C> {
    service: Arc<ConversationService<C>>,
}

impl<C> TextMessageHandler<C>
where
    C: HeliumCalculator,
{
    pub fn new(service: Arc<ConversationService<C>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<C> EventHandler for TextMessageHandler<C>
where
    C: HeliumCalculator + 'static,
{
    fn event_type(&self) -> TelegramEventType {
        TelegramEventType::TextMessage
    }

    async fn handle(
        &self,
        envelope: &TelegramEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let TelegramEvent::TextMessage(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let user_id =
            event.user_id.ok_or(EventHandlerError::MissingSender { chat_id: event.chat_id })?;
        let key = ConversationKey::new(event.chat_id, user_id);
        let reply = self.service.handle_text(key, &event.text, &ctx.correlation_id);
        Ok(match reply {
            Some(reply) => {
                HandlerResult::Responded(OutgoingMessage::from_reply(event.chat_id, &reply))
            }
            None => HandlerResult::Processed,
        })
    }
}
