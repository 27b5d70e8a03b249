//! Telegram Integration - long-polling bot interface
//!
//! This crate connects the balloon conversation to the Telegram Bot API:
//! - **Wire types** (`api`) - `getUpdates`, `sendMessage`, `getChatMember` payloads
//! - **Events** (`events`) - `/start` and free text routed to the conversation service
//! - **Keyboards** (`keyboard`) - reply keyboards built from conversation replies
//! - **Polling** (`polling`) - update loop with backoff on transport failures
//! - **Client** (`client`) - `reqwest` implementation of the transport and the
//!   channel membership check
//!
//! # Getting Started
//!
//! 1. Create a bot with @BotFather and copy its token
//! 2. Add the bot as an administrator of the gating channel so that
//!    `getChatMember` can see subscribers
//! 3. Set `TELEGRAM_BOT_TOKEN` (a `.env` file works too)
//!
//! # Architecture
//!
//! ```text
//! getUpdates → PollingRunner → EventDispatcher → ConversationService → pricing
//!                   ↓
//!             sendMessage ← OutgoingMessage ← Reply
//! ```

pub mod api;
pub mod client;
pub mod events;
pub mod keyboard;
pub mod polling;
