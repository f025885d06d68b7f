//! Telegram channel adapter
//!
//! Outbound Bot API client, message rendering, and inbound webhook payloads.

pub mod client;
pub mod render;
pub mod update;

pub use client::{InlineButton, InlineKeyboard, NotifyChannel, TelegramClient};
pub use render::MessageStyle;
pub use update::{CallbackAction, CallbackEvent, CallbackQuery, Update};
