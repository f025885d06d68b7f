//! Telegram Bot API client
//!
//! The outbound notification channel: plain HTTPS calls against
//! api.telegram.org, no bot-framework layer. Each method maps to one Bot
//! API method; failures come back as `ChimeError::Telegram` and are
//! isolated per reminder by the callers.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{ChimeError, Result};

/// One inline button row set attached to an outgoing message
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

/// A single callback button
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    /// A keyboard with one button on one row
    pub fn single(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineButton {
                text: text.into(),
                callback_data: callback_data.into(),
            }]],
        }
    }
}

/// Notification channel operations the dispatcher and webhook depend on
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Send a message to a chat, optionally with inline buttons
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()>;

    /// Edit a previously sent message in place
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()>;

    /// Delete a message; false when Telegram refuses (e.g. too old)
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<bool>;

    /// Acknowledge a callback query with short feedback text
    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<()>;
}

/// reqwest-backed Telegram Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
}

impl TelegramClient {
    /// Create a client for the given bot token
    pub fn new(bot_token: &str) -> Self {
        Self::with_api_base(&format!("https://api.telegram.org/bot{}", bot_token))
    }

    /// Create a client against an explicit API base URL (tests, proxies)
    pub fn with_api_base(api_base: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// POST a Bot API method, surfacing Telegram's `ok: false` as an error
    async fn call(&self, method: &str, body: Value) -> Result<Value> {
        let url = format!("{}/{}", self.api_base, method);

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        let ok = payload.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if !status.is_success() || !ok {
            let description = payload
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("no description");
            return Err(ChimeError::Telegram(format!(
                "{} failed ({}): {}",
                method, status, description
            )));
        }

        debug!(method = method, "Telegram call succeeded");
        Ok(payload)
    }
}

#[async_trait]
impl NotifyChannel for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)?;
        }

        self.call("sendMessage", body).await?;
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)?;
        }

        self.call("editMessageText", body).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<bool> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });

        match self.call("deleteMessage", body).await {
            Ok(_) => Ok(true),
            Err(e) => {
                // Deletion is best-effort; callers fall back to an edit
                warn!(chat_id = chat_id, message_id = message_id, error = %e, "deleteMessage refused");
                Ok(false)
            }
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "callback_query_id": callback_id,
            "text": text,
        });

        self.call("answerCallbackQuery", body).await?;
        Ok(())
    }
}
