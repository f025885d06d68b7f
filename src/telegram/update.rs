//! Inbound Telegram update payloads
//!
//! Only the slice of the Update object the webhook cares about: callback
//! queries from inline buttons. Everything else deserializes to None and is
//! acknowledged without processing.

use serde::Deserialize;

use crate::types::Result;

/// A Telegram webhook update (callback queries only)
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: Option<i64>,
    pub callback_query: Option<CallbackQuery>,
}

/// An inline-button press
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub data: Option<String>,
    pub message: Option<CallbackMessage>,
}

/// The message the pressed button was attached to
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackMessage {
    pub message_id: i64,
    pub chat: Chat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Parsed button action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Confirm,
    Delete,
}

/// A fully resolved button-press event, ready for the ack handler
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    pub callback_id: String,
    pub action: CallbackAction,
    pub reminder_id: String,
    pub chat_id: i64,
    pub message_id: i64,
}

/// Parse `"<action>_<reminderId>"` callback data. The split takes the first
/// underscore-delimited segment as the action and the remainder as the id,
/// so reminder ids may themselves contain underscores.
pub fn parse_callback_data(data: &str) -> Option<(CallbackAction, &str)> {
    let (action, reminder_id) = data.split_once('_')?;
    if reminder_id.is_empty() {
        return None;
    }

    let action = match action {
        "confirm" => CallbackAction::Confirm,
        "delete" => CallbackAction::Delete,
        _ => return None,
    };

    Some((action, reminder_id))
}

impl CallbackQuery {
    /// Resolve this query into an event, or the callback id to answer with
    /// an error when the payload is malformed or unrecognized
    pub fn into_event(self) -> std::result::Result<CallbackEvent, String> {
        let callback_id = self.id;

        let message = match self.message {
            Some(m) => m,
            None => return Err(callback_id),
        };

        let data = self.data.unwrap_or_default();
        match parse_callback_data(&data) {
            Some((action, reminder_id)) => Ok(CallbackEvent {
                callback_id,
                action,
                reminder_id: reminder_id.to_string(),
                chat_id: message.chat.id,
                message_id: message.message_id,
            }),
            None => Err(callback_id),
        }
    }
}

/// Deserialize a raw webhook body
pub fn parse_update(body: &[u8]) -> Result<Update> {
    Ok(serde_json::from_slice(body)?)
}
