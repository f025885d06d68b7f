//! Acknowledgment and cancellation handling
//!
//! Maps one inbound button-press event to its store mutation and channel
//! feedback. The handler owns no state of its own: the reminder's flags are
//! the whole state machine. Store operations against a vanished id are
//! no-ops, and the triggering callback is always answered, so repeated
//! events are harmless.

use tracing::{info, warn};

use crate::store::ReminderStore;
use crate::telegram::render;
use crate::telegram::update::{CallbackAction, CallbackEvent};
use crate::telegram::NotifyChannel;
use crate::types::Result;

/// What the handler did with the event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Confirmed,
    Deleted,
    /// The id no longer existed; the event was still acknowledged
    AlreadyGone,
}

/// Answer a malformed or unrecognized event with an error indication.
/// No state changes.
pub async fn reject_event(channel: &dyn NotifyChannel, callback_id: &str) {
    if let Err(e) = channel.answer_callback(callback_id, "❌ Error").await {
        warn!(callback_id = callback_id, error = %e, "Failed to answer malformed callback");
    }
}

/// Process one resolved button-press event
pub async fn handle_event(
    store: &dyn ReminderStore,
    channel: &dyn NotifyChannel,
    event: &CallbackEvent,
) -> Result<AckOutcome> {
    match event.action {
        CallbackAction::Confirm => handle_confirm(store, channel, event).await,
        CallbackAction::Delete => handle_delete(store, channel, event).await,
    }
}

async fn handle_confirm(
    store: &dyn ReminderStore,
    channel: &dyn NotifyChannel,
    event: &CallbackEvent,
) -> Result<AckOutcome> {
    let applied = store.confirm(&event.reminder_id).await?;

    channel
        .answer_callback(&event.callback_id, "✅ Confirmed!")
        .await?;

    // Swap the confirm button for a delete button so the user can clean up
    if let Err(e) = channel
        .edit_message(
            event.chat_id,
            event.message_id,
            render::confirmed_text(),
            Some(render::confirmed_keyboard(&event.reminder_id)),
        )
        .await
    {
        warn!(reminder_id = %event.reminder_id, error = %e, "Failed to edit confirmed message");
    }

    if applied {
        info!(reminder_id = %event.reminder_id, "Reminder confirmed");
        Ok(AckOutcome::Confirmed)
    } else {
        Ok(AckOutcome::AlreadyGone)
    }
}

async fn handle_delete(
    store: &dyn ReminderStore,
    channel: &dyn NotifyChannel,
    event: &CallbackEvent,
) -> Result<AckOutcome> {
    let removed = store.delete(&event.reminder_id).await?;

    channel
        .answer_callback(&event.callback_id, "🗑️ Deleted!")
        .await?;

    // Remove the displayed message; Telegram refuses deletion of old
    // messages, in which case the message is edited into a tombstone
    let message_deleted = channel
        .delete_message(event.chat_id, event.message_id)
        .await
        .unwrap_or(false);
    if !message_deleted {
        if let Err(e) = channel
            .edit_message(event.chat_id, event.message_id, render::deleted_text(), None)
            .await
        {
            warn!(reminder_id = %event.reminder_id, error = %e, "Failed to edit deleted message");
        }
    }

    if removed {
        info!(reminder_id = %event.reminder_id, "Reminder deleted");
        Ok(AckOutcome::Deleted)
    } else {
        Ok(AckOutcome::AlreadyGone)
    }
}
