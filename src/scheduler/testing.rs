//! In-memory fakes for scheduler tests
//!
//! `MemoryStore` mirrors the Mongo store's filter semantics (including the
//! conditional preconditions on the state-flipping writes); the channel
//! records outgoing traffic and can fail sends per chat id.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::db::schemas::ReminderDoc;
use crate::store::{ReminderPatch, ReminderStore};
use crate::telegram::{InlineKeyboard, NotifyChannel};
use crate::types::{ChimeError, Result};

#[derive(Default)]
pub struct MemoryStore {
    reminders: Mutex<Vec<ReminderDoc>>,
    fail_queries: AtomicBool,
}

impl MemoryStore {
    pub async fn seed(&self, reminder: ReminderDoc) {
        self.reminders.lock().await.push(reminder);
    }

    pub async fn get(&self, id: &str) -> Option<ReminderDoc> {
        self.reminders
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Make every query return a database error
    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_queries.load(Ordering::SeqCst) {
            Err(ChimeError::Database("injected query failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn find_due(&self, date: &str, time: &str) -> Result<Vec<ReminderDoc>> {
        self.check_failure()?;
        Ok(self
            .reminders
            .lock()
            .await
            .iter()
            .filter(|r| r.date == date && r.time == time && !r.done && !r.sent)
            .cloned()
            .collect())
    }

    async fn find_awaiting_confirmation(&self) -> Result<Vec<ReminderDoc>> {
        self.check_failure()?;
        Ok(self
            .reminders
            .lock()
            .await
            .iter()
            .filter(|r| r.confirm_required && !r.confirmed && !r.done && r.sent)
            .cloned()
            .collect())
    }

    async fn find_for_user(&self, user_id: i64) -> Result<Vec<ReminderDoc>> {
        self.check_failure()?;
        let mut rows: Vec<ReminderDoc> = self
            .reminders
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == user_id && !r.done)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ReminderDoc>> {
        Ok(self.get(id).await)
    }

    async fn insert(&self, reminder: ReminderDoc) -> Result<()> {
        self.seed(reminder).await;
        Ok(())
    }

    async fn apply_patch(&self, id: &str, patch: ReminderPatch) -> Result<bool> {
        let mut rows = self.reminders.lock().await;
        let Some(r) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if let Some(text) = patch.text {
            r.text = text;
        }
        if let Some(date) = patch.date {
            r.date = date;
        }
        if let Some(time) = patch.time {
            r.time = time;
        }
        if let Some(priority) = patch.priority {
            r.priority = priority;
        }
        if let Some(repeat) = patch.repeat {
            r.repeat = repeat;
        }
        if let Some(weekdays) = patch.custom_weekdays {
            r.custom_weekdays = Some(weekdays);
        }
        if let Some(interval) = patch.re_remind_interval_minutes {
            r.re_remind_interval_minutes = interval;
        }
        if let Some(done) = patch.done {
            r.done = done;
        }
        if let Some(sent) = patch.sent {
            r.sent = sent;
        }
        Ok(true)
    }

    async fn mark_sent(&self, id: &str, now_ms: i64) -> Result<bool> {
        let mut rows = self.reminders.lock().await;
        let Some(r) = rows.iter_mut().find(|r| r.id == id && !r.sent && !r.done) else {
            return Ok(false);
        };
        r.sent = true;
        r.last_sent_at = Some(now_ms);
        Ok(true)
    }

    async fn touch_last_sent(&self, id: &str, now_ms: i64) -> Result<bool> {
        let mut rows = self.reminders.lock().await;
        let Some(r) = rows.iter_mut().find(|r| r.id == id && !r.done) else {
            return Ok(false);
        };
        r.last_sent_at = Some(now_ms);
        Ok(true)
    }

    async fn confirm(&self, id: &str) -> Result<bool> {
        let mut rows = self.reminders.lock().await;
        let Some(r) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        r.confirmed = true;
        r.done = true;
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut rows = self.reminders.lock().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }
}

/// One recorded outgoing message
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    /// callback_data of the first inline button, if any
    pub callback_data: Option<String>,
}

#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<SentMessage>>,
    deleted: Mutex<Vec<(i64, i64)>>,
    answers: Mutex<Vec<(String, String)>>,
    fail_chats: Mutex<HashSet<i64>>,
    refuse_deletes: AtomicBool,
}

impl RecordingChannel {
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn edited_messages(&self) -> Vec<SentMessage> {
        self.edits.lock().await.clone()
    }

    pub async fn deleted_messages(&self) -> Vec<(i64, i64)> {
        self.deleted.lock().await.clone()
    }

    pub async fn answered_callbacks(&self) -> Vec<(String, String)> {
        self.answers.lock().await.clone()
    }

    /// Fail every send_message to this chat id
    pub async fn fail_sends_to(&self, chat_id: i64) {
        self.fail_chats.lock().await.insert(chat_id);
    }

    pub async fn clear_failures(&self) {
        self.fail_chats.lock().await.clear();
    }

    /// Make delete_message report refusal (forcing the edit fallback)
    pub fn refuse_deletes(&self) {
        self.refuse_deletes.store(true, Ordering::SeqCst);
    }

    fn first_button(keyboard: &Option<InlineKeyboard>) -> Option<String> {
        keyboard
            .as_ref()
            .and_then(|k| k.inline_keyboard.first())
            .and_then(|row| row.first())
            .map(|b| b.callback_data.clone())
    }
}

#[async_trait]
impl NotifyChannel for RecordingChannel {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        if self.fail_chats.lock().await.contains(&chat_id) {
            return Err(ChimeError::Telegram("injected send failure".into()));
        }
        self.sent.lock().await.push(SentMessage {
            chat_id,
            text: text.to_string(),
            callback_data: Self::first_button(&keyboard),
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        _message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        self.edits.lock().await.push(SentMessage {
            chat_id,
            text: text.to_string(),
            callback_data: Self::first_button(&keyboard),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<bool> {
        if self.refuse_deletes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.deleted.lock().await.push((chat_id, message_id));
        Ok(true)
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<()> {
        self.answers
            .lock()
            .await
            .push((callback_id.to_string(), text.to_string()));
        Ok(())
    }
}
