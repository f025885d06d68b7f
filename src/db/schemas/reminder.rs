//! Reminder document schema
//!
//! The central entity: one record per scheduled reminder. The scheduler
//! flips `sent`/`done`/`confirmed` and stamps `last_sent_at`; everything
//! else is written by the CRUD surface.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for reminders
pub const REMINDER_COLLECTION: &str = "reminders";

/// Default spacing between re-notifications, in minutes
pub const DEFAULT_RE_REMIND_INTERVAL_MINUTES: i64 = 5;

/// Ordering priority, consumed by the mini-app UI only
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Recurrence rule. Stored and served for the UI; the scheduler operates on
/// single fire instants and never expands these.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

/// Reminder document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ReminderDoc {
    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Opaque unique identifier, assigned at creation, immutable
    pub id: String,

    /// User-supplied message body
    pub text: String,

    /// Due date in the storage time base, "YYYY-MM-DD"
    pub date: String,

    /// Due time-of-day at minute resolution, "HH:MM"
    pub time: String,

    /// Telegram chat id of the recipient; immutable after creation
    pub user_id: i64,

    /// Terminal flag: no further processing once true
    #[serde(default)]
    pub done: bool,

    /// True once the initial delivery completed; gates duplicate sends
    #[serde(default)]
    pub sent: bool,

    /// Delivery mode, fixed at creation: true means fire-until-acknowledged
    #[serde(default)]
    pub confirm_required: bool,

    /// Spacing between re-notifications when confirm_required is set
    #[serde(default = "default_re_remind_interval")]
    pub re_remind_interval_minutes: i64,

    /// True once the user pressed the confirm button
    #[serde(default)]
    pub confirmed: bool,

    /// Epoch milliseconds of the most recent delivery attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sent_at: Option<i64>,

    /// UI ordering priority
    #[serde(default)]
    pub priority: Priority,

    /// UI recurrence rule (never expanded by the scheduler)
    #[serde(default, rename = "repeat_type")]
    pub repeat: Repeat,

    /// Weekdays 0-6 (0 = Sunday) for Repeat::Custom
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_weekdays: Option<Vec<u8>>,
}

fn default_re_remind_interval() -> i64 {
    DEFAULT_RE_REMIND_INTERVAL_MINUTES
}

impl ReminderDoc {
    /// Create a new undelivered reminder
    pub fn new(id: String, text: String, date: String, time: String, user_id: i64) -> Self {
        Self {
            metadata: Metadata::new(),
            id,
            text,
            date,
            time,
            user_id,
            done: false,
            sent: false,
            confirm_required: false,
            re_remind_interval_minutes: DEFAULT_RE_REMIND_INTERVAL_MINUTES,
            confirmed: false,
            last_sent_at: None,
            priority: Priority::default(),
            repeat: Repeat::default(),
            custom_weekdays: None,
        }
    }

    /// Re-notification interval in milliseconds
    pub fn re_remind_interval_ms(&self) -> i64 {
        self.re_remind_interval_minutes.max(0) * 60_000
    }
}

impl IntoIndexes for ReminderDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on the external id
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("id_unique".to_string())
                        .build(),
                ),
            ),
            // Due-set query: exact (date, time) plus the two gating flags
            (
                doc! { "date": 1, "time": 1, "done": 1, "sent": 1 },
                Some(
                    IndexOptions::builder()
                        .name("due_lookup_index".to_string())
                        .build(),
                ),
            ),
            // Re-notification scan over outstanding confirmations
            (
                doc! { "confirm_required": 1, "confirmed": 1, "done": 1, "sent": 1 },
                Some(
                    IndexOptions::builder()
                        .name("awaiting_confirmation_index".to_string())
                        .build(),
                ),
            ),
            // Per-user listing
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ReminderDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
