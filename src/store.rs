//! Reminder store adapter
//!
//! Typed read/write operations against the reminder collection, behind a
//! trait so the scheduler can be exercised with an in-memory fake. All
//! queries are conjunctive equality filters; the state-flipping writes put
//! their precondition in the update filter so a lost race shows up as
//! matched_count 0 instead of a duplicate transition.

use async_trait::async_trait;
use bson::doc;

use crate::db::schemas::{Priority, ReminderDoc, Repeat, REMINDER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::Result;

/// Partial update of the UI-mutable fields of a reminder
#[derive(Debug, Clone, Default)]
pub struct ReminderPatch {
    pub text: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub priority: Option<Priority>,
    pub repeat: Option<Repeat>,
    pub custom_weekdays: Option<Vec<u8>>,
    pub re_remind_interval_minutes: Option<i64>,
    pub done: Option<bool>,
    /// Set by the CRUD layer when date/time change, so the reminder can
    /// fire again at its new instant
    pub sent: Option<bool>,
}

impl ReminderPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.priority.is_none()
            && self.repeat.is_none()
            && self.custom_weekdays.is_none()
            && self.re_remind_interval_minutes.is_none()
            && self.done.is_none()
            && self.sent.is_none()
    }
}

/// Store operations the scheduler and CRUD surface depend on
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Undelivered reminders due at exactly (date, time)
    async fn find_due(&self, date: &str, time: &str) -> Result<Vec<ReminderDoc>>;

    /// All fire-until-acknowledged reminders that were sent but never
    /// confirmed, regardless of original due time
    async fn find_awaiting_confirmation(&self) -> Result<Vec<ReminderDoc>>;

    /// Undone reminders for one user, ordered by date then time
    async fn find_for_user(&self, user_id: i64) -> Result<Vec<ReminderDoc>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ReminderDoc>>;

    async fn insert(&self, reminder: ReminderDoc) -> Result<()>;

    /// Apply a partial update; false if no reminder matched the id
    async fn apply_patch(&self, id: &str, patch: ReminderPatch) -> Result<bool>;

    /// Record a completed initial delivery. Conditional on `sent` still
    /// being false and `done` still false; false means a concurrent
    /// dispatch won the race or the reminder reached a terminal state.
    async fn mark_sent(&self, id: &str, now_ms: i64) -> Result<bool>;

    /// Record a completed re-notification (advances last_sent_at only)
    async fn touch_last_sent(&self, id: &str, now_ms: i64) -> Result<bool>;

    /// Confirmation is itself a completion: sets confirmed and done.
    /// False if the id no longer exists (already deleted) - not an error.
    async fn confirm(&self, id: &str) -> Result<bool>;

    /// Remove the record entirely; false if it was already gone
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// MongoDB-backed reminder store
#[derive(Clone)]
pub struct MongoReminderStore {
    collection: MongoCollection<ReminderDoc>,
}

impl MongoReminderStore {
    /// Open the reminders collection (creating indexes on first use)
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<ReminderDoc>(REMINDER_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl ReminderStore for MongoReminderStore {
    async fn find_due(&self, date: &str, time: &str) -> Result<Vec<ReminderDoc>> {
        self.collection
            .find_many(
                doc! { "date": date, "time": time, "done": false, "sent": false },
                None,
            )
            .await
    }

    async fn find_awaiting_confirmation(&self) -> Result<Vec<ReminderDoc>> {
        self.collection
            .find_many(
                doc! {
                    "confirm_required": true,
                    "confirmed": false,
                    "done": false,
                    "sent": true,
                },
                None,
            )
            .await
    }

    async fn find_for_user(&self, user_id: i64) -> Result<Vec<ReminderDoc>> {
        self.collection
            .find_many(
                doc! { "user_id": user_id, "done": false },
                Some(doc! { "date": 1, "time": 1 }),
            )
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ReminderDoc>> {
        self.collection.find_one(doc! { "id": id }).await
    }

    async fn insert(&self, reminder: ReminderDoc) -> Result<()> {
        self.collection.insert_one(reminder).await
    }

    async fn apply_patch(&self, id: &str, patch: ReminderPatch) -> Result<bool> {
        let mut set = doc! {};
        if let Some(text) = patch.text {
            set.insert("text", text);
        }
        if let Some(date) = patch.date {
            set.insert("date", date);
        }
        if let Some(time) = patch.time {
            set.insert("time", time);
        }
        if let Some(priority) = patch.priority {
            set.insert("priority", bson::ser::to_bson(&priority)?);
        }
        if let Some(repeat) = patch.repeat {
            set.insert("repeat_type", bson::ser::to_bson(&repeat)?);
        }
        if let Some(weekdays) = patch.custom_weekdays {
            let weekdays: Vec<i32> = weekdays.into_iter().map(i32::from).collect();
            set.insert("custom_weekdays", weekdays);
        }
        if let Some(interval) = patch.re_remind_interval_minutes {
            set.insert("re_remind_interval_minutes", interval);
        }
        if let Some(done) = patch.done {
            set.insert("done", done);
        }
        if let Some(sent) = patch.sent {
            set.insert("sent", sent);
        }

        if set.is_empty() {
            return Ok(self.find_by_id(id).await?.is_some());
        }

        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn mark_sent(&self, id: &str, now_ms: i64) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "sent": false, "done": false },
                doc! { "$set": { "sent": true, "last_sent_at": now_ms } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn touch_last_sent(&self, id: &str, now_ms: i64) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "done": false },
                doc! { "$set": { "last_sent_at": now_ms } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn confirm(&self, id: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "confirmed": true, "done": true } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
