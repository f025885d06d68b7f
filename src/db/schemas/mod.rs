//! Database schemas for Chime
//!
//! Defines the MongoDB document structure for reminder records.

mod metadata;
mod reminder;

pub use metadata::Metadata;
pub use reminder::{
    Priority, ReminderDoc, Repeat, DEFAULT_RE_REMIND_INTERVAL_MINUTES, REMINDER_COLLECTION,
};
