//! Due-set resolution and initial dispatch
//!
//! Resolves the tick's two minute buckets against the store, then walks the
//! deduplicated batch sequentially: classify by delivery mode, render, send,
//! and record the outcome. A channel or store failure for one reminder is
//! counted and skipped; the reminder stays eligible for the next window
//! overlap (or the re-notification scan, if it requires confirmation).

use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::db::schemas::ReminderDoc;
use crate::scheduler::window::DueSlot;
use crate::store::ReminderStore;
use crate::telegram::render;
use crate::telegram::{MessageStyle, NotifyChannel};
use crate::types::Result;

/// Initial-dispatch counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchCounts {
    /// Candidates resolved from the window
    pub checked: usize,
    /// Successfully delivered and recorded
    pub sent: usize,
    /// Channel or store failures (reminder left eligible)
    pub failed: usize,
}

/// Query every bucket in the window and union the results, deduplicated by
/// reminder id. A store error here aborts the whole new-dispatch phase; the
/// next tick retries naturally through the same window logic.
pub async fn resolve_due(
    store: &dyn ReminderStore,
    window: &[DueSlot],
) -> Result<Vec<ReminderDoc>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut due = Vec::new();

    for slot in window {
        let batch = store.find_due(&slot.date, &slot.time).await?;
        for reminder in batch {
            if seen.insert(reminder.id.clone()) {
                due.push(reminder);
            }
        }
    }

    Ok(due)
}

/// Delivery mode classification: the style of the initial send
fn initial_style(reminder: &ReminderDoc) -> MessageStyle {
    if reminder.confirm_required {
        MessageStyle::ConfirmInitial
    } else {
        MessageStyle::Plain
    }
}

/// Deliver a batch of newly due reminders and record the outcomes
pub async fn dispatch_batch(
    store: &dyn ReminderStore,
    channel: &dyn NotifyChannel,
    batch: Vec<ReminderDoc>,
    now_ms: i64,
    throttle: Duration,
) -> DispatchCounts {
    let mut counts = DispatchCounts {
        checked: batch.len(),
        ..Default::default()
    };

    for reminder in &batch {
        let style = initial_style(reminder);
        let text = render::render(reminder, style);
        let keyboard = render::keyboard(reminder, style);

        match channel
            .send_message(reminder.user_id, &text, Some(keyboard))
            .await
        {
            Ok(()) => match store.mark_sent(&reminder.id, now_ms).await {
                Ok(true) => {
                    counts.sent += 1;
                    info!(
                        reminder_id = %reminder.id,
                        user_id = reminder.user_id,
                        confirm_required = reminder.confirm_required,
                        "Reminder dispatched"
                    );
                }
                Ok(false) => {
                    // A concurrent tick recorded the send first; the message
                    // went out, so this is not a failure
                    counts.sent += 1;
                    debug!(reminder_id = %reminder.id, "mark_sent matched nothing (concurrent dispatch)");
                }
                Err(e) => {
                    counts.failed += 1;
                    warn!(reminder_id = %reminder.id, error = %e, "Failed to record dispatch");
                }
            },
            Err(e) => {
                counts.failed += 1;
                warn!(
                    reminder_id = %reminder.id,
                    user_id = reminder.user_id,
                    error = %e,
                    "Failed to send reminder"
                );
            }
        }

        // Throttle against the channel rate limit
        if !throttle.is_zero() {
            tokio::time::sleep(throttle).await;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{MemoryStore, RecordingChannel};

    fn slot(date: &str, time: &str) -> DueSlot {
        DueSlot {
            date: date.into(),
            time: time.into(),
        }
    }

    fn due_reminder(id: &str, date: &str, time: &str) -> ReminderDoc {
        ReminderDoc::new(id.into(), format!("text {id}"), date.into(), time.into(), 100)
    }

    #[tokio::test]
    async fn resolve_unions_and_dedups_across_buckets() {
        let store = MemoryStore::default();
        store.seed(due_reminder("a", "2025-06-01", "09:30")).await;
        store.seed(due_reminder("b", "2025-06-01", "09:29")).await;
        // Malformed twin sharing an id across both buckets
        store.seed(due_reminder("a", "2025-06-01", "09:29")).await;

        let window = [slot("2025-06-01", "09:30"), slot("2025-06-01", "09:29")];
        let due = resolve_due(&store, &window).await.unwrap();

        let ids: Vec<&str> = due.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn resolve_skips_sent_and_done() {
        let store = MemoryStore::default();
        let mut sent = due_reminder("a", "2025-06-01", "09:30");
        sent.sent = true;
        let mut done = due_reminder("b", "2025-06-01", "09:30");
        done.done = true;
        store.seed(sent).await;
        store.seed(done).await;

        let due = resolve_due(&store, &[slot("2025-06-01", "09:30")])
            .await
            .unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn resolve_surfaces_store_errors() {
        let store = MemoryStore::default();
        store.fail_queries();
        let result = resolve_due(&store, &[slot("2025-06-01", "09:30")]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn dispatch_marks_sent_and_stamps_timestamp() {
        let store = MemoryStore::default();
        let channel = RecordingChannel::default();
        store.seed(due_reminder("a", "2025-06-01", "09:30")).await;

        let batch = vec![store.get("a").await.unwrap()];
        let counts = dispatch_batch(&store, &channel, batch, 1_000, Duration::ZERO).await;

        assert_eq!(counts, DispatchCounts { checked: 1, sent: 1, failed: 0 });
        let stored = store.get("a").await.unwrap();
        assert!(stored.sent);
        assert_eq!(stored.last_sent_at, Some(1_000));
        assert_eq!(channel.sent_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn fire_once_gets_delete_button_confirm_gets_confirm_button() {
        let store = MemoryStore::default();
        let channel = RecordingChannel::default();
        let plain = due_reminder("a", "2025-06-01", "09:30");
        let mut confirm = due_reminder("b", "2025-06-01", "09:30");
        confirm.confirm_required = true;
        store.seed(plain.clone()).await;
        store.seed(confirm.clone()).await;

        dispatch_batch(&store, &channel, vec![plain, confirm], 1_000, Duration::ZERO).await;

        let sent = channel.sent_messages().await;
        assert_eq!(sent[0].callback_data.as_deref(), Some("delete_a"));
        assert_eq!(sent[1].callback_data.as_deref(), Some("confirm_b"));
    }

    #[tokio::test]
    async fn per_item_failure_is_isolated() {
        // Batch of three with the middle send failing
        let store = MemoryStore::default();
        let channel = RecordingChannel::default();
        for id in ["a", "b", "c"] {
            store.seed(due_reminder(id, "2025-06-01", "09:30")).await;
        }
        channel.fail_sends_to(101).await;

        let mut batch = Vec::new();
        for id in ["a", "b", "c"] {
            batch.push(store.get(id).await.unwrap());
        }
        batch[1].user_id = 101;

        let counts = dispatch_batch(&store, &channel, batch, 2_000, Duration::ZERO).await;

        assert_eq!(counts, DispatchCounts { checked: 3, sent: 2, failed: 1 });
        assert!(store.get("a").await.unwrap().sent);
        assert!(!store.get("b").await.unwrap().sent);
        assert!(store.get("c").await.unwrap().sent);
    }

    #[tokio::test]
    async fn failed_send_leaves_reminder_eligible() {
        let store = MemoryStore::default();
        let channel = RecordingChannel::default();
        let mut r = due_reminder("a", "2025-06-01", "09:30");
        r.user_id = 101;
        store.seed(r.clone()).await;
        channel.fail_sends_to(101).await;

        dispatch_batch(&store, &channel, vec![r], 1_000, Duration::ZERO).await;

        let stored = store.get("a").await.unwrap();
        assert!(!stored.sent);
        assert!(stored.last_sent_at.is_none());

        // Next window overlap retries and succeeds
        channel.clear_failures().await;
        let due = resolve_due(&store, &[slot("2025-06-01", "09:30")])
            .await
            .unwrap();
        let counts = dispatch_batch(&store, &channel, due, 2_000, Duration::ZERO).await;
        assert_eq!(counts.sent, 1);
        assert!(store.get("a").await.unwrap().sent);
    }

    #[tokio::test]
    async fn repeated_ticks_dispatch_exactly_once() {
        // At-least-once without duplicates: ticks at T, T+1, T+2
        let store = MemoryStore::default();
        let channel = RecordingChannel::default();
        store.seed(due_reminder("a", "2025-06-01", "09:30")).await;

        let windows = [
            [slot("2025-06-01", "09:30"), slot("2025-06-01", "09:29")],
            [slot("2025-06-01", "09:31"), slot("2025-06-01", "09:30")],
            [slot("2025-06-01", "09:32"), slot("2025-06-01", "09:31")],
        ];

        let mut total_sent = 0;
        for window in &windows {
            let due = resolve_due(&store, window).await.unwrap();
            let counts = dispatch_batch(&store, &channel, due, 1_000, Duration::ZERO).await;
            total_sent += counts.sent;
        }

        assert_eq!(total_sent, 1);
        assert_eq!(channel.sent_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn missed_tick_is_absorbed_by_previous_bucket() {
        // Tick at T never happens; the T+1 tick's previous bucket catches it
        let store = MemoryStore::default();
        let channel = RecordingChannel::default();
        store.seed(due_reminder("a", "2025-06-01", "09:30")).await;

        let window = [slot("2025-06-01", "09:31"), slot("2025-06-01", "09:30")];
        let due = resolve_due(&store, &window).await.unwrap();
        let counts = dispatch_batch(&store, &channel, due, 1_000, Duration::ZERO).await;

        assert_eq!(counts.sent, 1);
    }
}
