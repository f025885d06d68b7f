//! Re-notification loop
//!
//! Every tick scans all outstanding confirmations - no date/time filter -
//! and re-sends those whose interval has elapsed since the last send. The
//! external tick is the only scheduling primitive available, so polling and
//! comparing elapsed time is simpler and self-healing against missed ticks
//! than keeping a precise next-fire schedule.

use std::time::Duration;
use tracing::{info, warn};

use crate::db::schemas::ReminderDoc;
use crate::store::ReminderStore;
use crate::telegram::render;
use crate::telegram::{MessageStyle, NotifyChannel};
use crate::types::Result;

/// Re-notification counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReRemindCounts {
    /// Reminders past their interval that were re-sent
    pub re_reminded: usize,
    /// Per-reminder channel or store failures
    pub failed: usize,
}

/// Whether a reminder's re-remind interval has elapsed at `now_ms`.
/// A missing `last_sent_at` counts as never sent, forcing an immediate
/// resend.
fn interval_elapsed(reminder: &ReminderDoc, now_ms: i64) -> bool {
    match reminder.last_sent_at {
        Some(last) => now_ms.saturating_sub(last) >= reminder.re_remind_interval_ms(),
        None => true,
    }
}

/// Scan outstanding confirmations and re-send those past their interval
pub async fn run_re_reminders(
    store: &dyn ReminderStore,
    channel: &dyn NotifyChannel,
    now_ms: i64,
    throttle: Duration,
) -> Result<ReRemindCounts> {
    let outstanding = store.find_awaiting_confirmation().await?;
    let mut counts = ReRemindCounts::default();

    for reminder in &outstanding {
        if !interval_elapsed(reminder, now_ms) {
            continue;
        }

        let text = render::render(reminder, MessageStyle::ConfirmRepeat);
        let keyboard = render::keyboard(reminder, MessageStyle::ConfirmRepeat);

        match channel
            .send_message(reminder.user_id, &text, Some(keyboard))
            .await
        {
            Ok(()) => match store.touch_last_sent(&reminder.id, now_ms).await {
                Ok(_) => {
                    counts.re_reminded += 1;
                    info!(
                        reminder_id = %reminder.id,
                        user_id = reminder.user_id,
                        "Re-reminder dispatched"
                    );
                }
                Err(e) => {
                    counts.failed += 1;
                    warn!(reminder_id = %reminder.id, error = %e, "Failed to record re-reminder");
                }
            },
            Err(e) => {
                counts.failed += 1;
                warn!(
                    reminder_id = %reminder.id,
                    user_id = reminder.user_id,
                    error = %e,
                    "Failed to re-send reminder"
                );
            }
        }

        if !throttle.is_zero() {
            tokio::time::sleep(throttle).await;
        }
    }

    Ok(counts)
}
