//! Tick orchestration
//!
//! One tick = resolve the due window and dispatch new reminders, then run
//! the re-notification scan. The two phases are independent: a store
//! failure while resolving aborts only the new-dispatch portion, and the
//! next tick retries it through the same window logic. Nothing is retried
//! within a tick.

use chrono::{DateTime, FixedOffset, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::scheduler::dispatch::{dispatch_batch, resolve_due};
use crate::scheduler::reremind::run_re_reminders;
use crate::scheduler::window::{due_window, DueSlot};
use crate::store::ReminderStore;
use crate::telegram::NotifyChannel;

/// Aggregate counts and errors for one tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// Newly due candidates resolved from the window
    pub checked: usize,
    /// Initial deliveries completed
    pub sent: usize,
    /// Re-notifications delivered
    pub re_reminded: usize,
    /// Per-reminder failures across both phases
    pub failed: usize,
    /// The [current, previous] buckets this tick covered
    pub window: [DueSlot; 2],
    /// Store failure that aborted the new-dispatch phase
    pub new_dispatch_error: Option<String>,
    /// Store failure that aborted the re-notification scan
    pub re_remind_error: Option<String>,
}

impl TickOutcome {
    /// Whether any phase was aborted by a store failure
    pub fn has_error(&self) -> bool {
        self.new_dispatch_error.is_some() || self.re_remind_error.is_some()
    }
}

/// Run one tick at the given instant
pub async fn run_tick(
    store: &dyn ReminderStore,
    channel: &dyn NotifyChannel,
    now: DateTime<Utc>,
    offset: FixedOffset,
    throttle: Duration,
) -> TickOutcome {
    let now_ms = now.timestamp_millis();
    let window = due_window(now, offset);

    let mut outcome = TickOutcome {
        checked: 0,
        sent: 0,
        re_reminded: 0,
        failed: 0,
        window: window.clone(),
        new_dispatch_error: None,
        re_remind_error: None,
    };

    info!(
        current = %format!("{} {}", window[0].date, window[0].time),
        previous = %format!("{} {}", window[1].date, window[1].time),
        "Tick: checking due window"
    );

    // Phase 1: new reminders
    match resolve_due(store, &window).await {
        Ok(batch) => {
            let counts = dispatch_batch(store, channel, batch, now_ms, throttle).await;
            outcome.checked = counts.checked;
            outcome.sent = counts.sent;
            outcome.failed += counts.failed;
        }
        Err(e) => {
            error!(error = %e, "Due-set resolution failed; skipping new dispatch this tick");
            outcome.new_dispatch_error = Some(e.to_string());
        }
    }

    // Phase 2: outstanding confirmations, independent of phase 1
    match run_re_reminders(store, channel, now_ms, throttle).await {
        Ok(counts) => {
            outcome.re_reminded = counts.re_reminded;
            outcome.failed += counts.failed;
        }
        Err(e) => {
            warn!(error = %e, "Re-notification scan failed this tick");
            outcome.re_remind_error = Some(e.to_string());
        }
    }

    info!(
        checked = outcome.checked,
        sent = outcome.sent,
        re_reminded = outcome.re_reminded,
        failed = outcome.failed,
        "Tick complete"
    );

    outcome
}
