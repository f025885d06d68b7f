//! Due-reminder scheduling and delivery
//!
//! The hard core of the service: window resolution, delivery dispatch, the
//! re-notification loop, and acknowledgment handling. Everything here works
//! against the `ReminderStore` and `NotifyChannel` seams and is exercised
//! with in-memory fakes.

pub mod ack;
pub mod dispatch;
pub mod reremind;
pub mod tick;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use ack::AckOutcome;
pub use tick::{run_tick, TickOutcome};
pub use window::{due_window, DueSlot};
