//! HTTP route handlers

pub mod health;
pub mod reminders;
pub mod tick;
pub mod webhook;

pub use health::{health_check, version_info};
pub use reminders::handle_reminders_request;
pub use tick::handle_tick;
pub use webhook::handle_webhook;
