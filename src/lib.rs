//! Chime - reminder delivery gateway for Telegram
//!
//! Bridges a minute-granularity external cron source to the Telegram Bot
//! API: on each tick, due reminders are loaded from MongoDB, delivered as
//! bot messages, and re-notified until acknowledged when they require
//! confirmation.

pub mod config;
pub mod db;
pub mod routes;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod telegram;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ChimeError, Result};
