//! Configuration for Chime
//!
//! CLI arguments and environment variable handling using clap.

use chrono::FixedOffset;
use clap::Parser;
use std::net::SocketAddr;

/// Chime - reminder delivery gateway
///
/// Receives minute-granularity ticks from an external cron source, finds due
/// reminders in MongoDB, and delivers them through the Telegram Bot API.
#[derive(Parser, Debug, Clone)]
#[command(name = "chime")]
#[command(about = "Reminder delivery gateway for Telegram")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "chime")]
    pub mongodb_db: String,

    /// Telegram bot token (required in production)
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<String>,

    /// Shared API key the cron source must present in X-Api-Key on tick
    /// requests. When unset, tick requests are accepted without a key.
    #[arg(long, env = "SCHEDULER_API_KEY")]
    pub scheduler_api_key: Option<String>,

    /// Fixed UTC offset, in minutes, of the time base reminders are stored
    /// in. Reminder (date, time) buckets are computed in this offset.
    #[arg(long, env = "UTC_OFFSET_MINUTES", default_value = "0")]
    pub utc_offset_minutes: i32,

    /// Delay between consecutive sends within one tick batch, in
    /// milliseconds. Throttles against Telegram rate limits.
    #[arg(long, env = "SEND_DELAY_MS", default_value = "50")]
    pub send_delay_ms: u64,

    /// Enable development mode (runs without MongoDB/Telegram configured)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// The storage time base as a chrono offset
    pub fn storage_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.telegram_bot_token.is_none() {
            return Err("TELEGRAM_BOT_TOKEN is required in production mode".to_string());
        }

        if !self.dev_mode && self.scheduler_api_key.is_none() {
            return Err("SCHEDULER_API_KEY is required in production mode".to_string());
        }

        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err("UTC_OFFSET_MINUTES must be within a day".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["chime", "--dev-mode"])
    }

    #[test]
    fn dev_mode_needs_no_credentials() {
        assert!(base_args().validate().is_ok());
    }

    #[test]
    fn production_requires_bot_token_and_key() {
        let mut args = base_args();
        args.dev_mode = false;
        assert!(args.validate().is_err());

        args.telegram_bot_token = Some("123:abc".to_string());
        assert!(args.validate().is_err());

        args.scheduler_api_key = Some("secret".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn offset_out_of_range_rejected() {
        let mut args = base_args();
        args.utc_offset_minutes = 24 * 60;
        assert!(args.validate().is_err());
    }

    #[test]
    fn storage_offset_east_and_west() {
        let mut args = base_args();
        args.utc_offset_minutes = 180;
        assert_eq!(args.storage_offset().local_minus_utc(), 180 * 60);

        args.utc_offset_minutes = -300;
        assert_eq!(args.storage_offset().local_minus_utc(), -300 * 60);
    }
}
