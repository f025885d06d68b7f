//! Chime - reminder delivery gateway for Telegram

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chime::{
    config::Args,
    db::MongoClient,
    server,
    store::{MongoReminderStore, ReminderStore},
    telegram::{NotifyChannel, TelegramClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chime={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Chime - Reminder Delivery Gateway");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    info!("UTC offset: {} minutes", args.utc_offset_minutes);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let store: Option<Arc<dyn ReminderStore>> =
        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => {
                info!("MongoDB connected successfully");
                let store = MongoReminderStore::new(&client).await?;
                Some(Arc::new(store))
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, continuing without): {}", e);
                    None
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        };

    // Telegram client (optional in dev mode; validate() requires the token
    // in production)
    let channel: Option<Arc<dyn NotifyChannel>> = match args.telegram_bot_token {
        Some(ref token) => Some(Arc::new(TelegramClient::new(token))),
        None => {
            warn!("No bot token configured, notifications disabled");
            None
        }
    };

    // Create application state
    let state = Arc::new(server::AppState::with_services(args, store, channel));

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
