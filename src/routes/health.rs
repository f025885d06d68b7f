//! Health and version endpoints

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Health response for cron-monitor and deploy checks
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall status: 'ok' or 'degraded'
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Whether the reminder store is configured and connected
    pub database: bool,
    /// Whether the Telegram client is configured
    pub telegram: bool,
    /// Operating mode
    pub mode: &'static str,
    /// Current timestamp
    pub timestamp: String,
}

/// Handle health probe (/health, /healthz)
///
/// Always returns 200 while the process is up; dependency status is in the
/// body for callers that need it.
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let database = state.store.is_some();
    let telegram = state.channel.is_some();

    let response = HealthResponse {
        status: if database && telegram { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        telegram,
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"status":"ok","error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "chime",
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"version":"unknown"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
