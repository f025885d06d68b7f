//! Tick trigger endpoint
//!
//! `/api/check-reminders` is invoked by the external cron source roughly
//! every minute. The shared key is checked before anything else touches the
//! store or the channel; missing dependencies reject the tick before any
//! partial processing.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::scheduler::run_tick;
use crate::server::AppState;

/// Tick response body: counts for operator observability
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TickResponse {
    checked: usize,
    sent: usize,
    re_reminded: usize,
    failed: usize,
    times: TickTimes,
    timestamp: String,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct TickTimes {
    current: String,
    previous: String,
}

/// Handle a tick invocation
pub async fn handle_tick(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let started = Instant::now();

    // Shared-key authentication, before any store/channel access
    if let Some(ref expected) = state.args.scheduler_api_key {
        let presented = req
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != expected {
            warn!("Tick rejected: invalid or missing X-Api-Key");
            return json_error(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    // Configuration check: both collaborators must be present
    let Some(ref store) = state.store else {
        return json_error(StatusCode::SERVICE_UNAVAILABLE, "Database not configured");
    };
    let Some(ref channel) = state.channel else {
        return json_error(StatusCode::SERVICE_UNAVAILABLE, "Telegram bot not configured");
    };

    let now = chrono::Utc::now();
    let outcome = run_tick(
        store.as_ref(),
        channel.as_ref(),
        now,
        state.args.storage_offset(),
        Duration::from_millis(state.args.send_delay_ms),
    )
    .await;

    // A resolve-phase store failure is surfaced as a server error; the
    // re-remind counts it managed are still reported
    let status = if outcome.new_dispatch_error.is_some() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    let error = outcome
        .new_dispatch_error
        .clone()
        .or_else(|| outcome.re_remind_error.clone());

    let response = TickResponse {
        checked: outcome.checked,
        sent: outcome.sent,
        re_reminded: outcome.re_reminded,
        failed: outcome.failed,
        times: TickTimes {
            current: format!("{} {}", outcome.window[0].date, outcome.window[0].time),
            previous: format!("{} {}", outcome.window[1].date, outcome.window[1].time),
        },
        timestamp: now.to_rfc3339(),
        duration_ms: started.elapsed().as_millis() as u64,
        error,
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn json_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message });
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
