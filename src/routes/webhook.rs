//! Telegram webhook endpoint
//!
//! Inbound button-press events. Telegram retries any non-200 response, so
//! every path through this handler returns 200 `{"ok":true}`; failures are
//! logged and, where possible, answered back to the user through the
//! callback itself.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::scheduler::ack;
use crate::server::AppState;
use crate::telegram::update;

/// Handle a webhook update from Telegram
pub async fn handle_webhook(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "Webhook body read error");
            return ok_response();
        }
    };

    let parsed = match update::parse_update(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Webhook payload parse error");
            return ok_response();
        }
    };

    // Only callback queries are processed; other update kinds are ignored
    let Some(query) = parsed.callback_query else {
        debug!("Webhook update without callback_query ignored");
        return ok_response();
    };

    let (Some(store), Some(channel)) = (&state.store, &state.channel) else {
        warn!("Webhook received but store/channel not configured");
        return ok_response();
    };

    match query.into_event() {
        Ok(event) => {
            if let Err(e) = ack::handle_event(store.as_ref(), channel.as_ref(), &event).await {
                warn!(
                    reminder_id = %event.reminder_id,
                    error = %e,
                    "Callback handling failed"
                );
            }
        }
        Err(callback_id) => {
            // Malformed or unrecognized payload: answer with an error
            // indication, mutate nothing
            ack::reject_event(channel.as_ref(), &callback_id).await;
        }
    }

    ok_response()
}

fn ok_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(r#"{"ok":true}"#)))
        .unwrap()
}
