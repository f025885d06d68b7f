//! Reminder CRUD endpoints
//!
//! Thin pass-through between the mini-app UI and the store; no scheduling
//! logic lives here. Documents go over the wire in the camelCase shape the
//! UI expects.
//!
//! ## Routes
//!
//! - `GET /api/reminders?userId={id}` - undone reminders for a user
//! - `POST /api/reminders` - create
//! - `PUT /api/reminders/{id}` - partial update
//! - `DELETE /api/reminders/{id}` - delete (idempotent)

use bytes::Bytes;
use chrono::{NaiveDate, NaiveTime};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::schemas::{
    Priority, ReminderDoc, Repeat, DEFAULT_RE_REMIND_INTERVAL_MINUTES,
};
use crate::server::AppState;
use crate::store::{ReminderPatch, ReminderStore};

/// Wire shape of a reminder, as the mini-app consumes it
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiReminder {
    id: String,
    text: String,
    date: String,
    time: String,
    user_id: i64,
    done: bool,
    sent: bool,
    confirm_required: bool,
    re_remind_interval_minutes: i64,
    confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_sent_at: Option<i64>,
    priority: Priority,
    repeat: Repeat,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_weekdays: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<i64>,
}

impl From<ReminderDoc> for ApiReminder {
    fn from(doc: ReminderDoc) -> Self {
        Self {
            id: doc.id,
            text: doc.text,
            date: doc.date,
            time: doc.time,
            user_id: doc.user_id,
            done: doc.done,
            sent: doc.sent,
            confirm_required: doc.confirm_required,
            re_remind_interval_minutes: doc.re_remind_interval_minutes,
            confirmed: doc.confirmed,
            last_sent_at: doc.last_sent_at,
            priority: doc.priority,
            repeat: doc.repeat,
            custom_weekdays: doc.custom_weekdays,
            created_at: doc.metadata.created_at.map(|t| t.timestamp_millis()),
        }
    }
}

/// Creation payload from the mini-app
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReminder {
    text: String,
    date: String,
    time: String,
    user_id: i64,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    confirm_required: bool,
    #[serde(default)]
    re_remind_interval_minutes: Option<i64>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    repeat: Option<Repeat>,
    #[serde(default)]
    custom_weekdays: Option<Vec<u8>>,
}

/// Partial-update payload
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateReminder {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    re_remind_interval_minutes: Option<i64>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    repeat: Option<Repeat>,
    #[serde(default)]
    custom_weekdays: Option<Vec<u8>>,
    #[serde(default)]
    done: Option<bool>,
}

/// Route an /api/reminders request
pub async fn handle_reminders_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<Full<Bytes>> {
    let Some(store) = state.store.clone() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Database not configured");
    };

    let id_segment = path
        .strip_prefix("/api/reminders/")
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    match (req.method().clone(), id_segment) {
        (Method::GET, None) => handle_list(&req, store.as_ref()).await,
        (Method::POST, None) => handle_create(req, store.as_ref()).await,
        (Method::PUT, Some(id)) => handle_update(req, store.as_ref(), &id).await,
        (Method::DELETE, Some(id)) => handle_delete(store.as_ref(), &id).await,
        _ => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    }
}

async fn handle_list(req: &Request<Incoming>, store: &dyn ReminderStore) -> Response<Full<Bytes>> {
    let Some(user_id) = query_param(req, "userId").and_then(|v| v.parse::<i64>().ok()) else {
        return error_response(StatusCode::BAD_REQUEST, "userId is required");
    };

    match store.find_for_user(user_id).await {
        Ok(reminders) => {
            let api: Vec<ApiReminder> = reminders.into_iter().map(Into::into).collect();
            json_response(StatusCode::OK, &api)
        }
        Err(e) => {
            warn!(user_id = user_id, error = %e, "Failed to list reminders");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch reminders")
        }
    }
}

async fn handle_create(req: Request<Incoming>, store: &dyn ReminderStore) -> Response<Full<Bytes>> {
    let payload: CreateReminder = match read_json(req).await {
        Ok(p) => p,
        Err(response) => return response,
    };

    if payload.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "text is required");
    }
    if !valid_date(&payload.date) {
        return error_response(StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD");
    }
    if !valid_time(&payload.time) {
        return error_response(StatusCode::BAD_REQUEST, "time must be HH:MM");
    }

    let mut doc = ReminderDoc::new(
        payload.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        payload.text,
        payload.date,
        payload.time,
        payload.user_id,
    );
    doc.confirm_required = payload.confirm_required;
    doc.re_remind_interval_minutes = payload
        .re_remind_interval_minutes
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_RE_REMIND_INTERVAL_MINUTES);
    if let Some(priority) = payload.priority {
        doc.priority = priority;
    }
    if let Some(repeat) = payload.repeat {
        doc.repeat = repeat;
    }
    doc.custom_weekdays = payload.custom_weekdays;

    match store.insert(doc.clone()).await {
        Ok(()) => {
            info!(reminder_id = %doc.id, user_id = doc.user_id, "Reminder created");
            json_response(StatusCode::CREATED, &ApiReminder::from(doc))
        }
        Err(e) => {
            warn!(error = %e, "Failed to create reminder");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create reminder")
        }
    }
}

async fn handle_update(
    req: Request<Incoming>,
    store: &dyn ReminderStore,
    id: &str,
) -> Response<Full<Bytes>> {
    let payload: UpdateReminder = match read_json(req).await {
        Ok(p) => p,
        Err(response) => return response,
    };

    let patch = match build_update_patch(payload) {
        Ok(p) => p,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    if patch.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No fields to update");
    }

    match store.apply_patch(id, patch).await {
        Ok(true) => json_response(StatusCode::OK, &serde_json::json!({ "ok": true })),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Reminder not found"),
        Err(e) => {
            warn!(reminder_id = id, error = %e, "Failed to update reminder");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update reminder")
        }
    }
}

async fn handle_delete(store: &dyn ReminderStore, id: &str) -> Response<Full<Bytes>> {
    // Deleting an already-deleted reminder reports success
    match store.delete(id).await {
        Ok(removed) => {
            if removed {
                info!(reminder_id = id, "Reminder deleted via API");
            }
            json_response(StatusCode::OK, &serde_json::json!({ "ok": true }))
        }
        Err(e) => {
            warn!(reminder_id = id, error = %e, "Failed to delete reminder");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete reminder")
        }
    }
}

/// Validate an update payload and turn it into a store patch
fn build_update_patch(payload: UpdateReminder) -> std::result::Result<ReminderPatch, &'static str> {
    if let Some(ref date) = payload.date {
        if !valid_date(date) {
            return Err("date must be YYYY-MM-DD");
        }
    }
    if let Some(ref time) = payload.time {
        if !valid_time(time) {
            return Err("time must be HH:MM");
        }
    }
    // A non-positive interval would turn the re-notification loop into a
    // per-tick resend
    if let Some(interval) = payload.re_remind_interval_minutes {
        if interval <= 0 {
            return Err("reRemindIntervalMinutes must be positive");
        }
    }

    // Rescheduling resets `sent` so the reminder fires at its new instant
    let rescheduled = payload.date.is_some() || payload.time.is_some();
    Ok(ReminderPatch {
        text: payload.text,
        date: payload.date,
        time: payload.time,
        priority: payload.priority,
        repeat: payload.repeat,
        custom_weekdays: payload.custom_weekdays,
        re_remind_interval_minutes: payload.re_remind_interval_minutes,
        done: payload.done,
        sent: rescheduled.then_some(false),
    })
}

/// Extract a query-string parameter by name
fn query_param(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.uri().query().and_then(|q| {
        q.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then(|| v.to_string())
        })
    })
}

fn valid_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

fn valid_time(time: &str) -> bool {
    time.len() == 5 && NaiveTime::parse_from_str(time, "%H:%M").is_ok()
}

/// Read and deserialize a JSON request body
async fn read_json<T: serde::de::DeserializeOwned>(
    req: Request<Incoming>,
) -> std::result::Result<T, Response<Full<Bytes>>> {
    let body = req
        .collect()
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &format!("Body read error: {}", e)))?
        .to_bytes();

    serde_json::from_slice(&body)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON: {}", e)))
}

fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(data)
        .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }))
}
