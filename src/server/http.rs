//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Routing is a flat
//! match over method and path.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::routes;
use crate::store::ReminderStore;
use crate::telegram::NotifyChannel;
use crate::types::ChimeError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Reminder persistence; None until Mongo is connected (dev mode)
    pub store: Option<Arc<dyn ReminderStore>>,
    /// Outbound notification channel; None without a bot token (dev mode)
    pub channel: Option<Arc<dyn NotifyChannel>>,
}

impl AppState {
    /// Create AppState with whatever services are configured
    pub fn with_services(
        args: Args,
        store: Option<Arc<dyn ReminderStore>>,
        channel: Option<Arc<dyn NotifyChannel>>,
    ) -> Self {
        Self {
            args,
            store,
            channel,
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), ChimeError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Chime listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - scheduler authentication disabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Health check endpoints
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            to_boxed(routes::health_check(Arc::clone(&state)))
        }

        // Build information
        (Method::GET, "/version") => to_boxed(routes::version_info()),

        // CORS preflight
        (Method::OPTIONS, _) => to_boxed(preflight_response()),

        // Scheduler tick - accepts GET (cron services) and POST
        (Method::GET, "/api/check-reminders") | (Method::POST, "/api/check-reminders") => {
            to_boxed(routes::handle_tick(req, state).await)
        }

        // Telegram webhook
        (Method::POST, "/api/webhook") => to_boxed(routes::handle_webhook(req, state).await),

        // Reminder CRUD
        (_, p) if p == "/api/reminders" || p.starts_with("/api/reminders/") => {
            to_boxed(routes::handle_reminders_request(req, state, &path).await)
        }

        // Not found
        _ => to_boxed(not_found_response(&path)),
    };

    Ok(response)
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "Content-Type, X-Api-Key")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
