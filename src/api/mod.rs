//! HTTP routes.
//!
//! Every handler validates required fields, looks the session up in the
//! [`SessionRegistry`], makes one client call and maps the outcome to JSON.
//! Errors are rendered as `{"error": "..."}` with the status chosen by
//! [`Error`]'s `IntoResponse` impl.

mod contacts;
mod message;
mod session;
#[cfg(test)]
mod tests;

use crate::error::Error;
use crate::session::SessionRegistry;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: SessionRegistry,
}

impl ApiState {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }
}

/// Route table, printed at startup.
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/", "API status"),
    ("POST", "/session/start", "Start new session"),
    ("POST", "/session/stop", "Stop session"),
    ("GET", "/session/status/{sessionId}", "Get session status"),
    ("GET", "/sessions", "List all sessions"),
    ("POST", "/message/send", "Send message"),
    ("GET", "/contacts/{sessionId}", "Get all contacts (with @lid info)"),
    ("POST", "/contact/info", "Get specific contact info"),
    ("GET", "/chats/{sessionId}", "Get all chats with contact info"),
    ("POST", "/phone/verify", "Verify if phone exists on WhatsApp"),
];

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(session::root))
        .route("/session/start", post(session::start))
        .route("/session/stop", post(session::stop))
        .route("/session/status/{session_id}", get(session::status))
        .route("/sessions", get(session::list))
        .route("/message/send", post(message::send))
        .route("/contacts/{session_id}", get(contacts::list_contacts))
        .route("/contact/info", post(contacts::contact_info))
        .route("/chats/{session_id}", get(contacts::list_chats))
        .route("/phone/verify", post(message::verify_phone))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) | Error::Conflict => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::External(_) | Error::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Value of a required field; missing and empty both count as absent.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// JSON request body. A missing body or a non-JSON content type reads as an
/// empty object, so handlers report the missing fields. Malformed JSON is a
/// validation error.
pub(crate) struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::Validation(e.body_text()))?;
        if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| Error::Validation(format!("Invalid JSON body: {e}")))
    }
}
