use super::{required, ApiState, JsonBody};
use crate::error::{Error, Result};
use crate::session::SessionStatus;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionRequest {
    session_id: Option<String>,
}

fn session_id(body: SessionRequest) -> Result<String> {
    required(body.session_id).ok_or_else(|| Error::missing("sessionId is required"))
}

/// `GET /`: service status and active session ids.
pub(super) async fn root(State(state): State<ApiState>) -> Result<Json<Value>> {
    let sessions = state.registry.list()?;
    Ok(Json(json!({
        "status": "running",
        "message": "Multi WhatsApp Web API",
        "activeSessions": sessions,
    })))
}

/// `POST /session/start`
pub(super) async fn start(
    State(state): State<ApiState>,
    JsonBody(body): JsonBody<SessionRequest>,
) -> Result<Json<Value>> {
    let session_id = session_id(body)?;
    state.registry.start(&session_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Session {session_id} initialized. Check logs for QR code."),
    })))
}

/// `POST /session/stop`
pub(super) async fn stop(
    State(state): State<ApiState>,
    JsonBody(body): JsonBody<SessionRequest>,
) -> Result<Json<Value>> {
    let session_id = session_id(body)?;
    state.registry.stop(&session_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Session {session_id} stopped"),
    })))
}

#[derive(Debug, Serialize)]
pub(super) struct StatusResponse {
    #[serde(flatten)]
    session: SessionStatus,
    status: &'static str,
}

/// `GET /session/status/{sessionId}`
pub(super) async fn status(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let session = state.registry.status(&session_id)?;
    Ok(Json(StatusResponse {
        session,
        status: "active",
    }))
}

/// `GET /sessions`
pub(super) async fn list(State(state): State<ApiState>) -> Result<Json<Value>> {
    let sessions: Vec<Value> = state
        .registry
        .list()?
        .into_iter()
        .map(|session_id| json!({ "sessionId": session_id, "status": "active" }))
        .collect();
    Ok(Json(json!({ "sessions": sessions })))
}
