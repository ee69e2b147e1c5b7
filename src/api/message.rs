use super::{required, ApiState, JsonBody};
use crate::client::chat_id_for_phone;
use crate::contact::IdKind;
use crate::error::{Error, Result};
use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SendRequest {
    session_id: Option<String>,
    phone: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VerifyRequest {
    session_id: Option<String>,
    phone: Option<String>,
}

/// `POST /message/send`
pub(super) async fn send(
    State(state): State<ApiState>,
    JsonBody(body): JsonBody<SendRequest>,
) -> Result<Json<Value>> {
    let (Some(session_id), Some(phone), Some(message)) = (
        required(body.session_id),
        required(body.phone),
        required(body.message),
    ) else {
        return Err(Error::missing("sessionId, phone, and message are required"));
    };

    let client = state.registry.get(&session_id)?;
    let chat_id = chat_id_for_phone(&phone);
    let sent = client.send_message(&chat_id, &message).await?;
    tracing::debug!(session_id = %session_id, chat_id = %chat_id, message_id = %sent.id, "message sent");

    Ok(Json(json!({
        "success": true,
        "message": "Message sent",
        "messageId": sent.id,
    })))
}

/// `POST /phone/verify`: whether a number is registered on WhatsApp.
pub(super) async fn verify_phone(
    State(state): State<ApiState>,
    JsonBody(body): JsonBody<VerifyRequest>,
) -> Result<Json<Value>> {
    let (Some(session_id), Some(phone)) = (required(body.session_id), required(body.phone))
    else {
        return Err(Error::missing("sessionId and phone are required"));
    };

    let client = state.registry.get(&session_id)?;
    let phone = digits_only(&phone);

    let body = match client.get_number_id(&phone).await? {
        Some(number_id) => {
            let serialized = number_id.to_string();
            let kind = IdKind::of(&serialized);
            json!({
                "success": true,
                "exists": true,
                "numberId": serialized,
                "phone": phone,
                "type": kind,
            })
        }
        None => json!({
            "success": true,
            "exists": false,
            "phone": phone,
        }),
    };
    Ok(Json(body))
}

fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}
