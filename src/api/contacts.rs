use super::{required, ApiState, JsonBody};
use crate::client::MessagingClient;
use crate::contact::{
    chat_stats, contact_stats, format_contact_info, summarize_chat, ContactInfo, NOTE_FROM_CHAT,
};
use crate::error::{ClientResult, Error, Result};
use axum::extract::{Path, State};
use axum::response::Json;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ContactInfoRequest {
    session_id: Option<String>,
    contact_id: Option<String>,
}

/// `GET /contacts/{sessionId}`: individual contacts with phone availability stats.
pub(super) async fn list_contacts(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>> {
    let client = state.registry.get(&session_id)?;
    let contacts: Vec<ContactInfo> = client
        .get_contacts()
        .await?
        .iter()
        .filter(|c| !c.is_group)
        .map(format_contact_info)
        .collect();

    Ok(Json(json!({
        "success": true,
        "stats": contact_stats(&contacts),
        "contacts": contacts,
    })))
}

/// `POST /contact/info`: one contact; when its id hides the number, the
/// matching chat's contact is consulted as well.
pub(super) async fn contact_info(
    State(state): State<ApiState>,
    JsonBody(body): JsonBody<ContactInfoRequest>,
) -> Result<Json<Value>> {
    let (Some(session_id), Some(contact_id)) =
        (required(body.session_id), required(body.contact_id))
    else {
        return Err(Error::missing("sessionId and contactId are required"));
    };

    let client = state.registry.get(&session_id)?;
    let contact = client.get_contact_by_id(&contact_id).await?;
    let mut info = format_contact_info(&contact);

    if info.phone.is_none() {
        match phone_from_chat(client.as_ref(), &contact_id).await {
            Ok(Some(phone)) => {
                info.phone = Some(phone);
                info.note = Some(NOTE_FROM_CHAT.to_string());
            }
            Ok(None) => {}
            Err(e) => {
                tracing::info!(session_id = %session_id, contact_id = %contact_id, error = %e, "could not retrieve phone from chat")
            }
        }
    }

    Ok(Json(json!({ "success": true, "contact": info })))
}

/// Number of the contact behind the chat whose id equals `contact_id`.
async fn phone_from_chat(
    client: &dyn MessagingClient,
    contact_id: &str,
) -> ClientResult<Option<String>> {
    let chats = client.get_chats().await?;
    let Some(chat) = chats.iter().find(|c| c.id.serialized == contact_id) else {
        return Ok(None);
    };
    let contact = client.get_chat_contact(chat).await?;
    Ok(contact.number.filter(|n| !n.is_empty()))
}

/// `GET /chats/{sessionId}`: individual chats, each with its contact resolved.
pub(super) async fn list_chats(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>> {
    let client = state.registry.get(&session_id)?;
    let chats = client.get_chats().await?;
    let client = client.as_ref();

    let summaries = try_join_all(chats.iter().filter(|chat| !chat.is_group).map(
        |chat| async move {
            let contact = client.get_chat_contact(chat).await?;
            ClientResult::Ok(summarize_chat(chat, &contact))
        },
    ))
    .await?;

    Ok(Json(json!({
        "success": true,
        "stats": chat_stats(&summaries),
        "chats": summaries,
    })))
}
