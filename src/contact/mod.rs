//! Normalization of contact and chat records into API views.
//!
//! Contacts reach us in several id shapes: phone-number ids (`<digits>@c.us`),
//! linked identifiers (`<opaque>@lid`) that hide the number, and records that
//! only carry some of the `number`/`user` fields. Everything here is pure.

use crate::client::{ChatRecord, ContactRecord, LastMessage};
use crate::types::{is_lid, Identifier};
use serde::Serialize;

/// Note attached when no phone number can be recovered.
pub const NOTE_PHONE_UNAVAILABLE: &str = "Phone number not available (using @lid)";
/// Note attached when the number was found through the contact's chat.
pub const NOTE_FROM_CHAT: &str = "Retrieved from chat";

/// Id scheme of a contact, derived from its serialized id alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IdKind {
    #[serde(rename = "lid")]
    Lid,
    #[serde(rename = "c.us")]
    Cus,
}

impl IdKind {
    pub fn of(serialized: &str) -> Self {
        if is_lid(serialized) {
            Self::Lid
        } else {
            Self::Cus
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub id: String,
    pub name: String,
    pub is_my_contact: bool,
    pub is_group: bool,
    pub is_user: bool,
    pub is_business: bool,
    #[serde(rename = "type")]
    pub kind: IdKind,
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub chat_id: String,
    pub name: String,
    pub contact: ContactInfo,
    pub unread_count: u32,
    pub last_message: Option<LastMessage>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStats {
    pub total: usize,
    pub with_phone: usize,
    pub without_phone: usize,
    pub lid_contacts: usize,
    pub cus_contacts: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStats {
    pub total: usize,
    pub with_phone: usize,
    pub without_phone: usize,
}

pub fn classify(record: &ContactRecord) -> Identifier {
    Identifier::classify(
        &record.id.serialized,
        record.number.as_deref(),
        record.id.user.as_deref(),
    )
}

/// Phone number of a contact, if any strategy recovers one.
pub fn extract_phone(record: &ContactRecord) -> Option<String> {
    classify(record).into_phone()
}

pub fn format_contact_info(record: &ContactRecord) -> ContactInfo {
    let phone = extract_phone(record);
    let note = phone
        .is_none()
        .then(|| NOTE_PHONE_UNAVAILABLE.to_string());
    let name = [record.name.as_deref(), record.pushname.as_deref()]
        .into_iter()
        .flatten()
        .find(|n| !n.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    ContactInfo {
        id: record.id.serialized.clone(),
        name,
        is_my_contact: record.is_my_contact,
        is_group: record.is_group,
        is_user: record.is_user,
        is_business: record.is_business,
        kind: IdKind::of(&record.id.serialized),
        phone,
        note,
    }
}

pub fn summarize_chat(chat: &ChatRecord, contact: &ContactRecord) -> ChatSummary {
    ChatSummary {
        chat_id: chat.id.serialized.clone(),
        name: chat.name.clone(),
        contact: format_contact_info(contact),
        unread_count: chat.unread_count,
        last_message: chat.last_message.clone(),
    }
}

pub fn contact_stats(contacts: &[ContactInfo]) -> ContactStats {
    let with_phone = contacts.iter().filter(|c| c.phone.is_some()).count();
    let lid_contacts = contacts.iter().filter(|c| c.kind == IdKind::Lid).count();
    ContactStats {
        total: contacts.len(),
        with_phone,
        without_phone: contacts.len() - with_phone,
        lid_contacts,
        cus_contacts: contacts.len() - lid_contacts,
    }
}

pub fn chat_stats(chats: &[ChatSummary]) -> ChatStats {
    let with_phone = chats.iter().filter(|c| c.contact.phone.is_some()).count();
    ChatStats {
        total: chats.len(),
        with_phone,
        without_phone: chats.len() - with_phone,
    }
}
