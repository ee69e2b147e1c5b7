//! Records returned by the client, shaped like WhatsApp Web's JSON objects.

use serde::{Deserialize, Serialize};

/// Id object of a contact or chat. Any of the fields may be missing depending
/// on the id scheme.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactId {
    #[serde(rename = "_serialized", default)]
    pub serialized: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl ContactId {
    /// Id with only the serialized form known.
    pub fn serialized(serialized: impl Into<String>) -> Self {
        Self {
            serialized: serialized.into(),
            ..Self::default()
        }
    }

    /// Id with user and server parts filled from a `user@server` string.
    pub fn parse(serialized: impl Into<String>) -> Self {
        let serialized = serialized.into();
        let (user, server) = match serialized.split_once('@') {
            Some((u, s)) => (Some(u.to_string()), Some(s.to_string())),
            None => (None, None),
        };
        Self {
            serialized,
            user,
            server,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: ContactId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushname: Option<String>,
    #[serde(default)]
    pub is_my_contact: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub is_user: bool,
    #[serde(default)]
    pub is_business: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub body: String,
    /// Unix seconds.
    pub timestamp: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub id: ContactId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
}

/// Account information of a ready client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub wid: ContactId,
    #[serde(default)]
    pub pushname: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}
