//! Classification of loosely-shaped contact ids.

use super::jid::{LEGACY_USER_SERVER, LID_SERVER};

/// What a contact id tells us about reaching the contact by phone number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identifier {
    /// A phone number could be recovered.
    NumericContact(String),
    /// Linked identifier with no recoverable phone number; carries the serialized id.
    LinkedIdentifier(String),
    Unknown,
}

impl Identifier {
    /// Classify a contact from its serialized id plus the optional `number` and
    /// `user` fields. Empty strings count as absent.
    ///
    /// Phone recovery order: the direct number, then a `@c.us` serialized id with
    /// the suffix stripped, then the bare user part.
    pub fn classify(serialized: &str, number: Option<&str>, user: Option<&str>) -> Self {
        let present = |s: Option<&str>| s.filter(|v| !v.is_empty()).map(str::to_string);

        if let Some(number) = present(number) {
            return Self::NumericContact(number);
        }
        if let Some(phone) = strip_legacy_suffix(serialized) {
            return Self::NumericContact(phone.to_string());
        }
        if let Some(user) = present(user) {
            return Self::NumericContact(user);
        }
        if is_lid(serialized) {
            return Self::LinkedIdentifier(serialized.to_string());
        }
        Self::Unknown
    }

    pub fn phone(&self) -> Option<&str> {
        match self {
            Self::NumericContact(phone) => Some(phone),
            _ => None,
        }
    }

    pub fn into_phone(self) -> Option<String> {
        match self {
            Self::NumericContact(phone) => Some(phone),
            _ => None,
        }
    }
}

/// Whether the serialized id uses the linked-identifier scheme.
pub fn is_lid(serialized: &str) -> bool {
    serialized.contains(&format!("@{LID_SERVER}"))
}

/// Strip a trailing `@c.us`, returning the user part when it is non-empty.
pub fn strip_legacy_suffix(serialized: &str) -> Option<&str> {
    serialized
        .strip_suffix(&format!("@{LEGACY_USER_SERVER}"))
        .filter(|user| !user.is_empty())
}
