//! Send message types.

use crate::types::{MessageId, LEGACY_USER_SERVER};
use std::time::SystemTime;

/// Response from sending a message.
#[derive(Clone, Debug)]
pub struct SendResponse {
    pub id: MessageId,
    pub to: String,
    pub timestamp: SystemTime,
}

/// Chat id for a phone number: `@c.us` is appended unless already present.
pub fn chat_id_for_phone(phone: &str) -> String {
    let suffix = format!("@{LEGACY_USER_SERVER}");
    if phone.contains(&suffix) {
        phone.to_string()
    } else {
        format!("{phone}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_suffix_once() {
        assert_eq!(chat_id_for_phone("15551234567"), "15551234567@c.us");
        assert_eq!(chat_id_for_phone("15551234567@c.us"), "15551234567@c.us");
    }
}
