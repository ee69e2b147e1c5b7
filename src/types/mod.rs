mod identifier;
mod jid;

pub use identifier::{is_lid, strip_legacy_suffix, Identifier};
pub use jid::{Jid, JidParseError, GROUP_SERVER, LEGACY_USER_SERVER, LID_SERVER};

/// Message ID type (WhatsApp internal ID string).
pub type MessageId = String;
