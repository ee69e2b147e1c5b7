use std::fmt;
use std::str::FromStr;

/// Server of phone-number based user ids as serialized by WhatsApp Web.
pub const LEGACY_USER_SERVER: &str = "c.us";
/// Server of linked (hidden) identifiers that carry no phone number.
pub const LID_SERVER: &str = "lid";
pub const GROUP_SERVER: &str = "g.us";

/// Serialized WhatsApp Web id (`user@server`, optionally `user:device@server`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Jid {
    pub user: String,
    pub device: u16,
    pub server: String,
}

impl Jid {
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            device: 0,
            server: server.into(),
        }
    }

    /// Chat id for a phone number (`<digits>@c.us`).
    pub fn for_phone(phone: impl Into<String>) -> Self {
        Self::new(phone, LEGACY_USER_SERVER)
    }

    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }
}

impl FromStr for Jid {
    type Err = JidParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (user, server) = s.split_once('@').ok_or(JidParseError)?;
        if server.is_empty() || server.contains('@') {
            return Err(JidParseError);
        }
        let (user, device) = match user.split_once(':') {
            Some((u, d)) => (u, d.parse().map_err(|_| JidParseError)?),
            None => (user, 0),
        };
        Ok(Self {
            user: user.to_string(),
            device,
            server: server.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JidParseError;

impl fmt::Display for JidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid serialized id")
    }
}

impl std::error::Error for JidParseError {}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.device > 0 {
            write!(f, "{}:{}@{}", self.user, self.device, self.server)
        } else {
            write!(f, "{}@{}", self.user, self.server)
        }
    }
}

impl serde::Serialize for Jid {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Jid {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
