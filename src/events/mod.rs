//! Lifecycle events emitted by a messaging client.

use std::fmt;

/// Events delivered to handlers registered with
/// [`MessagingClient::subscribe`](crate::client::MessagingClient::subscribe).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// QR payload to scan from the phone's "Linked devices" screen. Emitted
    /// again each time the previous code expires.
    Qr { code: String },

    /// Pairing accepted; credentials are persisted by the client.
    Authenticated,

    /// Stored credentials were rejected or pairing failed.
    AuthFailure { message: String },

    /// Client is connected and ready to serve requests.
    Ready,

    /// Connection closed by the remote side or by logout.
    Disconnected { reason: String },
}

impl Event {
    /// Event name as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Qr { .. } => "qr",
            Self::Authenticated => "authenticated",
            Self::AuthFailure { .. } => "auth_failure",
            Self::Ready => "ready",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}

/// Disconnect reasons reported by WhatsApp Web.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    Navigation,
    Conflict,
    Logout,
    Unpaired,
    UnpairedIdle,
    Timeout,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Navigation => "NAVIGATION",
            Self::Conflict => "CONFLICT",
            Self::Logout => "LOGOUT",
            Self::Unpaired => "UNPAIRED",
            Self::UnpairedIdle => "UNPAIRED_IDLE",
            Self::Timeout => "TIMEOUT",
        };
        f.write_str(s)
    }
}

impl From<DisconnectReason> for Event {
    fn from(reason: DisconnectReason) -> Self {
        Self::Disconnected {
            reason: reason.to_string(),
        }
    }
}
