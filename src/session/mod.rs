//! Session registry: which sessions exist and what their clients last reported.

mod registry;

pub use registry::SessionRegistry;

use crate::client::ClientInfo;
use crate::events::Event;
use serde::Serialize;

/// Last lifecycle state observed for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// `initialize` is running and no event has arrived yet.
    Initializing,
    /// Waiting for the QR code to be scanned.
    Pairing,
    Authenticated,
    Ready,
    AuthFailed,
}

/// Outcome of applying an event to a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Stay registered in the given state; `qr` replaces the stored code.
    Stay {
        state: SessionState,
        qr: Option<String>,
    },
    /// Remove the session from the registry.
    Remove,
}

impl SessionState {
    pub fn on_event(self, event: &Event) -> Transition {
        let stay = |state, qr| Transition::Stay { state, qr };
        match event {
            Event::Qr { code } => stay(SessionState::Pairing, Some(code.clone())),
            Event::Authenticated => stay(SessionState::Authenticated, None),
            Event::Ready => stay(SessionState::Ready, None),
            Event::AuthFailure { .. } => stay(SessionState::AuthFailed, None),
            Event::Disconnected { .. } => Transition::Remove,
        }
    }
}

/// Snapshot returned by [`SessionRegistry::status`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session_id: String,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,
    pub info: Option<ClientInfo>,
}
