//! Seam to the external messaging client.
//!
//! The gateway never speaks the WhatsApp protocol itself. Each session is
//! backed by one [`MessagingClient`] handle produced by a [`ClientFactory`];
//! pairing, transport and credential persistence all live behind these traits.

mod memory;
mod record;
mod send;

use crate::error::ClientResult;
use crate::events::Event;
use crate::types::Jid;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use memory::{MemoryClient, MemoryClientFactory, MemorySeed, Operation, SentMessage};
pub use record::{ChatRecord, ClientInfo, ContactId, ContactRecord, LastMessage};
pub use send::{chat_id_for_phone, SendResponse};

/// Handler invoked for every lifecycle event of one client.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

/// Shared handle to a client instance bound to one session.
pub type Client = Arc<dyn MessagingClient>;

/// Browser flags used when the client drives a headless WhatsApp Web page.
pub const DEFAULT_BROWSER_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--single-process",
    "--disable-gpu",
];

/// Per-session client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub session_id: String,
    /// Directory the client persists its credentials under. One per session.
    pub data_path: PathBuf,
    pub headless: bool,
    pub browser_args: Vec<String>,
}

impl SessionConfig {
    /// Config for `session_id`, namespaced as `<data_dir>/session-<session_id>`.
    pub fn new(session_id: impl Into<String>, data_dir: impl AsRef<Path>) -> Self {
        let session_id = session_id.into();
        let data_path = data_dir.as_ref().join(format!("session-{session_id}"));
        Self {
            session_id,
            data_path,
            headless: true,
            browser_args: DEFAULT_BROWSER_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One external client instance.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Register a lifecycle event handler. Handlers are called in registration order.
    async fn subscribe(&self, handler: EventHandler);

    /// Start the client: restore credentials or begin QR pairing.
    async fn initialize(&self) -> ClientResult<()>;

    /// Tear down the client and release its resources.
    async fn destroy(&self) -> ClientResult<()>;

    /// Account information once the client is ready.
    fn info(&self) -> Option<ClientInfo>;

    async fn send_message(&self, chat_id: &str, body: &str) -> ClientResult<SendResponse>;

    async fn get_contacts(&self) -> ClientResult<Vec<ContactRecord>>;

    async fn get_contact_by_id(&self, contact_id: &str) -> ClientResult<ContactRecord>;

    async fn get_chats(&self) -> ClientResult<Vec<ChatRecord>>;

    /// Contact on the other side of a chat.
    async fn get_chat_contact(&self, chat: &ChatRecord) -> ClientResult<ContactRecord>;

    /// Registered id for a digits-only phone number, `None` if the number is not on WhatsApp.
    async fn get_number_id(&self, phone: &str) -> ClientResult<Option<Jid>>;
}

/// Creates client instances for new sessions.
pub trait ClientFactory: Send + Sync {
    fn create(&self, config: SessionConfig) -> ClientResult<Client>;
}
