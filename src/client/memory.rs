//! In-process client backend (for development and tests; nothing leaves the process).

use super::{
    ChatRecord, Client, ClientFactory, ClientInfo, ContactId, ContactRecord, EventHandler,
    MessagingClient, SendResponse, SessionConfig,
};
use crate::error::{ClientError, ClientResult};
use crate::events::{DisconnectReason, Event};
use crate::types::{Jid, MessageId};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use sha2::Digest;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Client operations, used to inject failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    Destroy,
    SendMessage,
    GetContacts,
    GetContactById,
    GetChats,
    GetChatContact,
    GetNumberId,
}

/// Account data a [`MemoryClient`] serves.
#[derive(Clone, Debug, Default)]
pub struct MemorySeed {
    pub own_id: Option<Jid>,
    pub pushname: Option<String>,
    pub contacts: Vec<ContactRecord>,
    pub chats: Vec<ChatRecord>,
    /// Numbers reported by `get_number_id` in addition to `@c.us` contacts.
    pub registered: Vec<Jid>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub id: MessageId,
    pub to: String,
    pub body: String,
}

struct MemoryState {
    seed: MemorySeed,
    sent: Vec<SentMessage>,
    failures: HashMap<Operation, ClientError>,
}

/// Client that serves a fixed account from memory and pairs without a phone.
///
/// `initialize` emits a QR code and, unless manual pairing was requested,
/// immediately follows it with `Authenticated` and `Ready`.
pub struct MemoryClient {
    config: SessionConfig,
    auto_pair: bool,
    state: RwLock<MemoryState>,
    handlers: tokio::sync::RwLock<Vec<EventHandler>>,
    initialized: AtomicBool,
    ready: AtomicBool,
    destroyed: AtomicBool,
}

impl MemoryClient {
    pub fn new(config: SessionConfig, seed: MemorySeed) -> Self {
        Self {
            config,
            auto_pair: true,
            state: RwLock::new(MemoryState {
                seed,
                sent: Vec::new(),
                failures: HashMap::new(),
            }),
            handlers: tokio::sync::RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Stop after emitting the QR code; pairing then happens through [`pair`](Self::pair).
    pub fn with_manual_pairing(mut self) -> Self {
        self.auto_pair = false;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Complete pairing as if the QR code had been scanned.
    pub async fn pair(&self) {
        self.dispatch_event(Event::Authenticated).await;
        self.ready.store(true, Ordering::SeqCst);
        self.dispatch_event(Event::Ready).await;
    }

    /// Drop the connection from the remote side.
    pub async fn disconnect(&self, reason: DisconnectReason) {
        self.ready.store(false, Ordering::SeqCst);
        self.destroyed.store(true, Ordering::SeqCst);
        self.dispatch_event(reason.into()).await;
    }

    /// Make every later call of `op` fail with `err`.
    pub fn fail_on(&self, op: Operation, err: ClientError) -> ClientResult<()> {
        self.state_mut()?.failures.insert(op, err);
        Ok(())
    }

    pub fn clear_failure(&self, op: Operation) -> ClientResult<()> {
        self.state_mut()?.failures.remove(&op);
        Ok(())
    }

    pub fn sent_messages(&self) -> ClientResult<Vec<SentMessage>> {
        Ok(self.state()?.sent.clone())
    }

    fn state(&self) -> ClientResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| ClientError::Other(e.to_string()))
    }

    fn state_mut(&self) -> ClientResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|e| ClientError::Other(e.to_string()))
    }

    fn check(&self, op: Operation) -> ClientResult<()> {
        if let Some(err) = self.state()?.failures.get(&op) {
            return Err(err.clone());
        }
        if matches!(op, Operation::Initialize | Operation::Destroy) {
            return Ok(());
        }
        if self.is_destroyed() {
            return Err(ClientError::Destroyed);
        }
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(ClientError::NotInitialized);
        }
        Ok(())
    }

    async fn dispatch_event(&self, event: Event) {
        tracing::debug!(
            session_id = %self.config.session_id,
            event = event.name(),
            "dispatching client event"
        );
        let handlers = self.handlers.read().await;
        for f in handlers.iter() {
            f(event.clone());
        }
    }
}

#[async_trait]
impl MessagingClient for MemoryClient {
    async fn subscribe(&self, handler: EventHandler) {
        self.handlers.write().await.push(handler);
    }

    async fn initialize(&self) -> ClientResult<()> {
        self.check(Operation::Initialize)?;
        if self.is_destroyed() {
            return Err(ClientError::Destroyed);
        }
        self.initialized.store(true, Ordering::SeqCst);
        self.dispatch_event(Event::Qr {
            code: generate_qr_code(),
        })
        .await;
        if self.auto_pair {
            self.pair().await;
        }
        Ok(())
    }

    async fn destroy(&self) -> ClientResult<()> {
        self.check(Operation::Destroy)?;
        self.ready.store(false, Ordering::SeqCst);
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn info(&self) -> Option<ClientInfo> {
        if !self.is_ready() {
            return None;
        }
        let state = self.state().ok()?;
        Some(ClientInfo {
            wid: state
                .seed
                .own_id
                .as_ref()
                .map(|jid| ContactId::parse(jid.to_string()))
                .unwrap_or_default(),
            pushname: state.seed.pushname.clone(),
            platform: Some("memory".to_string()),
        })
    }

    async fn send_message(&self, chat_id: &str, body: &str) -> ClientResult<SendResponse> {
        self.check(Operation::SendMessage)?;
        chat_id
            .parse::<Jid>()
            .map_err(|_| ClientError::InvalidId(chat_id.to_string()))?;
        let id = generate_message_id(chat_id);
        self.state_mut()?.sent.push(SentMessage {
            id: id.clone(),
            to: chat_id.to_string(),
            body: body.to_string(),
        });
        Ok(SendResponse {
            id,
            to: chat_id.to_string(),
            timestamp: SystemTime::now(),
        })
    }

    async fn get_contacts(&self) -> ClientResult<Vec<ContactRecord>> {
        self.check(Operation::GetContacts)?;
        Ok(self.state()?.seed.contacts.clone())
    }

    async fn get_contact_by_id(&self, contact_id: &str) -> ClientResult<ContactRecord> {
        self.check(Operation::GetContactById)?;
        let state = self.state()?;
        if let Some(contact) = state
            .seed
            .contacts
            .iter()
            .find(|c| c.id.serialized == contact_id)
        {
            return Ok(contact.clone());
        }
        // Unknown but well-formed ids still resolve to a bare contact.
        let jid: Jid = contact_id
            .parse()
            .map_err(|_| ClientError::ContactNotFound(contact_id.to_string()))?;
        Ok(ContactRecord {
            id: ContactId::parse(contact_id),
            is_group: jid.is_group(),
            is_user: !jid.is_group(),
            ..ContactRecord::default()
        })
    }

    async fn get_chats(&self) -> ClientResult<Vec<ChatRecord>> {
        self.check(Operation::GetChats)?;
        Ok(self.state()?.seed.chats.clone())
    }

    async fn get_chat_contact(&self, chat: &ChatRecord) -> ClientResult<ContactRecord> {
        self.check(Operation::GetChatContact)?;
        let state = self.state()?;
        let contact = state
            .seed
            .contacts
            .iter()
            .find(|c| c.id.serialized == chat.id.serialized)
            .cloned()
            .unwrap_or_else(|| ContactRecord {
                id: chat.id.clone(),
                name: Some(chat.name.clone()).filter(|n| !n.is_empty()),
                is_group: chat.is_group,
                is_user: !chat.is_group,
                ..ContactRecord::default()
            });
        Ok(contact)
    }

    async fn get_number_id(&self, phone: &str) -> ClientResult<Option<Jid>> {
        self.check(Operation::GetNumberId)?;
        if phone.is_empty() {
            return Ok(None);
        }
        let state = self.state()?;
        if let Some(jid) = state.seed.registered.iter().find(|j| j.user == phone) {
            return Ok(Some(jid.clone()));
        }
        let candidate = Jid::for_phone(phone);
        let serialized = candidate.to_string();
        let known = state
            .seed
            .contacts
            .iter()
            .any(|c| c.id.serialized == serialized);
        Ok(known.then_some(candidate))
    }
}

/// Factory handing out [`MemoryClient`]s that all serve the same seed.
#[derive(Default)]
pub struct MemoryClientFactory {
    seed: MemorySeed,
    manual_pairing: bool,
    created: Mutex<HashMap<String, Arc<MemoryClient>>>,
}

impl MemoryClientFactory {
    pub fn new(seed: MemorySeed) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_manual_pairing(mut self) -> Self {
        self.manual_pairing = true;
        self
    }

    /// Most recent client created for `session_id`.
    pub fn client(&self, session_id: &str) -> Option<Arc<MemoryClient>> {
        self.created.lock().ok()?.get(session_id).cloned()
    }
}

impl ClientFactory for MemoryClientFactory {
    fn create(&self, config: SessionConfig) -> ClientResult<Client> {
        let session_id = config.session_id.clone();
        let mut client = MemoryClient::new(config, self.seed.clone());
        if self.manual_pairing {
            client = client.with_manual_pairing();
        }
        let client = Arc::new(client);
        self.created
            .lock()
            .map_err(|e| ClientError::Other(e.to_string()))?
            .insert(session_id, Arc::clone(&client));
        let handle: Client = client;
        Ok(handle)
    }
}

/// Message id in the WhatsApp Web format (3EB0 + hex of hash).
fn generate_message_id(to: &str) -> MessageId {
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut data = Vec::with_capacity(8 + to.len() + 16);
    data.extend_from_slice(&t.to_be_bytes());
    data.extend_from_slice(to.as_bytes());
    data.extend_from_slice(&rand::random::<[u8; 16]>());
    let hash = sha2::Sha256::digest(&data);
    format!("3EB0{}", hex::encode(&hash[..9]))
}

/// Pairing payload shaped like WhatsApp Web's: `ref,noiseKey,identityKey,advSecret`.
fn generate_qr_code() -> String {
    let mut rng = rand::thread_rng();
    let mut encoded = |len: usize| {
        let mut buf = vec![0u8; len];
        rng.fill_bytes(&mut buf);
        BASE64.encode(buf)
    };
    let reference = encoded(18);
    let noise = encoded(32);
    let identity = encoded(32);
    let adv = encoded(32);
    format!("2@{reference},{noise},{identity},{adv}")
}
