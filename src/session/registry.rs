use super::{SessionState, SessionStatus, Transition};
use crate::client::{Client, ClientFactory, EventHandler, SessionConfig};
use crate::error::{Error, Result};
use crate::events::Event;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use uuid::Uuid;

struct SessionEntry {
    /// Distinguishes successive clients registered under the same session id.
    instance: Uuid,
    client: Client,
    state: SessionState,
    qr: Option<String>,
}

type Sessions = RwLock<BTreeMap<String, SessionEntry>>;

/// Owned map from session id to client handle.
///
/// Cloning is cheap and every clone sees the same sessions. The map lock is
/// never held across an `.await`.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Sessions>,
    factory: Arc<dyn ClientFactory>,
    data_dir: PathBuf,
    print_qr: bool,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn ClientFactory>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            factory,
            data_dir: data_dir.into(),
            print_qr: false,
        }
    }

    /// Render QR codes to stdout when clients emit them.
    pub fn with_qr_printing(mut self, enabled: bool) -> Self {
        self.print_qr = enabled;
        self
    }

    /// Create, register and initialize a client for `session_id`.
    ///
    /// The id is checked and reserved before the client is created, so of two
    /// concurrent starts for one id exactly one creates a client. If
    /// `initialize` fails the session stays registered and `stop` tears it down.
    pub async fn start(&self, session_id: &str) -> Result<Client> {
        let instance = Uuid::new_v4();
        let client = {
            let mut sessions = self.write()?;
            if sessions.contains_key(session_id) {
                return Err(Error::Conflict);
            }
            let config = SessionConfig::new(session_id, &self.data_dir);
            let client = self.factory.create(config)?;
            sessions.insert(
                session_id.to_string(),
                SessionEntry {
                    instance,
                    client: Arc::clone(&client),
                    state: SessionState::Initializing,
                    qr: None,
                },
            );
            client
        };

        client
            .subscribe(self.event_handler(session_id, instance))
            .await;

        tracing::info!(session_id, "initializing session");
        if let Err(e) = client.initialize().await {
            tracing::error!(session_id, error = %e, "error initializing session");
            return Err(e.into());
        }
        Ok(client)
    }

    /// Destroy the session's client, then unregister it. If teardown fails the
    /// session stays registered.
    pub async fn stop(&self, session_id: &str) -> Result<()> {
        let (instance, client) = {
            let sessions = self.read()?;
            let entry = sessions.get(session_id).ok_or(Error::NotFound)?;
            (entry.instance, Arc::clone(&entry.client))
        };
        client.destroy().await?;
        self.remove_instance(session_id, instance)?;
        tracing::info!(session_id, "session stopped");
        Ok(())
    }

    pub fn get(&self, session_id: &str) -> Result<Client> {
        self.read()?
            .get(session_id)
            .map(|entry| Arc::clone(&entry.client))
            .ok_or(Error::NotFound)
    }

    pub fn contains(&self, session_id: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(session_id))
    }

    /// Registered session ids, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    pub fn status(&self, session_id: &str) -> Result<SessionStatus> {
        let (state, qr, client) = {
            let sessions = self.read()?;
            let entry = sessions.get(session_id).ok_or(Error::NotFound)?;
            (entry.state, entry.qr.clone(), Arc::clone(&entry.client))
        };
        Ok(SessionStatus {
            session_id: session_id.to_string(),
            state,
            qr,
            info: client.info(),
        })
    }

    /// Tear down every session one after another. Failures are logged and the
    /// remaining sessions are still processed.
    pub async fn shutdown_all(&self) -> Result<()> {
        for session_id in self.list()? {
            tracing::info!(session_id = %session_id, "destroying session");
            match self.stop(&session_id).await {
                Ok(()) | Err(Error::NotFound) => {}
                Err(e) => {
                    tracing::error!(session_id = %session_id, error = %e, "error destroying session")
                }
            }
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, SessionEntry>>> {
        self.sessions
            .read()
            .map_err(|e| Error::Registry(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, SessionEntry>>> {
        self.sessions
            .write()
            .map_err(|e| Error::Registry(e.to_string()))
    }

    fn remove_instance(&self, session_id: &str, instance: Uuid) -> Result<()> {
        let mut sessions = self.write()?;
        if sessions
            .get(session_id)
            .is_some_and(|entry| entry.instance == instance)
        {
            sessions.remove(session_id);
        }
        Ok(())
    }

    fn event_handler(&self, session_id: &str, instance: Uuid) -> EventHandler {
        // Weak: the entry owns the client, which owns this handler.
        let sessions = Arc::downgrade(&self.sessions);
        let session_id = session_id.to_string();
        let print_qr = self.print_qr;
        Box::new(move |event| {
            log_event(&session_id, &event, print_qr);
            apply_event(&sessions, &session_id, instance, &event);
        })
    }
}

fn apply_event(sessions: &Weak<Sessions>, session_id: &str, instance: Uuid, event: &Event) {
    let Some(sessions) = sessions.upgrade() else {
        return;
    };
    let Ok(mut sessions) = sessions.write() else {
        tracing::warn!(session_id, "session registry lock poisoned; event dropped");
        return;
    };
    let Some(entry) = sessions.get_mut(session_id) else {
        return;
    };
    if entry.instance != instance {
        tracing::debug!(session_id, event = event.name(), "ignoring event from replaced client");
        return;
    }
    match entry.state.on_event(event) {
        Transition::Stay { state, qr } => {
            entry.state = state;
            entry.qr = qr;
        }
        Transition::Remove => {
            sessions.remove(session_id);
        }
    }
}

fn log_event(session_id: &str, event: &Event, print_qr: bool) {
    match event {
        Event::Qr { code } => {
            tracing::info!(session_id, "QR code received, scan please!");
            if print_qr {
                match crate::pairing::render_qr_terminal(code) {
                    Ok(rendered) => println!("[{session_id}] scan with WhatsApp > Linked devices:\n{rendered}"),
                    Err(e) => tracing::warn!(session_id, error = %e, "could not render QR code"),
                }
            }
        }
        Event::Authenticated => tracing::info!(session_id, "authenticated"),
        Event::AuthFailure { message } => {
            tracing::error!(session_id, message = %message, "authentication failure")
        }
        Event::Ready => tracing::info!(session_id, "client is ready"),
        Event::Disconnected { reason } => {
            tracing::info!(session_id, reason = %reason, "client disconnected")
        }
    }
}
