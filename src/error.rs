use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type of messaging-client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the gateway. Each variant maps onto one HTTP status in
/// [`api`](crate::api).
#[derive(Error, Debug)]
pub enum Error {
    /// A required request field was missing or empty.
    #[error("{0}")]
    Validation(String),

    #[error("Session not found")]
    NotFound,

    #[error("Session already exists")]
    Conflict,

    /// Failure reported by the messaging client; the message is passed through as-is.
    #[error("{0}")]
    External(#[from] ClientError),

    #[error("session registry: {0}")]
    Registry(String),
}

impl Error {
    /// Missing-field validation error with the given message.
    pub fn missing(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Errors raised by a [`MessagingClient`](crate::client::MessagingClient).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("client not initialized")]
    NotInitialized,

    #[error("client was destroyed")]
    Destroyed,

    #[error("no contact found for {0}")]
    ContactNotFound(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("{0}")]
    Other(String),
}
