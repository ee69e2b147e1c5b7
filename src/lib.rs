//! # whatsapp-gateway
//!
//! HTTP gateway that runs several independent WhatsApp Web sessions side by
//! side and exposes them through a small REST API.
//!
//! ## Features
//!
//! - Start/stop sessions keyed by caller-chosen ids, with QR pairing
//! - Send text messages to phone numbers
//! - List contacts and chats, recovering phone numbers where the id allows it
//!   (including contacts that only expose a linked `@lid` identifier)
//! - Check whether a phone number is registered on WhatsApp
//!
//! The protocol itself lives behind [`MessagingClient`]; sessions are created
//! through a [`ClientFactory`]. [`MemoryClientFactory`] serves accounts from
//! memory for development and tests.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use whatsapp_gateway::{api, client::MemoryClientFactory, SessionRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let factory = Arc::new(MemoryClientFactory::default());
//!     let registry = SessionRegistry::new(factory, ".wwebjs_auth");
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     api::serve(listener, api::ApiState::new(registry), std::future::pending()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod contact;
pub mod error;
pub mod events;
pub mod pairing;
pub mod session;
pub mod types;

pub use client::{ClientFactory, MemoryClientFactory, MessagingClient, SessionConfig};
pub use config::Config;
pub use contact::{extract_phone, format_contact_info, ContactInfo};
pub use error::{ClientError, Error, Result};
pub use events::Event;
pub use session::SessionRegistry;
pub use types::{Identifier, Jid};
