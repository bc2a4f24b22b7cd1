//! Client
//!
//! Sans-IO client state machine for the Mirage video protocol. Manages the
//! handshake with one host and the [`mirage_core::stream_controller::StreamController`]
//! backing each stream currently open against it.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and action-based pattern as
//! [`mirage_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`])
//! for the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: top-level state machine managing the host connection and
//!   its streams
//! - [`ClientEvent`]: events fed into the client
//! - [`ClientAction`]: actions produced by the client
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedClient`]: client wired to TCP/UDP transport
//! - [`transport::connect`]: connect to a host

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::{Client, ClientIdentity, PROTOCOL_VERSION};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent};
