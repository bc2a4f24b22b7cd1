//! TCP control channel and UDP data channel transport for the Mirage video
//! protocol (§4.7 "Transport / Connection Manager").
//!
//! This crate owns byte-stream framing and datagram classification only; it
//! does not decide what to send or when to reconnect. Those policies belong
//! to the driver layer built on top (`mirage-host`, `mirage-client`).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod control;
pub mod error;
pub mod video;

pub use connection::{ConnectionState, ConnectionStateLatch};
pub use control::{ControlChannel, KEEPALIVE_INTERVAL};
pub use error::{Result, TransportError};
pub use video::{VideoChannel, VideoDatagram};
