//! Mirage host: control-channel session driver and UDP packet sender
//! (§4.7, §4.9, §6).
//!
//! This crate owns session bookkeeping and datagram fragmentation; it does
//! not capture the screen or encode video (out of scope, §1). The
//! binary wires [`driver::HostDriver`] to `mirage-transport`'s channels and
//! expects encoded frames from an external source.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod packet_sender;
pub mod storage;

pub use config::HostConfig;
pub use driver::{HostAction, HostDriver, HostEvent, LogLevel, SUPPORTED_PROTOCOL_VERSION};
pub use error::{HostError, Result};
pub use packet_sender::{EncodedFrame, PacedBurst, PacketSender};
pub use storage::{CodecBenchmarkRecord, RECORD_VERSION};
