//! Headless loopback demo binary for the Mirage video protocol.
//!
//! This crate wires `mirage-app`'s generic [`mirage_app::Runtime`] to a real
//! [`mirage_transport`] control/video channel pair (no ratatui, no
//! crossterm: the protocol description lists UI as an external
//! collaborator and non-goal for the core). It also runs a minimal
//! in-process [`mirage_host::driver::HostDriver`] session on a loopback
//! socket, feeding it a synthetic encoded-frame generator so the full wire
//! path (handshake, stream start, fragmentation, reassembly, decode-queue
//! delivery) is exercised end to end without a real capture/encode/decode
//! pipeline.
//!
//! # Modules
//!
//! - [`cli_driver`]: the [`mirage_app::Driver`] implementation
//! - [`decoder`]: a no-op [`mirage_core::Decoder`] standing in for real HEVC
//!   decode
//! - [`demo_host`]: the loopback host plus its synthetic frame source

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli_driver;
pub mod decoder;
pub mod demo_host;

pub use cli_driver::{CliDriver, CliError};
pub use decoder::NullDecoder;
pub use demo_host::run_demo_host;
