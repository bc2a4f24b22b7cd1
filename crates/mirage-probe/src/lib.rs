//! Staged UDP bandwidth quality probe (§4.8 "Quality Probe (C8)").
//!
//! [`search::ProbeSearch`] is a sans-IO state machine: it decides what to
//! measure next and returns [`search::ProbeAction`]s for a driver to
//! execute (send pings, run the codec micro-benchmark, ask the host to
//! emit payload at a target rate), never performing network I/O itself.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod search;

pub use config::ProbeConfig;
pub use error::{ProbeError, Result};
pub use search::{ProbeAction, ProbeSearch};
