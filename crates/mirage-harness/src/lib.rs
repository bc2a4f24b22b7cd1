//! Deterministic simulation harness for the Mirage video transport.
//!
//! [`SimEnv`] supplies [`mirage_core::Environment`] backed by turmoil's
//! virtual clock and a seeded RNG, so the resize debounce, freeze monitor,
//! and keyframe recovery timers in `mirage-core::stream_controller` run
//! under simulated time. [`sim_host::SimHost`] wraps `mirage-host`'s
//! sans-IO [`mirage_host::driver::HostDriver`] over turmoil sockets, wire
//! compatible with a real `mirage-host` binary, for chaos-network
//! (partition, latency, packet loss) integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod sim_host;

pub use env::SimEnv;
pub use sim_host::SimHost;
