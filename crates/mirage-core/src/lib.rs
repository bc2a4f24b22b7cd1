//! Frame buffer pool, reassembler, decode queue, and stream controller for
//! the Mirage video transport.
//!
//! This crate is sans-IO: every state machine (the reassembler, decode
//! queue, resize/freeze/recovery machinery in [`stream_controller`]) takes
//! time as an explicit parameter and returns the actions its driver should
//! perform, rather than touching a clock, a socket, or a channel directly.
//! [`env::Environment`] is the one seam where a driver supplies real or
//! simulated time and randomness.
//!
//! # Modules
//!
//! - [`wraparound`]: wrap-safe frame-number/epoch ordering (§3)
//! - [`buffer_pool`]: capacity-bucketed reusable buffers (§4.3, C3)
//! - [`reassembler`]: per-stream fragment reassembly and FEC recovery (§4.4,
//!   C4)
//! - [`decode_queue`]: bounded FIFO with keyframe-priority eviction (§4.5,
//!   C5)
//! - [`decoder`]: the external decoder contract and error-threshold
//!   tracking (§4.6)
//! - [`stream_controller`]: resize/freeze/recovery/metrics state machines
//!   (§4.6, C6)
//! - [`env`]: time/randomness abstraction for deterministic testing
//! - [`error`]: this crate's error type

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod buffer_pool;
pub mod decode_queue;
pub mod decoder;
pub mod env;
pub mod error;
pub mod reassembler;
pub mod stream_controller;
pub mod wraparound;

pub use buffer_pool::{FrameBufferPool, PooledBuffer};
pub use decode_queue::{DecodeQueue, DecodeQueueConfig, DecodeQueueStats};
pub use decoder::{DecodeErrorTracker, Decoder};
pub use env::{Environment, SystemEnvironment};
pub use error::{CoreError, Result};
pub use reassembler::{CompletedFrame, LossReason, Reassembler, ReassemblerConfig, ReassemblerEvent, ReassemblerStats};
pub use stream_controller::{ControllerAction, MetricsSnapshot, PixelSize, ResizeAction, StreamController};
