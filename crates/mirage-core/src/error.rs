//! `mirage-core` error types.
//!
//! Reassembly failures (CRC, token, epoch, old-frame, awaiting-keyframe) are
//! deliberately *not* errors (the protocol description §7: "silent drops; they never surface
//! to the user") — they're counters on [`crate::reassembler::ReassemblerStats`].
//! [`CoreError`] covers the smaller set of failures that are genuinely
//! exceptional at this layer: decoder-reported faults and misuse of the
//! stream controller's public API.

use thiserror::Error;

/// Result alias for `mirage-core` operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by the decode queue, stream controller, or decoder
/// contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The decoder reported it could not process a frame's bytes.
    #[error("decoder rejected frame data: {0}")]
    DecodeFailed(String),

    /// The decoder's session is no longer valid and must be recreated.
    #[error("decoder session invalid, recreation required")]
    InvalidSession,

    /// A frame referenced decoder state (e.g. a reference picture) that is
    /// no longer available.
    #[error("decoder missing reference frame")]
    ReferenceMissing,

    /// An operation was attempted on a stream controller that has already
    /// been stopped.
    #[error("stream controller already stopped")]
    AlreadyStopped,
}
