//! Errors raised by the quality-probe search (§7).

use thiserror::Error;

/// Result alias for `mirage-probe` operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors the probe search can raise.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A stage measurement arrived for a stage the search is not currently
    /// running.
    #[error("stage {reported} does not match the in-flight stage {expected}")]
    StageMismatch {
        /// Stage ID the caller reported.
        reported: u16,
        /// Stage ID the search was actually waiting on.
        expected: u16,
    },

    /// The search was asked to report a result before any stage completed.
    #[error("no stable stage has been measured yet")]
    NoStableStage,

    /// Wire-format error building or parsing a probe packet.
    #[error("protocol error: {0}")]
    Protocol(#[from] mirage_proto::ProtocolError),
}
