//! Transport-layer errors (§7 "Transport").

use thiserror::Error;

/// Result alias for `mirage-transport` operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised by the control and video channels.
#[derive(Error, Debug)]
pub enum TransportError {
    /// A connect/send/receive was attempted while the control channel was
    /// already mid-handshake.
    #[error("already advertising a connection attempt")]
    AlreadyAdvertising,

    /// An operation requires a connected channel but none is established.
    #[error("not connected")]
    NotConnected,

    /// The connection failed; carries the underlying I/O error.
    #[error("connection failed: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    /// A timed operation (handshake, ping) did not complete in time.
    #[error("operation timed out")]
    Timeout,

    /// A UDP datagram was shorter than the smallest valid packet on that
    /// channel.
    #[error("datagram too short: expected at least {expected} bytes, got {actual}")]
    ShortDatagram {
        /// Minimum required length.
        expected: usize,
        /// Actual datagram length.
        actual: usize,
    },

    /// Wire-format error from `mirage-proto`.
    #[error("protocol error: {0}")]
    Protocol(#[from] mirage_proto::ProtocolError),

    /// Underlying socket I/O error not otherwise classified above.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
