//! Host-side errors (§7).

use thiserror::Error;

/// Result alias for `mirage-host` operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors the host driver and packet sender can raise.
#[derive(Error, Debug)]
pub enum HostError {
    /// A control message referenced a session the driver has no record of.
    #[error("unknown session {0}")]
    UnknownSession(u64),

    /// A control message referenced a stream the session never started.
    #[error("session {session_id} has no stream {stream_id}")]
    UnknownStream {
        /// Session that sent the message.
        session_id: u64,
        /// Stream ID it referenced.
        stream_id: u16,
    },

    /// A fragment payload would need more fragments than `u16` can index.
    #[error("frame too large to fragment: {byte_count} bytes at {max_payload_size} bytes/fragment")]
    FrameTooLarge {
        /// Total encoded frame size.
        byte_count: usize,
        /// Configured maximum payload per fragment.
        max_payload_size: usize,
    },

    /// Wire-format error building a control or video payload.
    #[error("protocol error: {0}")]
    Protocol(#[from] mirage_proto::ProtocolError),

    /// Transport-layer error sending or receiving.
    #[error("transport error: {0}")]
    Transport(#[from] mirage_transport::TransportError),

    /// Codec benchmark record could not be read or written to the cache
    /// directory.
    #[error("codec benchmark storage error: {0}")]
    Storage(#[source] std::io::Error),

    /// Codec benchmark record on disk didn't decode as CBOR.
    #[error("codec benchmark record is corrupt: {0}")]
    CorruptBenchmarkRecord(String),
}
