//! Client-side errors.

use thiserror::Error;

/// Result alias for `mirage-client` operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors the client state machine can raise.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A driver call referenced a stream the client has no record of.
    #[error("unknown stream {0}")]
    UnknownStream(u16),

    /// Wire-format error building or parsing a control payload.
    #[error("protocol error: {0}")]
    Protocol(#[from] mirage_proto::ProtocolError),
}
