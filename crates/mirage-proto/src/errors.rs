//! Protocol-level error types.
//!
//! A single flat `ProtocolError` enum for wire-format violations, kept
//! separate from the connection/session-level errors layered on top in
//! `mirage-core`.

use thiserror::Error;

/// Result alias for protocol parsing/encoding operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from parsing or encoding wire-format data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer shorter than the structure being parsed requires.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum required length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// Magic number didn't match.
    #[error("invalid magic number")]
    InvalidMagic,

    /// Protocol version not supported by this build.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Payload length exceeds the configured limit.
    #[error("payload too large: {size} bytes, max {max}")]
    PayloadTooLarge {
        /// Actual payload size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Header claims a payload length that doesn't match the bytes present.
    #[error("payload length mismatch: header claims {claimed}, buffer has {actual}")]
    PayloadLengthMismatch {
        /// Length claimed in the header.
        claimed: usize,
        /// Length actually available.
        actual: usize,
    },

    /// CRC-32 over the payload didn't match the header's checksum.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Unrecognized control-channel opcode.
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// CBOR payload didn't decode to the schema expected for its opcode.
    #[error("invalid payload for opcode {opcode:#04x}: {reason}")]
    InvalidPayload {
        /// Opcode the payload was read for.
        opcode: u8,
        /// Decoder error message.
        reason: String,
    },

    /// `fragmentIndex >= fragmentCount`.
    #[error("invalid fragment index: {index} >= fragment count {count}")]
    InvalidFragmentIndex {
        /// The offending index.
        index: u16,
        /// The frame's declared fragment count.
        count: u16,
    },
}
