//! Length-prefixed TCP control envelope.
//!
//! Wire layout: `type:u8 || payloadLen:u32 LE || payload:[u8; payloadLen]`.
//! Header-then-payload framing, with a 5-byte prefix (type + length) rather
//! than a fixed binary header struct, since the control channel has no
//! per-message fixed-size fields beyond type and length.

use bytes::{Buf, BufMut, Bytes};

use crate::errors::ProtocolError;
use crate::opcode::Opcode;

/// Prefix length: 1 byte type + 4 byte little-endian length.
pub const PREFIX_LEN: usize = 5;

/// A single deframed control message: its opcode and raw (still CBOR-encoded)
/// payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Raw wire type byte. Kept even when it doesn't resolve to a known
    /// [`Opcode`] so the caller can log and skip without desyncing.
    pub type_byte: u8,
    /// Payload bytes, not yet opcode-decoded.
    pub payload: Bytes,
}

impl Envelope {
    /// Build an envelope for a known opcode.
    #[must_use]
    pub fn new(opcode: Opcode, payload: impl Into<Bytes>) -> Self {
        Self { type_byte: opcode.to_u8(), payload: payload.into() }
    }

    /// The opcode, if `type_byte` resolves to a known one.
    #[must_use]
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.type_byte)
    }

    /// Encode `type || len || payload` onto `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if `payload.len()` exceeds
    /// `u32::MAX`; no payload this crate's CBOR encoders actually produce
    /// approaches that size, but a caller handing in arbitrary `Bytes`
    /// should get an error rather than a silently truncated length prefix.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<(), ProtocolError> {
        let len = u32::try_from(self.payload.len()).map_err(|_| ProtocolError::PayloadTooLarge {
            size: self.payload.len(),
            max: u32::MAX as usize,
        })?;
        dst.put_u8(self.type_byte);
        dst.put_u32_le(len);
        dst.put_slice(&self.payload);
        Ok(())
    }

    /// Attempt to deframe one envelope from the front of `buf`.
    ///
    /// Returns `None` without consuming anything if `buf` doesn't yet hold a
    /// complete message (the protocol description §4.2: "signals 'more data needed' without
    /// mutating the buffer"). The caller is expected to keep accumulating
    /// bytes from the TCP stream and retry.
    #[must_use]
    pub fn decode(buf: &mut Bytes) -> Option<Self> {
        if buf.len() < PREFIX_LEN {
            return None;
        }
        let type_byte = buf[0];
        let len = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
        if buf.len() < PREFIX_LEN + len {
            return None;
        }
        buf.advance(PREFIX_LEN);
        let payload = buf.split_to(len);
        Some(Self { type_byte, payload })
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn encodes_and_decodes_round_trip() {
        let envelope = Envelope::new(Opcode::Ping, Bytes::new());
        let mut wire = BytesMut::new();
        envelope.encode(&mut wire).expect("encodes");

        let mut buf = wire.freeze();
        let decoded = Envelope::decode(&mut buf).expect("complete message");
        assert_eq!(decoded.opcode(), Some(Opcode::Ping));
        assert!(decoded.payload.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn reports_incomplete_without_consuming() {
        let envelope = Envelope::new(Opcode::Hello, Bytes::from_static(b"abcdef"));
        let mut wire = BytesMut::new();
        envelope.encode(&mut wire).expect("encodes");

        let mut partial = wire.freeze().slice(0..PREFIX_LEN + 2);
        let before = partial.clone();
        assert!(Envelope::decode(&mut partial).is_none());
        assert_eq!(partial, before);
    }

    #[test]
    fn unknown_type_byte_does_not_desync_stream() {
        let mut wire = BytesMut::new();
        wire.put_u8(0x77);
        wire.put_u32_le(3);
        wire.put_slice(b"xyz");
        wire.put_u8(Opcode::Ping.to_u8());
        wire.put_u32_le(0);

        let mut buf = wire.freeze();
        let first = Envelope::decode(&mut buf).expect("unknown-type message still deframes");
        assert_eq!(first.opcode(), None);
        assert_eq!(first.type_byte, 0x77);

        let second = Envelope::decode(&mut buf).expect("second message still aligned");
        assert_eq!(second.opcode(), Some(Opcode::Ping));
    }

    #[test]
    fn decodes_multiple_messages_back_to_back() {
        let mut wire = BytesMut::new();
        Envelope::new(Opcode::Ping, Bytes::new()).encode(&mut wire).expect("encodes");
        Envelope::new(Opcode::Pong, Bytes::new()).encode(&mut wire).expect("encodes");

        let mut buf = wire.freeze();
        assert_eq!(Envelope::decode(&mut buf).unwrap().opcode(), Some(Opcode::Ping));
        assert_eq!(Envelope::decode(&mut buf).unwrap().opcode(), Some(Opcode::Pong));
        assert!(buf.is_empty());
    }
}
