//! UDP stream-registration packet.
//!
//! Sent once by the client immediately after its UDP socket is up, so the
//! host can associate that UDP peer address with the client's existing TCP
//! session. Shares the `"MIRQ"` magic with [`crate::probe_packet`] but is a
//! distinct, simpler 20-byte format with no other fields.

use crate::errors::{ProtocolError, Result};

/// Fixed 20-byte registration packet: magic + device UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationPacket {
    /// Client's stable device UUID, native byte order (not reinterpreted).
    pub device_id: [u8; 16],
}

impl RegistrationPacket {
    /// Serialized size in bytes.
    pub const SIZE: usize = 20;

    /// Magic bytes: `"MIRQ"`.
    pub const MAGIC: [u8; 4] = *b"MIRQ";

    /// Build a registration packet for `device_id`.
    #[must_use]
    pub fn new(device_id: [u8; 16]) -> Self {
        Self { device_id }
    }

    /// Serialize to a fixed byte array.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&Self::MAGIC);
        out[4..20].copy_from_slice(&self.device_id);
        out
    }

    /// Parse a registration packet from exactly [`Self::SIZE`] bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() });
        }
        if bytes[0..4] != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }
        let mut device_id = [0u8; 16];
        device_id.copy_from_slice(&bytes[4..20]);
        Ok(Self { device_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let packet = RegistrationPacket::new([9u8; 16]);
        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), 20);
        let parsed = RegistrationPacket::parse(&bytes).expect("valid packet");
        assert_eq!(parsed.device_id, [9u8; 16]);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = RegistrationPacket::new([0; 16]).to_bytes();
        bytes[0] = b'X';
        assert!(RegistrationPacket::parse(&bytes).is_err());
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(RegistrationPacket::parse(&[0u8; 5]).is_err());
    }
}
