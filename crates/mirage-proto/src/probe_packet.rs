//! Quality-probe UDP packet header.
//!
//! Grounded on `crate::header` for the zero-copy `zerocopy` struct shape, and
//! on `examples/other_examples/..._video_sender.rs` for the
//! fixed-header-then-payload UDP datagram idiom. Distinct wire format from
//! [`crate::header::FrameHeader`]: probe packets carry a `testID` instead of
//! a `streamID`/`frameNumber`, and no CRC (loss/throughput measurement
//! doesn't need payload integrity, just byte counting).

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};

/// Fixed 37-byte probe packet header (little-endian).
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct ProbeHeader {
    magic: [u8; 4],
    version: u8,
    stage_id: [u8; 2],
    sequence: [u8; 4],
    timestamp_ns: [u8; 8],
    test_id: [u8; 16],
    payload_length: [u8; 2],
}

impl ProbeHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 37;

    /// Magic number: "MIRQ" in ASCII, shared with the UDP registration packet.
    pub const MAGIC: u32 = 0x4D49_5251;

    /// Current probe protocol version.
    pub const VERSION: u8 = 1;

    /// Build a probe header. `test_id` is the raw 16-byte UUID, carried
    /// verbatim in whatever byte order the caller already has it in
    /// (the protocol description §9: endianness of `testID` bytes is a platform convention
    /// that must simply be symmetric between ends, not reinterpreted here).
    #[must_use]
    pub fn new(
        stage_id: u16,
        sequence: u32,
        timestamp_ns: u64,
        test_id: [u8; 16],
        payload_length: u16,
    ) -> Self {
        Self {
            magic: Self::MAGIC.to_le_bytes(),
            version: Self::VERSION,
            stage_id: stage_id.to_le_bytes(),
            sequence: sequence.to_le_bytes(),
            timestamp_ns: timestamp_ns.to_le_bytes(),
            test_id,
            payload_length: payload_length.to_le_bytes(),
        }
    }

    /// Serialize to a fixed byte array.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(bytes);
        out
    }

    /// Parse a probe header from the front of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() });
        }
        let header = Self::read_from_bytes(&bytes[..Self::SIZE])
            .map_err(|_| ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() })?;
        if header.magic() != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }
        if header.version() != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version()));
        }
        Ok(header)
    }

    /// Magic number.
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_le_bytes(self.magic)
    }

    /// Protocol version byte.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Bandwidth-search stage this packet belongs to.
    #[must_use]
    pub fn stage_id(&self) -> u16 {
        u16::from_le_bytes(self.stage_id)
    }

    /// Per-stage monotonic sequence number.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        u32::from_le_bytes(self.sequence)
    }

    /// Send timestamp, nanoseconds.
    #[must_use]
    pub fn timestamp_ns(&self) -> u64 {
        u64::from_le_bytes(self.timestamp_ns)
    }

    /// Raw test-run identifier bytes.
    #[must_use]
    pub fn test_id(&self) -> [u8; 16] {
        self.test_id
    }

    /// Declared filler-payload length in bytes.
    #[must_use]
    pub fn payload_length(&self) -> u16 {
        u16::from_le_bytes(self.payload_length)
    }
}

/// Maximum probe payload for a given `maxPacketSize`, clamped to >= 0.
#[must_use]
pub fn probe_payload_size(max_packet_size: usize) -> usize {
    max_packet_size.saturating_sub(ProbeHeader::SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_37_bytes() {
        assert_eq!(ProbeHeader::SIZE, 37);
        assert_eq!(std::mem::size_of::<ProbeHeader>(), 37);
    }

    #[test]
    fn round_trips_through_bytes() {
        let test_id = [7u8; 16];
        let header = ProbeHeader::new(3, 42, 123_456_789, test_id, 1100);
        let bytes = header.to_bytes();
        let parsed = ProbeHeader::parse(&bytes).expect("valid probe header");

        assert_eq!(parsed.stage_id(), 3);
        assert_eq!(parsed.sequence(), 42);
        assert_eq!(parsed.timestamp_ns(), 123_456_789);
        assert_eq!(parsed.test_id(), test_id);
        assert_eq!(parsed.payload_length(), 1100);
    }

    #[test]
    fn payload_size_matches_spec_formula() {
        assert_eq!(probe_payload_size(1200), 1163);
        assert_eq!(probe_payload_size(10), 0);
    }

    #[test]
    fn parse_rejects_short_and_bad_magic() {
        assert!(ProbeHeader::parse(&[0u8; 10]).is_err());

        let mut bytes = ProbeHeader::new(0, 0, 0, [0; 16], 0).to_bytes();
        bytes[0] ^= 0xFF;
        assert!(ProbeHeader::parse(&bytes).is_err());
    }
}
