//! Fixed-size, zero-copy UDP frame header.
//!
//! A `#[repr(C, packed)]` struct with `zerocopy` `FromBytes`/`IntoBytes` so
//! header bytes can be cast from/into network bytes without copying or
//! `unsafe`. Every multi-byte field is stored as a raw `[u8; N]` and
//! read/written with `_le_bytes` conversions to keep the wire layout
//! little-endian throughout.
//!
//! # Wire size
//!
//! the protocol description §3 enumerates fields that sum to exactly 70 bytes but also
//! requires a per-packet `epoch` value (§3 Entities `currentEpoch`, §4.4
//! gating step 2, GLOSSARY) that isn't among the enumerated fields and has
//! no slack to fit in. Rather than silently drop epoch gating or overload an
//! unrelated field, this header is 72 bytes: the 70 enumerated bytes plus an
//! explicit `epoch: u16`. See `DESIGN.md` "Open Question decisions" for the
//! full rationale.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    errors::{ProtocolError, Result},
    flags::FrameFlags,
};

/// Content sub-rectangle of a captured frame buffer (source pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRect {
    /// Left edge, in source pixels.
    pub x: f32,
    /// Top edge, in source pixels.
    pub y: f32,
    /// Width, in source pixels.
    pub w: f32,
    /// Height, in source pixels.
    pub h: f32,
}

/// Tile placement within a frame's capture grid. Only meaningful when
/// [`FrameFlags::tile`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    /// Number of columns in the tile grid.
    pub grid_columns: u16,
    /// Number of rows in the tile grid.
    pub grid_rows: u16,
    /// This tile's column index.
    pub column: u16,
    /// This tile's row index.
    pub row: u16,
    /// Tile's x offset in source pixels.
    pub x: u16,
    /// Tile's y offset in source pixels.
    pub y: u16,
    /// Tile's width in source pixels.
    pub w: u16,
    /// Tile's height in source pixels.
    pub h: u16,
}

/// Fixed 72-byte UDP frame header (little-endian).
///
/// # Invariants
///
/// - `payload_length() as usize + Self::SIZE <= maxPacketSize` is enforced by
///   callers (the sender chooses fragment sizes; the header itself doesn't
///   know `maxPacketSize`).
/// - `fragment_index() < fragment_count()`.
/// - `checksum()` is the CRC-32 ([`crate::crc::crc32`]) of the payload bytes
///   only, never the header.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    magic: [u8; 4],
    version: u8,
    flags: u8,
    stream_id: [u8; 2],
    sequence_number: [u8; 4],
    timestamp_ns: [u8; 8],
    frame_number: [u8; 4],
    fragment_index: [u8; 2],
    fragment_count: [u8; 2],
    payload_length: [u8; 4],
    checksum: [u8; 4],
    epoch: [u8; 2],
    content_rect: [u8; 16],
    tile: [u8; 16],
    dimension_token: [u8; 2],
}

impl FrameHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 72;

    /// Magic number: "MIRG" in ASCII.
    pub const MAGIC: u32 = 0x4D49_5247;

    /// Current protocol version.
    pub const VERSION: u8 = 1;

    /// Build a header from its logical fields. `payload_length` and
    /// `checksum` are filled in separately by the caller once the payload is
    /// known (see [`Self::set_payload`]).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stream_id: u16,
        flags: FrameFlags,
        sequence_number: u32,
        timestamp_ns: u64,
        frame_number: u32,
        fragment_index: u16,
        fragment_count: u16,
        epoch: u16,
        content_rect: ContentRect,
        dimension_token: u16,
    ) -> Self {
        Self {
            magic: Self::MAGIC.to_le_bytes(),
            version: Self::VERSION,
            flags: flags.to_byte(),
            stream_id: stream_id.to_le_bytes(),
            sequence_number: sequence_number.to_le_bytes(),
            timestamp_ns: timestamp_ns.to_le_bytes(),
            frame_number: frame_number.to_le_bytes(),
            fragment_index: fragment_index.to_le_bytes(),
            fragment_count: fragment_count.to_le_bytes(),
            payload_length: 0u32.to_le_bytes(),
            checksum: 0u32.to_le_bytes(),
            epoch: epoch.to_le_bytes(),
            content_rect: encode_content_rect(content_rect),
            tile: [0; 16],
            dimension_token: dimension_token.to_le_bytes(),
        }
    }

    /// Set the tile-info fields and the `tile` flag.
    #[must_use]
    pub fn with_tile(mut self, tile: TileInfo, last_tile: bool) -> Self {
        let mut flags = FrameFlags::from_byte(self.flags).with(FrameFlags::TILE);
        if last_tile {
            flags = flags.with(FrameFlags::LAST_TILE);
        }
        self.flags = flags.to_byte();
        self.tile = encode_tile(tile);
        self
    }

    /// Fill in `payload_length` and `checksum` (CRC-32 over `payload`).
    pub fn set_payload(&mut self, payload: &[u8]) {
        self.payload_length = (payload.len() as u32).to_le_bytes();
        self.checksum = crate::crc::crc32(payload).to_le_bytes();
    }

    /// Serialize to a fixed byte array.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(bytes);
        out
    }

    /// Parse a header from the front of `bytes`.
    ///
    /// Returns `None` if `bytes.len() < Self::SIZE`, magic doesn't match, or
    /// the version is unsupported. Header validation happens before any CRC
    /// check (the protocol description §4.1: "Header validation must happen before CRC").
    #[must_use]
    pub fn deserialize(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let header = Self::read_from_bytes(&bytes[..Self::SIZE]).ok()?;
        if header.magic() != Self::MAGIC || header.version() != Self::VERSION {
            return None;
        }
        Some(header)
    }

    /// Parse a header, returning a typed error instead of `None`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() });
        }
        let header =
            Self::read_from_bytes(&bytes[..Self::SIZE]).map_err(|_| ProtocolError::FrameTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?;
        if header.magic() != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }
        if header.version() != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version()));
        }
        Ok(header)
    }

    /// Magic number (always [`Self::MAGIC`] for a validly-parsed header).
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_le_bytes(self.magic)
    }

    /// Protocol version byte.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Flag bitset.
    #[must_use]
    pub fn flags(&self) -> FrameFlags {
        FrameFlags::from_byte(self.flags)
    }

    /// 16-bit stream identifier.
    #[must_use]
    pub fn stream_id(&self) -> u16 {
        u16::from_le_bytes(self.stream_id)
    }

    /// Monotonic per-datagram sequence number (not per-frame).
    #[must_use]
    pub fn sequence_number(&self) -> u32 {
        u32::from_le_bytes(self.sequence_number)
    }

    /// Presentation timestamp, nanoseconds.
    #[must_use]
    pub fn timestamp_ns(&self) -> u64 {
        u64::from_le_bytes(self.timestamp_ns)
    }

    /// Per-stream monotonic frame number (wraps; see the protocol description §3 "Ordering").
    #[must_use]
    pub fn frame_number(&self) -> u32 {
        u32::from_le_bytes(self.frame_number)
    }

    /// 0-based index of this fragment within its frame.
    #[must_use]
    pub fn fragment_index(&self) -> u16 {
        u16::from_le_bytes(self.fragment_index)
    }

    /// Total fragment count for this frame (data + parity).
    #[must_use]
    pub fn fragment_count(&self) -> u16 {
        u16::from_le_bytes(self.fragment_count)
    }

    /// Payload length in bytes, excluding the header.
    #[must_use]
    pub fn payload_length(&self) -> u32 {
        u32::from_le_bytes(self.payload_length)
    }

    /// CRC-32 of the payload (not the header).
    #[must_use]
    pub fn checksum(&self) -> u32 {
        u32::from_le_bytes(self.checksum)
    }

    /// Current discontinuity epoch.
    #[must_use]
    pub fn epoch(&self) -> u16 {
        u16::from_le_bytes(self.epoch)
    }

    /// Content sub-rectangle, in source pixels.
    #[must_use]
    pub fn content_rect(&self) -> ContentRect {
        decode_content_rect(self.content_rect)
    }

    /// Tile placement, if `flags().tile()` is set.
    #[must_use]
    pub fn tile_info(&self) -> Option<TileInfo> {
        self.flags().tile().then(|| decode_tile(self.tile))
    }

    /// Resize generation token (0 = validation disabled).
    #[must_use]
    pub fn dimension_token(&self) -> u16 {
        u16::from_le_bytes(self.dimension_token)
    }

    /// Verify `checksum()` against the actual payload bytes.
    #[must_use]
    pub fn verify_checksum(&self, payload: &[u8]) -> bool {
        crate::crc::crc32(payload) == self.checksum()
    }
}

fn encode_content_rect(rect: ContentRect) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..4].copy_from_slice(&rect.x.to_bits().to_le_bytes());
    out[4..8].copy_from_slice(&rect.y.to_bits().to_le_bytes());
    out[8..12].copy_from_slice(&rect.w.to_bits().to_le_bytes());
    out[12..16].copy_from_slice(&rect.h.to_bits().to_le_bytes());
    out
}

fn decode_content_rect(bytes: [u8; 16]) -> ContentRect {
    let read = |slice: &[u8]| -> f32 {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(slice);
        f32::from_bits(u32::from_le_bytes(arr))
    };
    ContentRect {
        x: read(&bytes[0..4]),
        y: read(&bytes[4..8]),
        w: read(&bytes[8..12]),
        h: read(&bytes[12..16]),
    }
}

fn encode_tile(tile: TileInfo) -> [u8; 16] {
    let mut out = [0u8; 16];
    let fields = [
        tile.grid_columns,
        tile.grid_rows,
        tile.column,
        tile.row,
        tile.x,
        tile.y,
        tile.w,
        tile.h,
    ];
    for (i, field) in fields.into_iter().enumerate() {
        out[i * 2..i * 2 + 2].copy_from_slice(&field.to_le_bytes());
    }
    out
}

fn decode_tile(bytes: [u8; 16]) -> TileInfo {
    let read = |i: usize| -> u16 {
        let mut arr = [0u8; 2];
        arr.copy_from_slice(&bytes[i * 2..i * 2 + 2]);
        u16::from_le_bytes(arr)
    };
    TileInfo {
        grid_columns: read(0),
        grid_rows: read(1),
        column: read(2),
        row: read(3),
        x: read(4),
        y: read(5),
        w: read(6),
        h: read(7),
    }
}
