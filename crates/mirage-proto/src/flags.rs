//! Per-packet [`FrameFlags`] bitset.
//!
//! the protocol description §3 names ten conceptual flags but specifies only a single wire
//! byte for them. Eight are genuinely per-packet and gate reassembly
//! decisions (the protocol description §4.4): those get the eight wire bits. The remaining
//! two (`loginDisplay`, `desktopStream`) describe the *stream* as a whole —
//! they're established once via `streamStarted`/`startDesktopStream` and
//! never change packet-to-packet — so they live in stream-level control
//! state (`mirage-host`'s session bookkeeping) rather than being re-sent on
//! every datagram. See `DESIGN.md` for the full rationale.

/// Bit flags carried in the single `flags` byte of [`crate::FrameHeader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// Frame is a keyframe (IDR), self-contained and not predicted.
    pub const KEYFRAME: u8 = 1 << 0;
    /// This fragment is the last fragment of the frame.
    pub const END_OF_FRAME: u8 = 1 << 1;
    /// Payload carries parameter sets (VPS/SPS/PPS) rather than slice data.
    pub const PARAMETER_SET: u8 = 1 << 2;
    /// Host signals a hard stream discontinuity (reconfiguration).
    pub const DISCONTINUITY: u8 = 1 << 3;
    /// Fragment should be prioritized by the transport when pacing.
    pub const PRIORITY: u8 = 1 << 4;
    /// Frame is split into capture tiles; tile info fields are valid.
    pub const TILE: u8 = 1 << 5;
    /// This is the last tile of the frame's tile grid.
    pub const LAST_TILE: u8 = 1 << 6;
    /// Fragment carries XOR parity data, not frame data.
    pub const FEC_PARITY: u8 = 1 << 7;

    /// Construct from the raw wire byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Raw wire byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// Empty flag set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Set a bit (by its `Self::FOO` constant) and return the updated value.
    #[must_use]
    pub const fn with(self, bit: u8) -> Self {
        Self(self.0 | bit)
    }

    fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    /// Frame is a keyframe.
    #[must_use]
    pub fn keyframe(self) -> bool {
        self.has(Self::KEYFRAME)
    }

    /// Fragment is the frame's last fragment.
    #[must_use]
    pub fn end_of_frame(self) -> bool {
        self.has(Self::END_OF_FRAME)
    }

    /// Payload carries parameter sets.
    #[must_use]
    pub fn parameter_set(self) -> bool {
        self.has(Self::PARAMETER_SET)
    }

    /// Hard discontinuity signal.
    #[must_use]
    pub fn discontinuity(self) -> bool {
        self.has(Self::DISCONTINUITY)
    }

    /// Pacing priority hint.
    #[must_use]
    pub fn priority(self) -> bool {
        self.has(Self::PRIORITY)
    }

    /// Frame uses tiled capture; tile info fields are populated.
    #[must_use]
    pub fn tile(self) -> bool {
        self.has(Self::TILE)
    }

    /// Last tile of the frame's grid.
    #[must_use]
    pub fn last_tile(self) -> bool {
        self.has(Self::LAST_TILE)
    }

    /// Fragment carries FEC parity data.
    #[must_use]
    pub fn fec_parity(self) -> bool {
        self.has(Self::FEC_PARITY)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameFlags;

    #[test]
    fn round_trips_through_byte() {
        let flags = FrameFlags::empty().with(FrameFlags::KEYFRAME).with(FrameFlags::LAST_TILE);
        let byte = flags.to_byte();
        let restored = FrameFlags::from_byte(byte);
        assert!(restored.keyframe());
        assert!(restored.last_tile());
        assert!(!restored.tile());
    }

    #[test]
    fn empty_has_no_flags_set() {
        let flags = FrameFlags::empty();
        assert!(!flags.keyframe());
        assert!(!flags.fec_parity());
    }
}
