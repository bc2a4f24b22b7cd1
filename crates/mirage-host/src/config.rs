//! Host configuration (§6 default `maxPacketSize`, §4.9 pacing).

use std::time::Duration;

/// Host-wide tunables. Constructible from CLI flags in `main.rs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostConfig {
    /// Maximum UDP datagram size; payload capacity per fragment is this
    /// minus `FrameHeader::SIZE` (§6: default 1200).
    pub max_packet_size: usize,
    /// Whether to append per-block XOR parity fragments (§4.9;
    /// host-configurable per Open Question decision 2 in `DESIGN.md`).
    pub fec_enabled: bool,
    /// Keyframe fragments are sent in bursts of this size, with
    /// [`Self::keyframe_pacing_delay`] between bursts, to bound per-burst
    /// byte count (§4.9 "pacing keeps per-burst byte count bounded").
    pub keyframe_pacing_burst_fragments: usize,
    /// Delay inserted between keyframe pacing bursts.
    pub keyframe_pacing_delay: Duration,
    /// Maximum concurrent client sessions.
    pub max_sessions: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_packet_size: 1200,
            fec_enabled: true,
            keyframe_pacing_burst_fragments: 8,
            keyframe_pacing_delay: Duration::from_millis(2),
            max_sessions: 64,
        }
    }
}
