//! Quality-probe control payloads: codec micro-benchmark and staged
//! bandwidth search, per the protocol description §4.8.

use serde::{Deserialize, Serialize};

/// Request a one-shot codec micro-benchmark (encode on host, decode on
/// client) at a given synthetic resolution/frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityTestRequest {
    /// Synthetic clip width.
    pub width: u32,
    /// Synthetic clip height.
    pub height: u32,
    /// Synthetic clip frame rate.
    pub frame_rate: u32,
}

/// Result of a [`QualityTestRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityTestResult {
    /// Host's average per-frame encode time, milliseconds.
    pub host_encode_ms: f32,
    /// Client's average per-frame decode time, milliseconds.
    pub client_decode_ms: f32,
}

/// Outcome of a single bandwidth-search stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeStageResult {
    /// Stage identifier (0 = warmup).
    pub stage_id: u16,
    /// Target bitrate this stage probed at, bits/sec.
    pub target_bps: u64,
    /// Measured received throughput, bits/sec.
    pub measured_throughput_bps: u64,
    /// Measured loss ratio in `[0, 1]`.
    pub loss_ratio: f32,
    /// Whether this stage met the stability criteria.
    pub stable: bool,
}

/// Final report from a staged bandwidth search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityProbeResult {
    /// Measured round-trip time, milliseconds (median of 3 TCP pings).
    pub rtt_ms: f32,
    /// Loss percent at the last stable stage.
    pub loss_percent: f32,
    /// Estimated maximum stable bitrate, bits/sec.
    pub max_stable_bitrate_bps: u64,
    /// Synthetic benchmark clip width used for the codec micro-benchmark.
    pub benchmark_width: u32,
    /// Synthetic benchmark clip height used for the codec micro-benchmark.
    pub benchmark_height: u32,
    /// Host encode time from the parallel micro-benchmark, milliseconds.
    pub host_encode_ms: f32,
    /// Client decode time from the parallel micro-benchmark, milliseconds.
    pub client_decode_ms: f32,
    /// Per-stage results, in the order they ran.
    pub stages: Vec<ProbeStageResult>,
}
