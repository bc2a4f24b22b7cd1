//! Search parameters for the staged bandwidth probe (§4.8).

use std::time::Duration;

/// Tunables for [`crate::search::ProbeSearch`]. Defaults match the protocol description
/// §4.8's named constants exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeConfig {
    /// Delay before the first stage starts, letting the link settle.
    pub warmup: Duration,
    /// Duration each stage spends probing at its target rate.
    pub stage_duration: Duration,
    /// Multiplier applied to the target bitrate between stable stages.
    pub growth_factor: f64,
    /// Improvement threshold below which consecutive stable stages count
    /// toward a plateau.
    pub plateau_delta: f64,
    /// Consecutive plateaued stages that trigger an early stop.
    pub plateau_limit: u32,
    /// Minimum number of measured stages before a plateau or refinement
    /// stop is honored.
    pub min_measurement_stages: u32,
    /// Hard ceiling on the number of growth-phase stages.
    pub max_stages: u32,
    /// Hard ceiling on the number of binary-refinement steps.
    pub max_refine_steps: u32,
    /// Fraction of the target bitrate that measured throughput must reach
    /// for a stage to count as stable.
    pub throughput_floor: f64,
    /// Maximum loss ratio (in `[0, 1]`) for a stage to count as stable.
    pub loss_ceiling: f64,
    /// Starting (and minimum reportable) target bitrate, bits/sec.
    pub min_target_bps: u64,
    /// Upper bound the target bitrate is never grown past, bits/sec.
    pub max_target_bps: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_millis(800),
            stage_duration: Duration::from_millis(1500),
            growth_factor: 1.6,
            plateau_delta: 0.05,
            plateau_limit: 2,
            min_measurement_stages: 3,
            max_stages: 14,
            max_refine_steps: 4,
            throughput_floor: 0.90,
            loss_ceiling: 0.02,
            min_target_bps: 20_000_000,
            max_target_bps: 10_000_000_000,
        }
    }
}
