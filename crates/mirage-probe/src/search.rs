//! Staged bandwidth search state machine (§4.8).
//!
//! Grounded on `mirage-core::stream_controller`'s sans-IO shape: a struct
//! generic over an opaque instant type `I`, driven by `start`/`tick`/event
//! methods that each return the `Vec<Action>` a driver should execute, never
//! performing I/O itself.

use std::{marker::PhantomData, time::Duration};

use mirage_proto::payloads::probe::{ProbeStageResult, QualityProbeResult};
use tracing::{debug, warn};

use crate::{
    config::ProbeConfig,
    error::{ProbeError, Result},
};

/// Synthetic clip used for the parallel codec micro-benchmark (§4.8
/// step 2: "single 1920×1080 @ 60 fps synthetic clip").
pub const BENCHMARK_WIDTH: u32 = 1920;
/// See [`BENCHMARK_WIDTH`].
pub const BENCHMARK_HEIGHT: u32 = 1080;
/// See [`BENCHMARK_WIDTH`].
pub const BENCHMARK_FRAME_RATE: u32 = 60;

/// Side effect a driver must perform on behalf of the search.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeAction {
    /// Send three TCP pings and report each RTT via `on_rtt_sample`.
    RunRttProbe,
    /// Run the parallel host-encode/client-decode micro-benchmark on the
    /// given synthetic clip and report it via `on_benchmark_result`.
    RunBenchmark {
        /// Clip width.
        width: u32,
        /// Clip height.
        height: u32,
        /// Clip frame rate.
        frame_rate: u32,
    },
    /// Ask the host to emit payload at `target_bps` for `duration`, then
    /// report the measured result via `on_stage_measurement`.
    EmitStage {
        /// Stage identifier, echoed back by `on_stage_measurement`.
        stage_id: u16,
        /// Requested target bitrate, bits/sec.
        target_bps: u64,
        /// How long the host should sustain `target_bps`.
        duration: Duration,
    },
    /// The search has finished; here is the final report.
    Completed(QualityProbeResult),
}

#[derive(Debug, Clone, Copy)]
struct InFlightStage {
    stage_id: u16,
    target_bps: u64,
}

#[derive(Debug, Clone, Copy)]
enum Phase<I> {
    WarmingUp { since: I },
    Growth { last_stable_bps: Option<u64>, plateau_count: u32, stages_run: u32 },
    Refining { low: u64, high: u64, step: u32 },
    Done,
}

/// Staged UDP bandwidth probe search.
pub struct ProbeSearch<I> {
    config: ProbeConfig,
    next_stage_id: u16,
    measured_stages: u32,
    in_flight: Option<InFlightStage>,
    phase: Phase<I>,
    rtt_samples_ms: Vec<f32>,
    benchmark: Option<(f32, f32, u32, u32)>,
    stages: Vec<ProbeStageResult>,
    last_stable_bps: Option<u64>,
    last_loss_ratio: f32,
    _marker: PhantomData<I>,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> ProbeSearch<I> {
    /// Build a fresh, unstarted search.
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            next_stage_id: 1,
            measured_stages: 0,
            in_flight: None,
            phase: Phase::Done,
            rtt_samples_ms: Vec::with_capacity(3),
            benchmark: None,
            stages: Vec::new(),
            last_stable_bps: None,
            last_loss_ratio: 0.0,
            _marker: PhantomData,
        }
    }

    /// Begin the search: request the RTT probe and codec micro-benchmark in
    /// parallel, then wait out the warmup delay before the first stage.
    pub fn start(&mut self, now: I) -> Vec<ProbeAction> {
        self.phase = Phase::WarmingUp { since: now };
        vec![
            ProbeAction::RunRttProbe,
            ProbeAction::RunBenchmark {
                width: BENCHMARK_WIDTH,
                height: BENCHMARK_HEIGHT,
                frame_rate: BENCHMARK_FRAME_RATE,
            },
        ]
    }

    /// Record one TCP-ping round-trip time sample (spec: "median of 3").
    pub fn on_rtt_sample(&mut self, rtt_ms: f32) {
        if self.rtt_samples_ms.len() < 3 {
            self.rtt_samples_ms.push(rtt_ms);
        }
    }

    /// Record the parallel micro-benchmark result.
    pub fn on_benchmark_result(&mut self, host_encode_ms: f32, client_decode_ms: f32, width: u32, height: u32) {
        self.benchmark = Some((host_encode_ms, client_decode_ms, width, height));
    }

    /// Advance time. Only meaningful while warming up: starts the first
    /// stage once the warmup delay has elapsed.
    pub fn tick(&mut self, now: I) -> Vec<ProbeAction> {
        if let Phase::WarmingUp { since } = self.phase {
            if now - since >= self.config.warmup {
                self.phase = Phase::Growth { last_stable_bps: None, plateau_count: 0, stages_run: 0 };
                return self.emit_stage(self.config.min_target_bps);
            }
        }
        Vec::new()
    }

    /// Report the measured outcome of the in-flight stage.
    pub fn on_stage_measurement(
        &mut self,
        stage_id: u16,
        measured_throughput_bps: u64,
        loss_ratio: f32,
    ) -> Result<Vec<ProbeAction>> {
        let in_flight = self.in_flight.ok_or(ProbeError::StageMismatch { reported: stage_id, expected: 0 })?;
        if in_flight.stage_id != stage_id {
            return Err(ProbeError::StageMismatch { reported: stage_id, expected: in_flight.stage_id });
        }
        self.in_flight = None;
        self.measured_stages += 1;

        let target_bps = in_flight.target_bps;
        let floor_bps = (target_bps as f64) * self.config.throughput_floor;
        let stable = (measured_throughput_bps as f64) >= floor_bps && f64::from(loss_ratio) <= self.config.loss_ceiling;

        self.last_loss_ratio = loss_ratio;
        if stable {
            self.last_stable_bps = Some(target_bps);
        }
        self.stages.push(ProbeStageResult { stage_id, target_bps, measured_throughput_bps, loss_ratio, stable });
        debug!(stage_id, target_bps, measured_throughput_bps, loss_ratio, stable, "probe stage measured");

        match self.phase {
            Phase::Growth { last_stable_bps, plateau_count, stages_run } => {
                Ok(self.advance_growth(target_bps, stable, last_stable_bps, plateau_count, stages_run + 1))
            },
            Phase::Refining { low, high, step } => Ok(self.advance_refining(low, high, step, target_bps, stable)),
            Phase::WarmingUp { .. } | Phase::Done => Ok(Vec::new()),
        }
    }

    fn advance_growth(
        &mut self,
        target_bps: u64,
        stable: bool,
        last_stable_bps: Option<u64>,
        plateau_count: u32,
        stages_run: u32,
    ) -> Vec<ProbeAction> {
        if stages_run >= self.config.max_stages {
            self.phase = Phase::Done;
            return vec![self.finalize()];
        }

        if !stable {
            let low = last_stable_bps.unwrap_or(self.config.min_target_bps);
            let high = target_bps;
            if low >= high {
                self.phase = Phase::Done;
                return vec![self.finalize()];
            }
            self.phase = Phase::Refining { low, high, step: 0 };
            return self.emit_stage(geometric_mean(low, high));
        }

        let improvement = last_stable_bps.map_or(f64::INFINITY, |prev| (target_bps as f64 - prev as f64) / prev as f64);
        let plateaued = improvement < self.config.plateau_delta;
        let next_plateau_count = if plateaued { plateau_count + 1 } else { 0 };

        if next_plateau_count >= self.config.plateau_limit && self.measured_stages >= self.config.min_measurement_stages {
            self.phase = Phase::Done;
            return vec![self.finalize()];
        }

        let grown = ((target_bps as f64) * self.config.growth_factor) as u64;
        let next_target = grown.min(self.config.max_target_bps);
        if next_target <= target_bps {
            self.phase = Phase::Done;
            return vec![self.finalize()];
        }

        self.phase = Phase::Growth { last_stable_bps: Some(target_bps), plateau_count: next_plateau_count, stages_run };
        self.emit_stage(next_target)
    }

    fn advance_refining(&mut self, low: u64, high: u64, step: u32, target_bps: u64, stable: bool) -> Vec<ProbeAction> {
        let (low, high) = if stable { (target_bps, high) } else { (low, target_bps) };
        let next_step = step + 1;
        let ratio = if low == 0 { f64::INFINITY } else { high as f64 / low as f64 };

        let done = ratio <= 1.1 || (next_step >= self.config.max_refine_steps && self.measured_stages >= self.config.min_measurement_stages);
        if done {
            self.last_stable_bps = Some(self.last_stable_bps.unwrap_or(low).max(low));
            self.phase = Phase::Done;
            return vec![self.finalize()];
        }

        self.phase = Phase::Refining { low, high, step: next_step };
        self.emit_stage(geometric_mean(low, high))
    }

    fn emit_stage(&mut self, target_bps: u64) -> Vec<ProbeAction> {
        let stage_id = self.next_stage_id;
        self.next_stage_id += 1;
        self.in_flight = Some(InFlightStage { stage_id, target_bps });
        vec![ProbeAction::EmitStage { stage_id, target_bps, duration: self.config.stage_duration }]
    }

    fn finalize(&self) -> ProbeAction {
        if self.benchmark.is_none() {
            warn!("quality probe finished before the codec micro-benchmark reported a result");
        }
        let (host_encode_ms, client_decode_ms, benchmark_width, benchmark_height) =
            self.benchmark.unwrap_or((0.0, 0.0, BENCHMARK_WIDTH, BENCHMARK_HEIGHT));
        let rtt_ms = median(&self.rtt_samples_ms);
        let max_stable_bitrate_bps = self.last_stable_bps.unwrap_or(self.config.min_target_bps).max(self.config.min_target_bps);

        ProbeAction::Completed(QualityProbeResult {
            rtt_ms,
            loss_percent: self.last_loss_ratio * 100.0,
            max_stable_bitrate_bps,
            benchmark_width,
            benchmark_height,
            host_encode_ms,
            client_decode_ms,
            stages: self.stages.clone(),
        })
    }
}

fn geometric_mean(low: u64, high: u64) -> u64 {
    ((low as f64) * (high as f64)).sqrt() as u64
}

fn median(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted[sorted.len() / 2]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct FakeInstant(u64);

    impl std::ops::Sub for FakeInstant {
        type Output = Duration;

        fn sub(self, rhs: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(rhs.0))
        }
    }

    fn advance(search: &mut ProbeSearch<FakeInstant>, now: &mut FakeInstant, ms: u64) -> Vec<ProbeAction> {
        now.0 += ms;
        search.tick(*now)
    }

    #[test]
    fn starts_with_rtt_and_benchmark_requests() {
        let mut search = ProbeSearch::new(ProbeConfig::default());
        let actions = search.start(FakeInstant(0));
        assert!(actions.contains(&ProbeAction::RunRttProbe));
        assert!(actions.iter().any(|a| matches!(a, ProbeAction::RunBenchmark { .. })));
    }

    #[test]
    fn waits_out_warmup_before_first_stage() {
        let mut search = ProbeSearch::new(ProbeConfig::default());
        let mut now = FakeInstant(0);
        search.start(now);

        assert!(advance(&mut search, &mut now, 500).is_empty());
        let actions = advance(&mut search, &mut now, 400);
        match &actions[0] {
            ProbeAction::EmitStage { target_bps, .. } => assert_eq!(*target_bps, 20_000_000),
            other => panic!("expected first stage, got {other:?}"),
        }
    }

    #[test]
    fn grows_target_on_stable_stages_and_plateaus_to_completion() {
        let mut search = ProbeSearch::new(ProbeConfig::default());
        let mut now = FakeInstant(0);
        search.start(now);
        advance(&mut search, &mut now, 900);

        let mut last_target = 20_000_000u64;
        let mut completed = None;
        for stage_id in 1..20u16 {
            let actions = search.on_stage_measurement(stage_id, last_target, 0.0).expect("known stage");
            match &actions[0] {
                ProbeAction::EmitStage { target_bps, .. } => last_target = *target_bps,
                ProbeAction::Completed(result) => {
                    completed = Some(result.clone());
                    break;
                },
                other => panic!("unexpected action {other:?}"),
            }
        }
        let result = completed.expect("search should converge to a report");
        assert!(result.max_stable_bitrate_bps >= 20_000_000);
        assert!(!result.stages.is_empty());
    }

    #[test]
    fn unstable_stage_after_a_stable_one_enters_refinement() {
        let mut search = ProbeSearch::new(ProbeConfig::default());
        let mut now = FakeInstant(0);
        search.start(now);
        advance(&mut search, &mut now, 900);

        let grown_target = match &search.on_stage_measurement(1, 20_000_000, 0.0).expect("known stage")[0] {
            ProbeAction::EmitStage { target_bps, .. } => *target_bps,
            other => panic!("expected a growth probe, got {other:?}"),
        };
        assert!(grown_target > 20_000_000);

        let actions = search.on_stage_measurement(2, 1, 0.50).expect("known stage");
        match &actions[0] {
            ProbeAction::EmitStage { target_bps, .. } => {
                assert!(*target_bps > 20_000_000 && *target_bps < grown_target);
            },
            other => panic!("expected a refinement probe, got {other:?}"),
        }
    }

    #[test]
    fn an_unstable_minimum_target_stage_finalizes_at_the_floor() {
        let mut search = ProbeSearch::new(ProbeConfig::default());
        let mut now = FakeInstant(0);
        search.start(now);
        advance(&mut search, &mut now, 900);

        let actions = search.on_stage_measurement(1, 1, 0.50).expect("known stage");
        match &actions[0] {
            ProbeAction::Completed(result) => assert_eq!(result.max_stable_bitrate_bps, 20_000_000),
            other => panic!("expected the search to finalize at the floor, got {other:?}"),
        }
    }

    #[test]
    fn rejects_a_measurement_for_the_wrong_stage() {
        let mut search = ProbeSearch::new(ProbeConfig::default());
        let mut now = FakeInstant(0);
        search.start(now);
        advance(&mut search, &mut now, 900);

        assert!(search.on_stage_measurement(99, 1, 0.0).is_err());
    }
}
