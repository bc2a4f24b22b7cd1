//! Per-stream owner of decoder + reassembler lifecycle, resize state
//! machine, freeze detection, keyframe recovery, and metrics (§4.6,
//! C6).
//!
//! Follows the same action-pattern shape as
//! [`crate::reassembler::Reassembler`]: every method that reacts to time or
//! an event takes `now: I` and returns the [`ControllerAction`]s a driver
//! should execute (send a control message, notify the UI), rather than
//! performing I/O itself.

use std::{collections::VecDeque, time::Duration};

use mirage_proto::StreamId;

use crate::{
    decode_queue::{DecodeQueue, DecodeQueueConfig},
    decoder::{DecodeErrorTracker, Decoder},
    reassembler::{LossReason, Reassembler, ReassemblerConfig, ReassemblerEvent},
};

/// Debounce before a drawable size change is evaluated (§4.6: 200 ms).
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);
/// How long a confirmed resize is held before returning to `Idle` (spec
/// §4.6: 50 ms).
pub const RESIZE_CONFIRM_SETTLE: Duration = Duration::from_millis(50);
/// How long an emitted, unconfirmed resize is held before giving up (spec
/// §4.6: 2 s).
pub const RESIZE_EMIT_EXPIRY: Duration = Duration::from_secs(2);
/// Relative change (aspect or scale) required to re-emit a resize (spec
/// §4.6: "> 0.01").
pub const RESIZE_CHANGE_THRESHOLD: f64 = 0.01;
/// Longest edge of the capped drawable size (§4.6: "cap to 5120×2880").
pub const RESIZE_MAX_SIZE: (u32, u32) = (5120, 2880);

/// Freeze-monitor poll interval (§4.6: 500 ms).
pub const FREEZE_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// How long without a decoded frame before input is considered blocked
/// (§4.6: 5 s).
pub const FREEZE_THRESHOLD: Duration = Duration::from_secs(5);

/// Keyframe-recovery loop poll interval (§4.6: 1 s).
pub const KEYFRAME_RECOVERY_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Minimum time awaiting a keyframe before recovery fires, and the cooldown
/// between recovery requests (§4.6: both use the 3 s keyframe timeout).
pub const KEYFRAME_RECOVERY_COOLDOWN: Duration = Duration::from_secs(3);

/// Metrics snapshot cadence (§4.6: "Every 500 ms, snapshot...").
pub const METRICS_INTERVAL: Duration = Duration::from_millis(500);

/// A pixel dimension pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The dimensions last sent to the host, for change-threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SentDimensions {
    aspect: f64,
    relative_scale: f64,
    pixel: PixelSize,
}

#[derive(Debug, Clone, Copy)]
enum ResizeState<I> {
    Idle,
    Awaiting { pixel_size: PixelSize, screen_size: PixelSize, changed_at: I, emitted_at: Option<I> },
    Confirmed { confirmed_at: I },
}

/// Resize-related action for the driver to execute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeAction {
    /// Tell the host about the new drawable dimensions.
    EmitResize {
        /// Capped, even-rounded pixel size to request.
        pixel_size: PixelSize,
        /// Aspect ratio (width / height) of `pixel_size`.
        aspect: f64,
        /// `min(1, drawable_area / screen_area)`.
        relative_scale: f64,
    },
}

/// The drawable-size debounce and resize-request state machine (§4.6
/// "Resize state machine").
#[derive(Debug, Clone)]
struct ResizeMachine<I> {
    state: ResizeState<I>,
    last_sent: Option<SentDimensions>,
    has_received_first_frame: bool,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> ResizeMachine<I> {
    fn new() -> Self {
        Self { state: ResizeState::Idle, last_sent: None, has_received_first_frame: false }
    }

    fn mark_first_frame_received(&mut self) {
        self.has_received_first_frame = true;
    }

    /// The drawable size changed. Per spec, ignored entirely until the first
    /// frame has been decoded (prevents a spurious resize racing the very
    /// first draw).
    fn on_drawable_size_changed(&mut self, pixel_size: PixelSize, screen_size: PixelSize, now: I) {
        if !self.has_received_first_frame {
            return;
        }
        self.state = ResizeState::Awaiting { pixel_size, screen_size, changed_at: now, emitted_at: None };
    }

    fn confirm(&mut self, now: I) {
        if matches!(self.state, ResizeState::Awaiting { .. }) {
            self.state = ResizeState::Confirmed { confirmed_at: now };
        }
    }

    /// Unconditional return to `Idle` (§4.6: "background/reconnect").
    fn on_background_or_reconnect(&mut self) {
        self.state = ResizeState::Idle;
    }

    fn poll(&mut self, now: I) -> Vec<ResizeAction> {
        let mut actions = Vec::new();
        match self.state {
            ResizeState::Awaiting { pixel_size, screen_size, changed_at, emitted_at: None } => {
                if now - changed_at >= RESIZE_DEBOUNCE {
                    let (aspect, capped, relative_scale) = Self::compute(pixel_size, screen_size);
                    let is_initial_layout = self.last_sent.is_none();
                    let changed = self.last_sent.is_none_or(|sent| {
                        sent.pixel != capped
                            || (sent.aspect - aspect).abs() > RESIZE_CHANGE_THRESHOLD
                            || (sent.relative_scale - relative_scale).abs() > RESIZE_CHANGE_THRESHOLD
                    });
                    if changed && !is_initial_layout {
                        actions.push(ResizeAction::EmitResize { pixel_size: capped, aspect, relative_scale });
                        self.last_sent = Some(SentDimensions { aspect, relative_scale, pixel: capped });
                        self.state =
                            ResizeState::Awaiting { pixel_size, screen_size, changed_at, emitted_at: Some(now) };
                    } else {
                        if is_initial_layout {
                            // Recorded but not emitted (§4.6: "prevents
                            // decoder P-frame discard on first draw").
                            self.last_sent = Some(SentDimensions { aspect, relative_scale, pixel: capped });
                        }
                        self.state = ResizeState::Idle;
                    }
                }
            }
            ResizeState::Awaiting { emitted_at: Some(emitted_at), .. } => {
                if now - emitted_at >= RESIZE_EMIT_EXPIRY {
                    self.state = ResizeState::Idle;
                }
            }
            ResizeState::Confirmed { confirmed_at } => {
                if now - confirmed_at >= RESIZE_CONFIRM_SETTLE {
                    self.state = ResizeState::Idle;
                }
            }
            ResizeState::Idle => {}
        }
        actions
    }

    /// Aspect ratio, capped-and-even-rounded pixel size, and relative scale
    /// for a drawable/screen size pair (§4.6).
    fn compute(pixel_size: PixelSize, screen_size: PixelSize) -> (f64, PixelSize, f64) {
        let aspect = f64::from(pixel_size.width) / f64::from(pixel_size.height).max(1.0);
        let (max_w, max_h) = RESIZE_MAX_SIZE;
        let scale = f64::from(max_w) / f64::from(pixel_size.width).max(1.0);
        let scale = scale.min(f64::from(max_h) / f64::from(pixel_size.height).max(1.0)).min(1.0);
        let capped_w = round_even((f64::from(pixel_size.width) * scale) as u32);
        let capped_h = round_even((f64::from(pixel_size.height) * scale) as u32);
        let capped = PixelSize { width: capped_w, height: capped_h };

        let drawable_area = f64::from(capped_w) * f64::from(capped_h);
        let screen_area = f64::from(screen_size.width) * f64::from(screen_size.height);
        let relative_scale = if screen_area > 0.0 { (drawable_area / screen_area).min(1.0) } else { 1.0 };

        (aspect, capped, relative_scale)
    }
}

fn round_even(value: u32) -> u32 {
    value - (value % 2)
}

/// Freeze-detection monitor (§4.6 "Freeze detection").
#[derive(Debug, Clone)]
struct FreezeMonitor<I> {
    last_decoded_frame_time: Option<I>,
    is_input_blocked: bool,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> FreezeMonitor<I> {
    fn new() -> Self {
        Self { last_decoded_frame_time: None, is_input_blocked: false }
    }

    fn record_decoded_frame(&mut self, now: I) -> Option<bool> {
        self.last_decoded_frame_time = Some(now);
        if self.is_input_blocked {
            self.is_input_blocked = false;
            return Some(false);
        }
        None
    }

    /// Returns `Some(true)` on a freeze->blocked transition; `None` if no
    /// transition occurred (including "no frame decoded yet", which the
    /// monitor only runs once at least one frame has arrived).
    fn poll(&mut self, now: I) -> Option<bool> {
        let last = self.last_decoded_frame_time?;
        if !self.is_input_blocked && now - last > FREEZE_THRESHOLD {
            self.is_input_blocked = true;
            return Some(true);
        }
        None
    }

    fn is_input_blocked(&self) -> bool {
        self.is_input_blocked
    }
}

/// Keyframe-recovery loop (§4.6 "Keyframe recovery loop").
#[derive(Debug, Clone)]
struct KeyframeRecoveryLoop<I> {
    last_recovery_request: Option<I>,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> KeyframeRecoveryLoop<I> {
    fn new() -> Self {
        Self { last_recovery_request: None }
    }

    /// `awaiting_since`: how long the reassembler has been awaiting a
    /// keyframe, if it is. Returns `true` if recovery should fire now.
    fn poll(&mut self, awaiting_since: Option<I>, now: I) -> bool {
        let Some(since) = awaiting_since else { return false };
        if now - since < KEYFRAME_RECOVERY_COOLDOWN {
            return false;
        }
        let cooled_down = self.last_recovery_request.is_none_or(|last| now - last >= KEYFRAME_RECOVERY_COOLDOWN);
        if cooled_down {
            self.last_recovery_request = Some(now);
        }
        cooled_down
    }
}

/// A one-second sliding window of frame arrival instants, used to derive
/// decoded/received FPS (§4.6 "Metrics").
#[derive(Debug, Clone)]
struct FpsWindow<I> {
    timestamps: VecDeque<I>,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> FpsWindow<I> {
    fn new() -> Self {
        Self { timestamps: VecDeque::new() }
    }

    fn record(&mut self, now: I) {
        self.timestamps.push_back(now);
        self.prune(now);
    }

    fn prune(&mut self, now: I) {
        while let Some(&front) = self.timestamps.front() {
            if now - front > Duration::from_secs(1) {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn rate(&mut self, now: I) -> f64 {
        self.prune(now);
        self.timestamps.len() as f64
    }
}

/// Debounces metrics snapshots to the §4.6 500 ms cadence (`tick()` may be
/// driven far more often than that by the transport layer).
#[derive(Debug, Clone)]
struct MetricsDebounce<I> {
    last_emit: Option<I>,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> MetricsDebounce<I> {
    fn new() -> Self {
        Self { last_emit: None }
    }

    /// Returns `true` if a snapshot should be emitted now, and records the
    /// emission.
    fn poll(&mut self, now: I) -> bool {
        let due = self.last_emit.is_none_or(|last| now - last >= METRICS_INTERVAL);
        if due {
            self.last_emit = Some(now);
        }
        due
    }
}

/// A metrics snapshot delivered to the UI (§4.6 "Metrics").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    /// Frames decoded per second over the trailing 1 s window.
    pub decoded_fps: f64,
    /// Frames received (reassembled) per second over the trailing 1 s
    /// window.
    pub received_fps: f64,
    /// `reassembler.dropped_frame_count + queue.dropped_count`.
    pub dropped_frames: u64,
}

/// Actions the driver must execute in response to controller activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerAction {
    /// Apply a resize request, per [`ResizeAction`].
    Resize(ResizeAction),
    /// Input-blocked state changed; notify the UI.
    InputBlockedChanged(bool),
    /// A keyframe is needed; send `keyframeRequest` over the control
    /// channel.
    RequestKeyframe,
    /// Deliver a metrics snapshot to the UI.
    Metrics(MetricsSnapshot),
}

/// Per-stream controller: owns the reassembler, decode queue, decoder, and
/// the resize/freeze/recovery/metrics state machines layered on top of them
/// (§4.6).
pub struct StreamController<I, D: Decoder> {
    stream_id: StreamId,
    decoder: D,
    reassembler: Reassembler<I>,
    queue: DecodeQueue<I>,
    error_tracker: DecodeErrorTracker<I>,
    resize: ResizeMachine<I>,
    freeze: FreezeMonitor<I>,
    recovery: KeyframeRecoveryLoop<I>,
    decoded_window: FpsWindow<I>,
    received_window: FpsWindow<I>,
    metrics: MetricsDebounce<I>,
    stopped: bool,
}

impl<I, D> StreamController<I, D>
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
    D: Decoder,
{
    /// Create a controller for `stream_id`. `decoder` is started immediately.
    pub fn new(
        stream_id: StreamId,
        mut decoder: D,
        reassembler: Reassembler<I>,
        queue_config: DecodeQueueConfig,
    ) -> Self {
        decoder.start_decoding();
        Self {
            stream_id,
            decoder,
            reassembler,
            queue: DecodeQueue::new(queue_config),
            error_tracker: DecodeErrorTracker::new(),
            resize: ResizeMachine::new(),
            freeze: FreezeMonitor::new(),
            recovery: KeyframeRecoveryLoop::new(),
            decoded_window: FpsWindow::new(),
            received_window: FpsWindow::new(),
            metrics: MetricsDebounce::new(),
            stopped: false,
        }
    }

    /// This controller's stream identifier.
    #[must_use]
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Whether input should currently be considered blocked (frozen
    /// stream).
    #[must_use]
    pub fn is_input_blocked(&self) -> bool {
        self.freeze.is_input_blocked()
    }

    /// Ingest one datagram's payload and header, reassembling, queueing, and
    /// decoding as appropriate.
    pub fn ingest_packet(&mut self, payload: &[u8], header: mirage_proto::FrameHeader, now: I) -> Vec<ControllerAction> {
        if self.stopped {
            return Vec::new();
        }
        let mut actions = Vec::new();
        for event in self.reassembler.ingest(payload, header, now) {
            match event {
                ReassemblerEvent::FrameDelivered(frame) => {
                    self.received_window.record(now);
                    self.queue.enqueue(frame, now);
                }
                ReassemblerEvent::LossDetected(LossReason::PFrameTimeout) => {
                    actions.push(ControllerAction::RequestKeyframe);
                }
            }
        }
        actions.extend(self.drain_decode_queue(now));
        actions
    }

    fn drain_decode_queue(&mut self, now: I) -> Vec<ControllerAction> {
        let mut actions = Vec::new();
        while let Some(frame) = self.queue.dequeue() {
            let result =
                self.decoder.decode_frame(frame.bytes.as_bytes(), frame.timestamp_ns, frame.is_keyframe, frame.content_rect);
            match result {
                Ok(()) => {
                    self.error_tracker.record_success();
                    self.decoded_window.record(now);
                    if let Some(false) = self.freeze.record_decoded_frame(now) {
                        actions.push(ControllerAction::InputBlockedChanged(false));
                    }
                    if !self.resize.has_received_first_frame {
                        self.resize.mark_first_frame_received();
                    }
                    if self.decoder.dimension_changed().is_some() {
                        self.reassembler.reset();
                    }
                }
                Err(_err) if self.error_tracker.record_failure(now) => {
                    actions.push(ControllerAction::RequestKeyframe);
                }
                Err(_) => {}
            }
        }
        actions
    }

    /// The drawable size changed; start (or restart) the resize debounce.
    pub fn on_drawable_size_changed(&mut self, pixel_size: PixelSize, screen_size: PixelSize, now: I) {
        self.resize.on_drawable_size_changed(pixel_size, screen_size, now);
    }

    /// The host confirmed a resize with a minimum size.
    pub fn on_resize_confirmed(&mut self, now: I) {
        self.resize.confirm(now);
    }

    /// The app backgrounded or the transport reconnected; abandon any
    /// in-flight resize.
    pub fn on_background_or_reconnect(&mut self) {
        self.resize.on_background_or_reconnect();
    }

    /// Periodic driver tick: polls the resize machine, freeze monitor, and
    /// keyframe recovery loop, and (at the configured interval) emits a
    /// metrics snapshot. Intended to be called roughly every 500 ms, the
    /// finest-grained interval among the sub-systems it drives.
    pub fn tick(&mut self, now: I) -> Vec<ControllerAction> {
        if self.stopped {
            return Vec::new();
        }
        let mut actions = Vec::new();

        for resize_action in self.resize.poll(now) {
            actions.push(ControllerAction::Resize(resize_action));
        }

        if let Some(true) = self.freeze.poll(now) {
            actions.push(ControllerAction::InputBlockedChanged(true));
        }

        let awaiting_since = self.reassembler.awaiting_keyframe_since();
        if self.recovery.poll(awaiting_since, now) {
            actions.extend(self.request_recovery(now));
        }

        if self.metrics.poll(now) {
            actions.push(ControllerAction::Metrics(MetricsSnapshot {
                decoded_fps: self.decoded_window.rate(now),
                received_fps: self.received_window.rate(now),
                dropped_frames: self.reassembler.stats().dropped_frame_count + self.queue.stats().dropped_count,
            }));
        }

        actions
    }

    /// Full stream recovery (§4.6 "Recovery"): cancel resize, reset the
    /// decoder for a new session, reset the reassembler, and arm
    /// keyframe-only mode.
    pub fn request_recovery(&mut self, now: I) -> Vec<ControllerAction> {
        self.resize.on_background_or_reconnect();
        self.decoder.reset_for_new_session();
        self.reassembler.reset();
        self.reassembler.enter_keyframe_only_mode(now);
        vec![ControllerAction::RequestKeyframe]
    }

    /// Stop the controller: cancel timers (implicit — the driver simply
    /// stops calling [`Self::tick`]), drain the decode queue releasing its
    /// buffers, and mark the controller inert.
    pub fn stop(&mut self) {
        self.queue.stop();
        self.stopped = true;
    }

    /// Access to the underlying reassembler's diagnostic counters.
    #[must_use]
    pub fn reassembler(&self) -> &Reassembler<I> {
        &self.reassembler
    }

    /// Enable dimension-token validation at the value the host assigned when
    /// the stream started (§4.4 "Dimension-token update").
    pub fn enable_dimension_token_validation(&mut self, token: u16) {
        self.reassembler.update_expected_dimension_token(token);
    }
}

/// Build a [`Reassembler`] wired with the controller's default config,
/// convenience for callers that don't need a custom [`ReassemblerConfig`].
#[must_use]
pub fn default_reassembler<I: Copy + Ord + std::ops::Sub<Output = Duration>>(
    stream_id: StreamId,
    pool: crate::buffer_pool::FrameBufferPool,
) -> Reassembler<I> {
    Reassembler::new(stream_id, pool, ReassemblerConfig::default())
}

#[cfg(test)]
mod tests {
    use mirage_proto::header::ContentRect;

    use super::*;
    use crate::{buffer_pool::FrameBufferPool, error::CoreError};

    type TestInstant = Duration;

    #[derive(Default)]
    struct FakeDecoder {
        started: bool,
        reset_count: u32,
        fail_next: bool,
        dimension_change: Option<(u32, u32)>,
    }

    impl Decoder for FakeDecoder {
        fn start_decoding(&mut self) {
            self.started = true;
        }

        fn decode_frame(
            &mut self,
            _bytes: &[u8],
            _pts: u64,
            _is_keyframe: bool,
            _rect: ContentRect,
        ) -> std::result::Result<(), CoreError> {
            if self.fail_next {
                Err(CoreError::DecodeFailed("synthetic".into()))
            } else {
                Ok(())
            }
        }

        fn reset_for_new_session(&mut self) {
            self.reset_count += 1;
        }

        fn dimension_changed(&self) -> Option<(u32, u32)> {
            self.dimension_change
        }
    }

    fn controller() -> StreamController<TestInstant, FakeDecoder> {
        let pool = FrameBufferPool::new(4);
        let reassembler = default_reassembler(StreamId(1), pool);
        StreamController::new(StreamId(1), FakeDecoder::default(), reassembler, DecodeQueueConfig::default())
    }

    #[test]
    fn decoder_starts_on_construction() {
        let ctrl = controller();
        assert!(ctrl.decoder.started);
    }

    #[test]
    fn freeze_monitor_transitions_once_after_threshold() {
        let mut ctrl = controller();
        ctrl.freeze.record_decoded_frame(Duration::ZERO);
        let actions = ctrl.tick(Duration::from_secs(6));
        assert!(actions.contains(&ControllerAction::InputBlockedChanged(true)));
        assert!(ctrl.is_input_blocked());

        // A second tick without a new frame must not re-emit the transition.
        let actions = ctrl.tick(Duration::from_secs(7));
        assert!(!actions.contains(&ControllerAction::InputBlockedChanged(true)));
    }

    #[test]
    fn metrics_are_debounced_to_500ms_even_with_frequent_ticks() {
        let mut ctrl = controller();

        // First tick always emits (no prior emission to debounce against).
        let actions = ctrl.tick(Duration::from_millis(0));
        assert!(matches!(actions.as_slice(), [ControllerAction::Metrics(_)]));

        // Driving tick() at a 50 ms cadence (as the transport layer does)
        // must not re-emit metrics until 500 ms have elapsed.
        for ms in (50..500).step_by(50) {
            let actions = ctrl.tick(Duration::from_millis(ms));
            assert!(!actions.iter().any(|a| matches!(a, ControllerAction::Metrics(_))), "emitted early at {ms}ms");
        }

        let actions = ctrl.tick(Duration::from_millis(500));
        assert!(actions.iter().any(|a| matches!(a, ControllerAction::Metrics(_))));
    }

    #[test]
    fn recovery_resets_decoder_and_arms_keyframe_only_mode() {
        let mut ctrl = controller();
        let actions = ctrl.request_recovery(Duration::ZERO);
        assert_eq!(ctrl.decoder.reset_count, 1);
        assert!(ctrl.reassembler.is_awaiting_keyframe());
        assert!(actions.contains(&ControllerAction::RequestKeyframe));
    }

    #[test]
    fn stop_drains_queue_and_ignores_further_packets() {
        let mut ctrl = controller();
        ctrl.stop();
        let header = mirage_proto::FrameHeader::new(
            1,
            mirage_proto::FrameFlags::empty().with(mirage_proto::FrameFlags::KEYFRAME),
            1,
            0,
            1,
            0,
            1,
            0,
            ContentRect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 },
            0,
        );
        let actions = ctrl.ingest_packet(b"x", header, Duration::ZERO);
        assert!(actions.is_empty());
    }

    #[test]
    fn resize_not_emitted_before_first_frame() {
        let mut ctrl = controller();
        ctrl.on_drawable_size_changed(
            PixelSize { width: 1000, height: 800 },
            PixelSize { width: 2000, height: 1600 },
            Duration::ZERO,
        );
        let actions = ctrl.tick(Duration::from_millis(300));
        assert!(!actions.iter().any(|a| matches!(a, ControllerAction::Resize(_))));
    }

    #[test]
    fn initial_layout_recorded_but_not_emitted_then_second_change_emits() {
        let mut machine: ResizeMachine<TestInstant> = ResizeMachine::new();
        machine.mark_first_frame_received();
        let big = PixelSize { width: 4000, height: 2000 };
        let screen = PixelSize { width: 4000, height: 2000 };
        machine.on_drawable_size_changed(big, screen, Duration::ZERO);
        let actions = machine.poll(Duration::from_millis(201));
        assert!(actions.is_empty(), "initial layout must be recorded, not emitted");
        assert!(machine.last_sent.is_some());

        let smaller = PixelSize { width: 1000, height: 2000 };
        machine.on_drawable_size_changed(smaller, screen, Duration::from_millis(201));
        let actions = machine.poll(Duration::from_millis(450));
        assert_eq!(actions.len(), 1, "a materially different size must emit");
    }
}
