//! Per-stream fragment reassembly (§4.4, C4).
//!
//! Sans-IO: [`Reassembler::ingest`] takes one datagram's payload and header
//! and returns the events the driver should act on ([`ReassemblerEvent`]);
//! [`Reassembler::check_timeouts`] is polled periodically by a driver timer
//! task (§5 "Timer tasks"), mirroring the reassembler's own
//! pure-state-machine shape in spirit — state mutation lives here, I/O and
//! scheduling live in the driver.
//!
//! # `dataFragmentCount` without a `frameByteCount` field
//!
//! the protocol description §4.4 derives `dataFragmentCount` from a `frameByteCount` header
//! field that §3's `FrameHeader` layout never actually defines (only
//! `fragmentCount` is wire-present). Resolved here, consistently with
//! `mirage-proto`'s header: `fragmentCount` *is* the data-fragment count.
//! Parity fragments are sent with `fragmentIndex` values continuing past
//! `fragmentCount` (one per FEC block) with the `fecParity` flag set — this
//! is exactly the "index ≥ dataFragmentCount OR fecParity flag" disjunction
//! §4.4 already describes for classifying a fragment as parity, so no
//! extra wire field is needed. See `DESIGN.md`.

use std::{collections::HashMap, time::Duration};

use mirage_proto::{header::ContentRect, FrameHeader, StreamId};
use tracing::debug;

use crate::{
    buffer_pool::{FrameBufferPool, PooledBuffer},
    wraparound::{is_newer_epoch, is_older_frame},
};

/// Tunables for one reassembler instance.
#[derive(Debug, Clone, Copy)]
pub struct ReassemblerConfig {
    /// Maximum UDP datagram size; payload capacity per fragment is derived
    /// from this minus [`FrameHeader::SIZE`].
    pub max_packet_size: usize,
    /// Timeout for an incomplete non-keyframe (§4.4: 500 ms).
    pub p_frame_timeout: Duration,
    /// Timeout for an incomplete keyframe (§4.4: 3 s).
    pub keyframe_timeout: Duration,
    /// Log diagnostic counters every this many received packets.
    pub stats_log_interval: u64,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            max_packet_size: 1200,
            p_frame_timeout: Duration::from_millis(500),
            keyframe_timeout: Duration::from_secs(3),
            stats_log_interval: 1000,
        }
    }
}

impl ReassemblerConfig {
    /// Per-fragment payload capacity for this config's `max_packet_size`.
    #[must_use]
    pub fn max_payload_size(&self) -> usize {
        self.max_packet_size.saturating_sub(FrameHeader::SIZE).max(1)
    }

    /// FEC block size for a frame, per §4.4 ("8 for keyframes, 16 for
    /// P-frames").
    #[must_use]
    pub fn fec_block_size(&self, is_keyframe: bool) -> u16 {
        if is_keyframe {
            8
        } else {
            16
        }
    }
}

/// Diagnostic counters maintained per reassembler instance (§4.4, §7
/// "Reassembly"; surfaced as a typed struct rather than scattered atomics so
/// tests and logging share one source of truth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReassemblerStats {
    /// Total packets handed to [`Reassembler::ingest`].
    pub total_packets_received: u64,
    /// Dropped for an epoch mismatch not resolved by a qualifying keyframe.
    pub discarded_epoch: u64,
    /// Dropped for a dimension-token mismatch.
    pub discarded_token: u64,
    /// Dropped while awaiting a keyframe.
    pub discarded_awaiting_keyframe: u64,
    /// Dropped for a CRC mismatch.
    pub discarded_crc: u64,
    /// Dropped for being older than the last completed/delivered frame.
    pub discarded_old: u64,
    /// Frames that timed out before completing.
    pub dropped_frame_count: u64,
    /// Fragments recovered via FEC XOR.
    pub recovered_fragments: u64,
}

/// Why a loss event was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    /// A non-keyframe timed out before completing.
    PFrameTimeout,
}

/// A fully reassembled, ready-to-decode frame.
///
/// `bytes` is released back to its buffer pool automatically when dropped.
#[derive(Debug)]
pub struct CompletedFrame {
    /// Reassembled payload bytes.
    pub bytes: PooledBuffer,
    /// Whether this is a keyframe.
    pub is_keyframe: bool,
    /// Presentation timestamp, nanoseconds.
    pub timestamp_ns: u64,
    /// Content sub-rectangle.
    pub content_rect: ContentRect,
    /// Frame number, for diagnostics and decode-queue ordering decisions.
    pub frame_number: u32,
}

impl CompletedFrame {
    /// Explicitly release the backing buffer (equivalent to dropping it).
    pub fn release(self) {}
}

/// An event produced by [`Reassembler::ingest`] or
/// [`Reassembler::check_timeouts`].
#[derive(Debug)]
pub enum ReassemblerEvent {
    /// A frame completed and was delivered to the decode path.
    FrameDelivered(CompletedFrame),
    /// Loss was detected; the driver should typically request a keyframe.
    LossDetected(LossReason),
}

struct PendingFrame<I> {
    buffer: PooledBuffer,
    received: Vec<bool>,
    received_count: u16,
    data_fragment_count: u16,
    is_keyframe: bool,
    timestamp_ns: u64,
    content_rect: ContentRect,
    parity: HashMap<u16, Vec<u8>>,
    received_at: I,
}

/// Per-stream fragment reassembler.
///
/// Not `Send`/`Sync` by itself (it owns no lock); the protocol description §5 calls for one
/// instance per stream guarded by its own mutex, which the driver provides.
pub struct Reassembler<I> {
    stream_id: StreamId,
    config: ReassemblerConfig,
    pool: FrameBufferPool,
    pending: HashMap<u32, PendingFrame<I>>,
    last_completed_frame: Option<u32>,
    last_delivered_keyframe: u32,
    awaiting_keyframe: bool,
    awaiting_keyframe_since: Option<I>,
    current_epoch: u16,
    expected_dimension_token: u16,
    token_validation_enabled: bool,
    stats: ReassemblerStats,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> Reassembler<I> {
    /// Create a reassembler for `stream_id`, backed by `pool`.
    #[must_use]
    pub fn new(stream_id: StreamId, pool: FrameBufferPool, config: ReassemblerConfig) -> Self {
        Self {
            stream_id,
            config,
            pool,
            pending: HashMap::new(),
            last_completed_frame: None,
            last_delivered_keyframe: 0,
            awaiting_keyframe: false,
            awaiting_keyframe_since: None,
            current_epoch: 0,
            expected_dimension_token: 0,
            token_validation_enabled: false,
            stats: ReassemblerStats::default(),
        }
    }

    /// Current diagnostic counters.
    #[must_use]
    pub fn stats(&self) -> ReassemblerStats {
        self.stats
    }

    /// Whether the reassembler is currently dropping everything but
    /// keyframes.
    #[must_use]
    pub fn is_awaiting_keyframe(&self) -> bool {
        self.awaiting_keyframe
    }

    /// How long the reassembler has been awaiting a keyframe, if it is.
    #[must_use]
    pub fn awaiting_keyframe_duration(&self, now: I) -> Option<Duration> {
        self.awaiting_keyframe_since.map(|since| now - since)
    }

    /// The instant at which the reassembler began awaiting a keyframe, if
    /// it is — for drivers (the keyframe recovery loop) that need to track
    /// elapsed time across their own polling cadence rather than a single
    /// snapshot duration.
    #[must_use]
    pub fn awaiting_keyframe_since(&self) -> Option<I> {
        self.awaiting_keyframe_since
    }

    /// Enable (or re-target) dimension-token validation (§4.4
    /// "Dimension-token update"). A value of 0 means "accept all" and is the
    /// implicit starting state.
    pub fn update_expected_dimension_token(&mut self, token: u16) {
        self.expected_dimension_token = token;
        self.token_validation_enabled = true;
    }

    /// Drop all pending state and counters (§4.4 `reset()`).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.last_completed_frame = None;
        self.last_delivered_keyframe = 0;
        self.awaiting_keyframe = false;
        self.awaiting_keyframe_since = None;
        self.stats = ReassemblerStats::default();
    }

    /// Release all non-keyframe pending frames and arm keyframe-only mode,
    /// leaving any in-progress keyframe assembly untouched (§4.4
    /// `enterKeyframeOnlyMode()`).
    pub fn enter_keyframe_only_mode(&mut self, now: I) {
        self.pending.retain(|_, pending| pending.is_keyframe);
        self.begin_awaiting_keyframe(now);
    }

    fn begin_awaiting_keyframe(&mut self, now: I) {
        self.awaiting_keyframe = true;
        if self.awaiting_keyframe_since.is_none() {
            self.awaiting_keyframe_since = Some(now);
        }
    }

    fn reset_for_epoch(&mut self, new_epoch: u16) {
        self.current_epoch = new_epoch;
        self.pending.clear();
        self.last_completed_frame = None;
        self.awaiting_keyframe = false;
        self.awaiting_keyframe_since = None;
    }

    /// Accept or reject a `(candidate_epoch, is_keyframe)` discontinuity
    /// signal (epoch mismatch or explicit `discontinuity` flag share this
    /// rule per §4.4 steps 2–3): only a keyframe at the current-or-newer
    /// epoch resets state.
    fn maybe_reset_for_epoch(&mut self, candidate_epoch: u16, is_keyframe: bool) -> bool {
        if is_keyframe && (candidate_epoch == self.current_epoch || is_newer_epoch(self.current_epoch, candidate_epoch)) {
            self.reset_for_epoch(candidate_epoch);
            true
        } else {
            false
        }
    }

    /// Ingest one datagram's payload and header, in arrival order.
    pub fn ingest(&mut self, payload: &[u8], header: FrameHeader, now: I) -> Vec<ReassemblerEvent> {
        debug_assert_eq!(header.stream_id(), self.stream_id.0);
        let mut events = Vec::new();
        self.stats.total_packets_received += 1;
        if self.stats.total_packets_received % self.config.stats_log_interval == 0 {
            debug!(stream_id = %self.stream_id, stats = ?self.stats, "reassembler stats");
        }

        let flags = header.flags();

        // Step 2: epoch gate.
        if header.epoch() != self.current_epoch && !self.maybe_reset_for_epoch(header.epoch(), flags.keyframe()) {
            self.stats.discarded_epoch += 1;
            self.begin_awaiting_keyframe(now);
            return events;
        }

        // Step 3: discontinuity gate (same rule, triggered by the flag).
        if flags.discontinuity() && !self.maybe_reset_for_epoch(header.epoch(), flags.keyframe()) {
            self.stats.discarded_epoch += 1;
            self.begin_awaiting_keyframe(now);
            return events;
        }

        // Step 4: dimension-token gate.
        if self.token_validation_enabled {
            if flags.keyframe() {
                self.expected_dimension_token = header.dimension_token();
            } else if header.dimension_token() != self.expected_dimension_token {
                self.stats.discarded_token += 1;
                return events;
            }
        }

        // Step 5: awaiting-keyframe gate.
        if self.awaiting_keyframe && !flags.keyframe() {
            self.stats.discarded_awaiting_keyframe += 1;
            return events;
        }

        // Step 6: CRC.
        if !header.verify_checksum(payload) {
            self.stats.discarded_crc += 1;
            return events;
        }

        // Step 7: old-frame gate (bypassed for keyframes).
        let frame_number = header.frame_number();
        if !flags.keyframe() {
            if let Some(last) = self.last_completed_frame {
                if is_older_frame(frame_number, last) {
                    self.stats.discarded_old += 1;
                    return events;
                }
            }
        }

        self.store_fragment(payload, &header, now);

        if let Some(completed) = self.try_complete(frame_number) {
            if let Some(event) = self.deliver(completed) {
                events.push(event);
            }
        }

        events
    }

    fn store_fragment(&mut self, payload: &[u8], header: &FrameHeader, now: I) {
        let frame_number = header.frame_number();
        let data_fragment_count = header.fragment_count();
        let is_keyframe = header.flags().keyframe();
        let max_payload = self.config.max_payload_size();

        let pending = self.pending.entry(frame_number).or_insert_with(|| PendingFrame {
            buffer: self.pool.acquire(data_fragment_count as usize * max_payload),
            received: vec![false; data_fragment_count as usize],
            received_count: 0,
            data_fragment_count,
            is_keyframe,
            timestamp_ns: header.timestamp_ns(),
            content_rect: header.content_rect(),
            parity: HashMap::new(),
            received_at: now,
        });

        let index = header.fragment_index();
        let is_parity = header.flags().fec_parity() || index >= data_fragment_count;

        if is_parity {
            let block_idx = index.saturating_sub(data_fragment_count);
            pending.parity.entry(block_idx).or_insert_with(|| payload.to_vec());
            self.try_recover_block(frame_number, block_idx);
            return;
        }

        let index = index as usize;
        if index >= pending.received.len() || pending.received[index] {
            return; // duplicate or out-of-range fragment; ignored.
        }
        let offset = index * max_payload;
        let end = (offset + payload.len()).min(pending.buffer.capacity());
        pending.buffer.full_mut()[offset..end].copy_from_slice(&payload[..end - offset]);
        pending.received[index] = true;
        pending.received_count += 1;

        let block_size = self.config.fec_block_size(is_keyframe);
        let block_idx = index as u16 / block_size;
        self.try_recover_block(frame_number, block_idx);
    }

    fn try_recover_block(&mut self, frame_number: u32, block_idx: u16) {
        let max_payload = self.config.max_payload_size();
        let Some((missing_idx, recovered)) = (|| {
            let pending = self.pending.get(&frame_number)?;
            let block_size = self.config.fec_block_size(pending.is_keyframe);
            let start = block_idx as usize * block_size as usize;
            let end = (start + block_size as usize).min(pending.data_fragment_count as usize);
            if start >= end {
                return None;
            }
            let missing: Vec<usize> = (start..end).filter(|&i| !pending.received[i]).collect();
            if missing.len() != 1 {
                return None;
            }
            let missing_idx = missing[0];
            let parity = pending.parity.get(&block_idx)?;
            let recovery_len = parity.len();
            let mut recovered = vec![0u8; recovery_len];
            recovered.copy_from_slice(parity);
            for i in start..end {
                if i == missing_idx {
                    continue;
                }
                let offset = i * max_payload;
                let source = &pending.buffer.full()[offset..offset + recovery_len];
                for (r, s) in recovered.iter_mut().zip(source) {
                    *r ^= s;
                }
            }
            Some((missing_idx, recovered))
        })() else {
            return;
        };

        let Some(pending) = self.pending.get_mut(&frame_number) else { return };
        let offset = missing_idx * max_payload;
        let recovery_len = recovered.len();
        pending.buffer.full_mut()[offset..offset + recovery_len].copy_from_slice(&recovered);
        pending.received[missing_idx] = true;
        pending.received_count += 1;
        self.stats.recovered_fragments += 1;
    }

    fn try_complete(&mut self, frame_number: u32) -> Option<(u32, PendingFrame<I>)> {
        let pending = self.pending.get(&frame_number)?;
        if pending.received_count != pending.data_fragment_count {
            return None;
        }
        self.pending.remove(&frame_number).map(|p| (frame_number, p))
    }

    fn deliver(&mut self, (frame_number, mut pending): (u32, PendingFrame<I>)) -> Option<ReassemblerEvent> {
        let max_payload = self.config.max_payload_size();
        let deliverable = if pending.is_keyframe {
            frame_number > self.last_delivered_keyframe || self.last_delivered_keyframe == 0
        } else {
            frame_number > self.last_completed_frame.unwrap_or(0) && frame_number > self.last_delivered_keyframe
        };

        if !deliverable {
            self.stats.discarded_old += 1;
            return None;
        }

        if pending.is_keyframe {
            self.last_delivered_keyframe = frame_number;
            self.awaiting_keyframe = false;
            self.awaiting_keyframe_since = None;
        }
        self.last_completed_frame = Some(frame_number);

        // Discard older P-frames still pending (never an incomplete keyframe;
        // those time out naturally, per §4.4 "Delivery").
        self.pending.retain(|&fn_, p| p.is_keyframe || !is_older_frame(fn_, frame_number));

        let exact_len = pending.received_count as usize * max_payload;
        pending.buffer.set_logical_len(exact_len.min(pending.buffer.capacity()));

        Some(ReassemblerEvent::FrameDelivered(CompletedFrame {
            bytes: pending.buffer,
            is_keyframe: pending.is_keyframe,
            timestamp_ns: pending.timestamp_ns,
            content_rect: pending.content_rect,
            frame_number,
        }))
    }

    /// Check for, and release, any pending frames that have timed out (spec
    /// §4.4 "Timeouts"). Call periodically from a driver timer task.
    pub fn check_timeouts(&mut self, now: I) -> Vec<ReassemblerEvent> {
        let mut events = Vec::new();
        let timed_out: Vec<u32> = self
            .pending
            .iter()
            .filter(|(_, pending)| {
                let timeout =
                    if pending.is_keyframe { self.config.keyframe_timeout } else { self.config.p_frame_timeout };
                now - pending.received_at >= timeout
            })
            .map(|(&frame_number, _)| frame_number)
            .collect();

        for frame_number in timed_out {
            if let Some(pending) = self.pending.remove(&frame_number) {
                self.stats.dropped_frame_count += 1;
                let was_p_frame = !pending.is_keyframe;
                drop(pending);
                if was_p_frame && !self.awaiting_keyframe {
                    self.begin_awaiting_keyframe(now);
                    events.push(ReassemblerEvent::LossDetected(LossReason::PFrameTimeout));
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use mirage_proto::{header::ContentRect as Rect, FrameFlags};

    use super::*;
    use crate::buffer_pool::DEFAULT_PER_CAPACITY_BOUND;

    type TestInstant = Duration;

    fn pool() -> FrameBufferPool {
        FrameBufferPool::new(DEFAULT_PER_CAPACITY_BOUND)
    }

    fn config() -> ReassemblerConfig {
        ReassemblerConfig { max_packet_size: 1270, ..Default::default() }
    }

    fn fragment_header(
        frame_number: u32,
        fragment_index: u16,
        fragment_count: u16,
        keyframe: bool,
        dimension_token: u16,
    ) -> FrameHeader {
        let mut flags = FrameFlags::empty();
        if keyframe {
            flags = flags.with(FrameFlags::KEYFRAME);
        }
        FrameHeader::new(
            7,
            flags,
            frame_number,
            1_000_000_000,
            frame_number,
            fragment_index,
            fragment_count,
            0,
            Rect { x: 0.0, y: 0.0, w: 1920.0, h: 1080.0 },
            dimension_token,
        )
    }

    fn fragment(frame_number: u32, index: u16, count: u16, keyframe: bool, payload: &[u8]) -> (FrameHeader, Vec<u8>) {
        let mut header = fragment_header(frame_number, index, count, keyframe, 0);
        header.set_payload(payload);
        (header, payload.to_vec())
    }

    #[test]
    fn lossless_single_frame_reassembly_any_permutation() {
        let max_payload = config().max_payload_size();
        let payload_bytes = vec![0xABu8; 3 * max_payload];
        let chunks: Vec<Vec<u8>> = payload_bytes.chunks(max_payload).map(<[u8]>::to_vec).collect();
        assert_eq!(chunks.len(), 3);

        let fragments: Vec<_> =
            chunks.iter().enumerate().map(|(i, c)| fragment(42, i as u16, 3, true, c)).collect();

        // Try every permutation of the 3 fragments.
        let mut indices = [0, 1, 2];
        let mut any_checked = false;
        loop {
            let mut r = Reassembler::new(StreamId(7), pool(), config());
            let mut delivered = None;
            for &i in &indices {
                let (header, payload) = fragments[i].clone();
                for event in r.ingest(&payload, header, Duration::ZERO) {
                    if let ReassemblerEvent::FrameDelivered(frame) = event {
                        delivered = Some(frame);
                    }
                }
            }
            let frame = delivered.expect("frame delivered for every fragment order");
            assert_eq!(frame.bytes.as_bytes(), payload_bytes.as_slice());
            assert!(frame.is_keyframe);
            assert_eq!(frame.timestamp_ns, 1_000_000_000);
            any_checked = true;

            // next_permutation (simple swap-based enumeration for 3 elements)
            if !next_permutation(&mut indices) {
                break;
            }
        }
        assert!(any_checked);
    }

    fn next_permutation(arr: &mut [usize; 3]) -> bool {
        // Simple trick for n=3: enumerate via a fixed table.
        const PERMS: [[usize; 3]; 6] =
            [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let current = PERMS.iter().position(|p| p == arr).unwrap_or(0);
        if current + 1 >= PERMS.len() {
            return false;
        }
        *arr = PERMS[current + 1];
        true
    }

    #[test]
    fn token_rejected_p_frame_never_delivered() {
        let mut r = Reassembler::new(StreamId(7), pool(), config());
        r.update_expected_dimension_token(1);

        let max_payload = config().max_payload_size();
        let kf_payload = vec![1u8; max_payload];
        let mut kf_header = fragment_header(42, 0, 1, true, 1);
        kf_header.set_payload(&kf_payload);
        let events = r.ingest(&kf_payload, kf_header, Duration::ZERO);
        assert!(matches!(events.as_slice(), [ReassemblerEvent::FrameDelivered(_)]));

        for i in 0..3u16 {
            let mut header = fragment_header(43, i, 3, false, 2);
            let payload = vec![2u8; max_payload];
            header.set_payload(&payload);
            let events = r.ingest(&payload, header, Duration::ZERO);
            assert!(events.is_empty());
        }
        assert_eq!(r.stats().discarded_token, 3);
        assert_eq!(r.last_completed_frame, Some(42));
    }

    #[test]
    fn incomplete_keyframe_preserved_when_newer_keyframe_delivered_then_times_out() {
        let mut r = Reassembler::new(StreamId(7), pool(), config());
        let max_payload = config().max_payload_size();

        // K1: frame 100, 10 fragments, only 7 received.
        for i in 0..7u16 {
            let mut header = fragment_header(100, i, 10, true, 0);
            let payload = vec![9u8; max_payload];
            header.set_payload(&payload);
            r.ingest(&payload, header, Duration::ZERO);
        }

        // K2: frame 101, 4 fragments, all received -> delivered.
        let mut delivered = None;
        for i in 0..4u16 {
            let mut header = fragment_header(101, i, 4, true, 0);
            let payload = vec![5u8; max_payload];
            header.set_payload(&payload);
            for event in r.ingest(&payload, header, Duration::from_millis(10)) {
                if let ReassemblerEvent::FrameDelivered(frame) = event {
                    delivered = Some(frame);
                }
            }
        }
        let delivered = delivered.expect("K2 delivered");
        assert_eq!(delivered.frame_number, 101);
        assert!(r.pending.contains_key(&100), "K1 must not be discarded by K2's delivery");

        let events = r.check_timeouts(Duration::from_secs(4));
        assert!(!r.pending.contains_key(&100));
        assert_eq!(r.stats().dropped_frame_count, 1);
        assert!(events.is_empty(), "keyframe timeout alone does not emit a loss event");
    }

    #[test]
    fn fec_recovers_single_missing_fragment() {
        let mut r = Reassembler::new(StreamId(7), pool(), config());
        let max_payload = config().max_payload_size();

        let fragments: Vec<Vec<u8>> = (0..16u16).map(|i| vec![i as u8; max_payload]).collect();
        let mut parity = vec![0u8; max_payload];
        for f in &fragments {
            for (p, b) in parity.iter_mut().zip(f) {
                *p ^= b;
            }
        }

        let mut delivered = None;
        for (i, payload) in fragments.iter().enumerate() {
            if i == 7 {
                continue; // withhold fragment 7
            }
            let mut header = fragment_header(200, i as u16, 16, false, 0);
            header.set_payload(payload);
            for event in r.ingest(payload, header, Duration::ZERO) {
                if let ReassemblerEvent::FrameDelivered(f) = event {
                    delivered = Some(f);
                }
            }
        }
        assert!(delivered.is_none(), "frame incomplete until parity recovers fragment 7");

        let mut parity_header = fragment_header(200, 16, 16, false, 0);
        parity_header.set_payload(&parity);
        for event in r.ingest(&parity, parity_header, Duration::ZERO) {
            if let ReassemblerEvent::FrameDelivered(f) = event {
                delivered = Some(f);
            }
        }

        let frame = delivered.expect("recovered fragment completes the frame");
        let expected: Vec<u8> = fragments.concat();
        assert_eq!(frame.bytes.as_bytes(), expected.as_slice());
        assert_eq!(r.stats().recovered_fragments, 1);
    }

    #[test]
    fn p_frame_timeout_emits_loss_event_once() {
        let mut r = Reassembler::new(StreamId(7), pool(), config());
        let max_payload = config().max_payload_size();
        let mut header = fragment_header(5, 0, 2, false, 0);
        let payload = vec![1u8; max_payload];
        header.set_payload(&payload);
        r.ingest(&payload, header, Duration::ZERO);

        let events = r.check_timeouts(Duration::from_millis(600));
        assert!(matches!(events.as_slice(), [ReassemblerEvent::LossDetected(LossReason::PFrameTimeout)]));
        assert!(r.is_awaiting_keyframe());
        assert_eq!(r.stats().dropped_frame_count, 1);
    }

    #[test]
    fn old_frame_dropped_keyframe_bypasses_gate() {
        let mut r = Reassembler::new(StreamId(7), pool(), config());
        let max_payload = config().max_payload_size();

        let mut header = fragment_header(50, 0, 1, true, 0);
        let payload = vec![1u8; max_payload];
        header.set_payload(&payload);
        r.ingest(&payload, header, Duration::ZERO);
        assert_eq!(r.last_completed_frame, Some(50));

        // An older P-frame is dropped.
        let mut header = fragment_header(49, 0, 1, false, 0);
        header.set_payload(&payload);
        let events = r.ingest(&payload, header, Duration::ZERO);
        assert!(events.is_empty());
        assert_eq!(r.stats().discarded_old, 1);

        // An older-numbered keyframe is NOT subject to the old-frame gate.
        let mut header = fragment_header(49, 0, 1, true, 0);
        header.set_payload(&payload);
        let events = r.ingest(&payload, header, Duration::from_millis(1));
        assert!(matches!(events.as_slice(), [ReassemblerEvent::FrameDelivered(_)]));
    }
}
