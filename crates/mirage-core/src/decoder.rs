//! The decoder contract owned by the stream controller (§4.6 "Contract
//! toward the decoder (C0, external)").
//!
//! The hardware decoder itself is out of scope (§1): it's a black box
//! behind [`Decoder`]. What belongs here is the *error-threshold tracking*
//! the controller layers on top of it — escalating to a keyframe request
//! after repeated decode failures, with back-off so a persistently broken
//! decoder doesn't spam requests.

use std::time::Duration;

use mirage_proto::header::ContentRect;

use crate::error::CoreError;

/// Consecutive decode failures required to first escalate (§4.6/§7:
/// "fires after 5 consecutive failures").
pub const ERROR_THRESHOLD: u32 = 5;

/// Additional failures between re-escalations once already above threshold
/// (§7: "retries on every further 10 failures").
pub const RE_ESCALATION_INTERVAL: u32 = 10;

/// Minimum spacing between escalations regardless of failure count (§7:
/// "minimum 3 s spacing").
pub const MIN_ESCALATION_SPACING: Duration = Duration::from_secs(3);

/// The decoder contract the stream controller drives (§4.6).
///
/// An implementation wraps the platform's hardware decoder session; tests
/// and simulation use a fake implementation instead.
pub trait Decoder {
    /// Begin a decoding session.
    fn start_decoding(&mut self);

    /// Submit one frame's bytes for decoding.
    fn decode_frame(
        &mut self,
        bytes: &[u8],
        presentation_time_ns: u64,
        is_keyframe: bool,
        content_rect: ContentRect,
    ) -> Result<(), CoreError>;

    /// Tear down and recreate the decoding session (§4.6
    /// `resetForNewSession`; invoked by [`DecodeErrorTracker`] escalation and
    /// by stream recovery).
    fn reset_for_new_session(&mut self);

    /// Whether the most recent keyframe's parameter sets describe different
    /// pixel dimensions than the active session (§4.6
    /// "`setDimensionChangeHandler`"). The controller polls this after every
    /// keyframe delivery rather than registering a callback, keeping the
    /// trait synchronous.
    fn dimension_changed(&self) -> Option<(u32, u32)>;
}

/// Tracks consecutive decode failures and decides when to escalate to a
/// keyframe request (§4.6/§7).
#[derive(Debug, Clone, Copy)]
pub struct DecodeErrorTracker<I> {
    consecutive_failures: u32,
    failures_since_last_escalation: u32,
    last_escalation: Option<I>,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> DecodeErrorTracker<I> {
    /// Start with no recorded failures.
    #[must_use]
    pub fn new() -> Self {
        Self { consecutive_failures: 0, failures_since_last_escalation: 0, last_escalation: None }
    }

    /// A frame decoded successfully; clears the consecutive-failure streak.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.failures_since_last_escalation = 0;
    }

    /// A frame failed to decode. Returns `true` if this failure should
    /// escalate to a keyframe request, honoring both the failure-count
    /// thresholds and the minimum spacing between escalations.
    pub fn record_failure(&mut self, now: I) -> bool {
        self.consecutive_failures += 1;
        self.failures_since_last_escalation += 1;

        let should_consider = match self.last_escalation {
            None => self.consecutive_failures >= ERROR_THRESHOLD,
            Some(_) => self.failures_since_last_escalation >= RE_ESCALATION_INTERVAL,
        };
        if !should_consider {
            return false;
        }

        let spaced_enough = match self.last_escalation {
            None => true,
            Some(last) => now - last >= MIN_ESCALATION_SPACING,
        };
        if !spaced_enough {
            return false;
        }

        self.last_escalation = Some(now);
        self.failures_since_last_escalation = 0;
        true
    }

    /// Current consecutive-failure count (diagnostics).
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> Default for DecodeErrorTracker<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestInstant = Duration;

    #[test]
    fn escalates_after_five_consecutive_failures() {
        let mut tracker: DecodeErrorTracker<TestInstant> = DecodeErrorTracker::new();
        for i in 0..4 {
            assert!(!tracker.record_failure(Duration::from_secs(i)));
        }
        assert!(tracker.record_failure(Duration::from_secs(4)));
    }

    #[test]
    fn success_resets_the_streak() {
        let mut tracker: DecodeErrorTracker<TestInstant> = DecodeErrorTracker::new();
        for i in 0..4 {
            tracker.record_failure(Duration::from_secs(i));
        }
        tracker.record_success();
        assert_eq!(tracker.consecutive_failures(), 0);
        for i in 0..4 {
            assert!(!tracker.record_failure(Duration::from_secs(10 + i)));
        }
    }

    #[test]
    fn reescalates_after_ten_more_failures_respecting_spacing() {
        let mut tracker: DecodeErrorTracker<TestInstant> = DecodeErrorTracker::new();
        for i in 0..5 {
            tracker.record_failure(Duration::from_secs(i));
        }
        // 9 more failures since the first escalation: not yet 10.
        let mut escalated_again = false;
        for i in 0..9 {
            if tracker.record_failure(Duration::from_secs(5 + i)) {
                escalated_again = true;
            }
        }
        assert!(!escalated_again);
        assert!(tracker.record_failure(Duration::from_secs(20)));
    }

    #[test]
    fn minimum_spacing_suppresses_rapid_escalation() {
        let mut tracker: DecodeErrorTracker<TestInstant> = DecodeErrorTracker::new();
        for i in 0..5 {
            tracker.record_failure(Duration::from_millis(i));
        }
        // Immediately hammer another 10 failures well within the 3s window.
        let mut escalated_again = false;
        for i in 0..10 {
            if tracker.record_failure(Duration::from_millis(5 + i)) {
                escalated_again = true;
            }
        }
        assert!(!escalated_again, "re-escalation within 3s of the last one must be suppressed");
    }
}
