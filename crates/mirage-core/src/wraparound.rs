//! Modular ordering helpers for wrapping frame numbers and epochs.
//!
//! the protocol description §3 "Ordering" and §9 "Epoch and frame-number wrap-around": unsigned
//! arithmetic wraps are well-defined in Rust (`wrapping_sub`), but the
//! *comparison* windows are asymmetric and easy to get backwards, so they're
//! centralized here rather than inlined at each call site.

/// Window (exclusive upper bound) within which a smaller `frame_number` is
/// still considered "recent enough to be the old side of an ordering test"
/// rather than a wrapped-around future value.
pub const FRAME_NUMBER_WINDOW: u32 = 1000;

/// Window (exclusive upper bound) used for 16-bit epoch comparisons.
pub const EPOCH_WINDOW: u16 = 0x8000;

/// Is `a` older than `b`, per the protocol description §3: `(b - a) mod 2^32 ∈ (0, 1000]`.
///
/// Keyframes bypass this test entirely at call sites (the protocol description §3: "Keyframes
/// are NEVER treated as 'old'"); this function only implements the raw
/// modular comparison.
#[must_use]
pub fn is_older_frame(a: u32, b: u32) -> bool {
    let diff = b.wrapping_sub(a);
    diff != 0 && diff <= FRAME_NUMBER_WINDOW
}

/// Is `candidate` a newer epoch than `current`, using the same wrap-safe
/// comparison with the 16-bit epoch window (the protocol description §3 "Epochs use the same
/// rule with window `0x8000` on 16 bits").
#[must_use]
pub fn is_newer_epoch(current: u16, candidate: u16) -> bool {
    let diff = candidate.wrapping_sub(current);
    diff != 0 && diff < EPOCH_WINDOW
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_ordering_without_wrap() {
        assert!(is_older_frame(10, 11));
        assert!(!is_older_frame(11, 10));
        assert!(!is_older_frame(10, 10));
    }

    #[test]
    fn distance_beyond_window_is_not_old() {
        assert!(!is_older_frame(0, 1001));
        assert!(is_older_frame(0, 1000));
    }

    #[test]
    fn wraps_around_u32_boundary() {
        let a = u32::MAX - 2;
        let b = 5;
        assert!(is_older_frame(a, b));
    }

    #[test]
    fn epoch_newer_respects_half_space_window() {
        assert!(is_newer_epoch(10, 11));
        assert!(!is_newer_epoch(11, 10));
        assert!(!is_newer_epoch(10, 10));
        assert!(is_newer_epoch(u16::MAX, 0));
        assert!(!is_newer_epoch(0, 0x8000));
    }
}
