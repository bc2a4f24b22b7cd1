//! Capacity-bucketed, thread-safe reusable byte buffers (§4.3, C3).
//!
//! Same small, focused shape as `env.rs`'s `Environment`: a cheap `Clone`
//! handle wrapping an `Arc`, safe to share across
//! the reassembler's mutex boundary and the decode queue. A buffer acquired
//! from the pool is returned automatically when its [`PooledBuffer`] is
//! dropped — the linear-ownership shape the design notes call for, so
//! "release exactly once" falls out of normal Rust ownership instead of a
//! hand-rolled reference count.

use std::{collections::HashMap, sync::Mutex};

use std::sync::Arc;

/// Default number of idle buffers retained per capacity bucket before
/// further releases are simply freed (§4.3: "default 4").
pub const DEFAULT_PER_CAPACITY_BOUND: usize = 4;

struct PoolInner {
    buckets: Mutex<HashMap<usize, Vec<Vec<u8>>>>,
    per_capacity_bound: usize,
}

/// A pool of reusable, zero-padded byte buffers keyed by capacity.
///
/// Cheap to clone: internally an `Arc`, so every [`PooledBuffer`] it hands
/// out can carry its own handle back to the pool for release on drop.
#[derive(Clone)]
pub struct FrameBufferPool {
    inner: Arc<PoolInner>,
}

impl FrameBufferPool {
    /// Create a pool that retains at most `per_capacity_bound` idle buffers
    /// per distinct capacity.
    #[must_use]
    pub fn new(per_capacity_bound: usize) -> Self {
        Self { inner: Arc::new(PoolInner { buckets: Mutex::new(HashMap::new()), per_capacity_bound }) }
    }

    /// Acquire a buffer of at least `capacity` bytes (rounded up to at least
    /// one), popping a recycled buffer of the same capacity if one is idle,
    /// or allocating fresh otherwise. The returned buffer is zero-padded and
    /// its logical length equals `capacity`.
    #[must_use]
    pub fn acquire(&self, capacity: usize) -> PooledBuffer {
        let capacity = capacity.max(1);
        let mut bytes = {
            let mut buckets = self.inner.buckets.lock().unwrap_or_else(|e| e.into_inner());
            buckets.get_mut(&capacity).and_then(Vec::pop)
        }
        .unwrap_or_else(|| Vec::with_capacity(capacity));
        bytes.clear();
        bytes.resize(capacity, 0);
        PooledBuffer { bytes, capacity, logical_len: capacity, pool: self.clone() }
    }

    fn release(&self, capacity: usize, bytes: Vec<u8>) {
        let mut buckets = self.inner.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let stack = buckets.entry(capacity).or_default();
        if stack.len() < self.inner.per_capacity_bound {
            stack.push(bytes);
        }
    }

    /// Number of idle buffers currently retained for `capacity` (test/metrics
    /// helper; not part of the wire contract).
    #[must_use]
    pub fn idle_count(&self, capacity: usize) -> usize {
        let buckets = self.inner.buckets.lock().unwrap_or_else(|e| e.into_inner());
        buckets.get(&capacity).map_or(0, Vec::len)
    }
}

/// A buffer checked out from a [`FrameBufferPool`].
///
/// Returned to its pool automatically on drop. Once dropped it cannot be
/// read or written again — Rust's ownership rules make "double release" and
/// "use after release" unrepresentable rather than merely checked.
pub struct PooledBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    logical_len: usize,
    pool: FrameBufferPool,
}

impl PooledBuffer {
    /// The buffer's logical contents (`0..logical_len`).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.logical_len]
    }

    /// Mutable access to the full backing capacity, for fragment writes that
    /// land at arbitrary offsets before the frame's total length is known.
    pub fn full_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Read-only access to the full backing capacity (e.g. for FEC XOR
    /// recovery, which reads fragment slots that may lie beyond the
    /// eventual logical length).
    #[must_use]
    pub fn full(&self) -> &[u8] {
        &self.bytes
    }

    /// Shrink the logical length to `len` (clamped to `capacity`), e.g. once
    /// a frame's true byte count is known. Never reallocates, so the
    /// recycled buffer keeps its original bucket capacity.
    pub fn set_logical_len(&mut self, len: usize) {
        self.logical_len = len.min(self.capacity);
    }

    /// Current logical length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logical_len
    }

    /// Whether the logical length is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logical_len == 0
    }

    /// Backing bucket capacity (fixed for this buffer's lifetime).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let bytes = std::mem::take(&mut self.bytes);
        self.pool.release(self.capacity, bytes);
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("capacity", &self.capacity)
            .field("logical_len", &self.logical_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_zero_pads_to_capacity() {
        let pool = FrameBufferPool::new(DEFAULT_PER_CAPACITY_BOUND);
        let buf = pool.acquire(16);
        assert_eq!(buf.as_bytes(), &[0u8; 16]);
        assert_eq!(buf.capacity(), 16);
    }

    #[test]
    fn acquire_rounds_zero_up_to_one() {
        let pool = FrameBufferPool::new(DEFAULT_PER_CAPACITY_BOUND);
        let buf = pool.acquire(0);
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn release_on_drop_recycles_same_capacity() {
        let pool = FrameBufferPool::new(DEFAULT_PER_CAPACITY_BOUND);
        assert_eq!(pool.idle_count(64), 0);
        {
            let _buf = pool.acquire(64);
            assert_eq!(pool.idle_count(64), 0);
        }
        assert_eq!(pool.idle_count(64), 1);
    }

    #[test]
    fn release_stops_at_per_capacity_bound() {
        let pool = FrameBufferPool::new(2);
        let bufs: Vec<_> = (0..5).map(|_| pool.acquire(32)).collect();
        drop(bufs);
        assert_eq!(pool.idle_count(32), 2);
    }

    #[test]
    fn round_trip_acquire_release_never_exceeds_bound() {
        let pool = FrameBufferPool::new(4);
        for _ in 0..100 {
            let bufs: Vec<_> = (0..10).map(|_| pool.acquire(8)).collect();
            drop(bufs);
            assert!(pool.idle_count(8) <= 4);
        }
    }

    #[test]
    fn set_logical_len_shrinks_visible_slice_without_changing_capacity() {
        let pool = FrameBufferPool::new(DEFAULT_PER_CAPACITY_BOUND);
        let mut buf = pool.acquire(100);
        buf.set_logical_len(37);
        assert_eq!(buf.len(), 37);
        assert_eq!(buf.as_bytes().len(), 37);
        assert_eq!(buf.capacity(), 100);
    }
}
