//! Fuzz target for `DecodeQueue<I>`'s backpressure policy (§4.5, C5).
//!
//! # Invariants
//!
//! - The queue never holds more than `capacity` frames.
//! - Enqueuing a keyframe when full never drops the keyframe: either a
//!   queued non-keyframe is evicted, or (queue is all keyframes) the last
//!   keyframe is evicted — the incoming keyframe is always accepted.
//! - `stop()` always leaves the queue empty.
//! - Every frame that enters the queue leaves it exactly once (enforced by
//!   `CompletedFrame`'s own `Drop`; a double-release or leak would be a
//!   distinct bug in `FrameBufferPool`, exercised separately).

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mirage_core::{
    buffer_pool::FrameBufferPool,
    decode_queue::{DecodeQueue, DecodeQueueConfig},
    reassembler::CompletedFrame,
};
use mirage_proto::header::ContentRect;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Enqueue { keyframe: bool, advance_ms: u16 },
    Dequeue,
    Stop,
}

fuzz_target!(|ops: Vec<Op>| {
    let pool = FrameBufferPool::new(4);
    let config = DecodeQueueConfig { capacity: 6, ..DecodeQueueConfig::default() };
    let mut queue = DecodeQueue::<Instant>::new(config);

    let start = Instant::now();
    let mut elapsed = Duration::ZERO;
    let mut frame_number = 0u32;

    for op in ops.into_iter().take(512) {
        match op {
            Op::Enqueue { keyframe, advance_ms } => {
                elapsed += Duration::from_millis(u64::from(advance_ms) % 2_000);
                let was_full = queue.len() >= config.capacity;

                let buffer = pool.acquire(16);
                let frame = CompletedFrame {
                    bytes: buffer,
                    is_keyframe: keyframe,
                    timestamp_ns: u64::from(frame_number),
                    content_rect: ContentRect { x: 0.0, y: 0.0, w: 1920.0, h: 1080.0 },
                    frame_number,
                };
                frame_number = frame_number.wrapping_add(1);

                let len_before = queue.len();
                queue.enqueue(frame, start + elapsed);
                assert!(queue.len() <= config.capacity);

                if keyframe && was_full {
                    // A keyframe enqueued while full must still occupy a
                    // slot afterward: the queue length is unchanged (one
                    // frame evicted, one admitted), never shrunk.
                    assert_eq!(queue.len(), len_before);
                }
            }
            Op::Dequeue => {
                let _ = queue.dequeue();
            }
            Op::Stop => {
                queue.stop();
                assert!(queue.is_empty());
            }
        }
    }
});
