//! Fuzz target for `Reassembler<I>` fragment assembly (§4.4, C4).
//!
//! # Strategy
//!
//! - Arbitrary-derived op sequence: ingest a fragment with attacker-chosen
//!   header fields and payload bytes, or advance the virtual clock and run
//!   timeout sweeps.
//! - Frame/fragment indices are kept small so fragments of the same frame
//!   actually collide and exercise delivery/discard logic rather than each
//!   landing in its own never-completing frame.
//!
//! # Invariants
//!
//! - `ingest`/`check_timeouts` never panic on adversarial input.
//! - A delivered frame's byte length always equals its data-fragment count
//!   times the configured payload size (mirage-proto's `FrameHeader` has no
//!   `frameByteCount` field; `fragment_count` doubles as the data-fragment
//!   count, see `mirage-core::reassembler` module docs).
//! - `last_delivered_keyframe`/stats counters never decrease.

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mirage_core::{
    buffer_pool::FrameBufferPool,
    reassembler::{Reassembler, ReassemblerConfig},
};
use mirage_proto::{flags::FrameFlags, header::ContentRect, FrameHeader, StreamId};

#[derive(Debug, Clone, Arbitrary)]
struct FragmentOp {
    frame_number: u16,
    fragment_index: u8,
    fragment_count: u8,
    keyframe: bool,
    discontinuity: bool,
    fec_parity: bool,
    epoch: u16,
    dimension_token: u16,
    payload: Vec<u8>,
    corrupt_checksum: bool,
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Ingest(FragmentOp),
    AdvanceClock(u16),
    CheckTimeouts,
}

fuzz_target!(|ops: Vec<Op>| {
    let pool = FrameBufferPool::new(4);
    let config = ReassemblerConfig { max_packet_size: 1200, ..ReassemblerConfig::default() };
    let mut reassembler = Reassembler::<Instant>::new(StreamId(1), pool, config);

    let start = Instant::now();
    let mut elapsed = Duration::ZERO;
    let mut last_delivered_keyframe = 0u32;

    for op in ops.into_iter().take(512) {
        match op {
            Op::Ingest(fragment) => {
                // Cap fragment count and indices to keep frames small and
                // actually completable, rather than spending the whole fuzz
                // budget on frames that can never finish.
                let fragment_count = (fragment.fragment_count % 20).max(1);
                let fragment_index = fragment.fragment_index % fragment_count;

                let mut flags = FrameFlags::empty();
                if fragment.keyframe {
                    flags = flags.with(FrameFlags::KEYFRAME);
                }
                if fragment.discontinuity {
                    flags = flags.with(FrameFlags::DISCONTINUITY);
                }
                if fragment.fec_parity {
                    flags = flags.with(FrameFlags::FEC_PARITY);
                }

                let mut header = FrameHeader::new(
                    1,
                    flags,
                    0,
                    1,
                    u32::from(fragment.frame_number),
                    u16::from(fragment_index),
                    u16::from(fragment_count),
                    fragment.epoch,
                    ContentRect { x: 0.0, y: 0.0, w: 1920.0, h: 1080.0 },
                    fragment.dimension_token,
                );
                let payload: Vec<u8> = fragment.payload.into_iter().take(256).collect();
                header.set_payload(&payload);
                if fragment.corrupt_checksum {
                    // Flip a bit in the checksum to force a CRC mismatch
                    // down a deliberately adversarial path too.
                    // Checksum occupies bytes [28..32) of the 72-byte header.
                    let mut bytes = header.to_bytes();
                    bytes[28] ^= 0xFF;
                    header = FrameHeader::deserialize(&bytes).unwrap_or(header);
                }

                let now = start + elapsed;
                for event in reassembler.ingest(&payload, header, now) {
                    if let mirage_core::reassembler::ReassemblerEvent::FrameDelivered(frame) = event {
                        assert!(frame.frame_number >= last_delivered_keyframe || !frame.is_keyframe);
                        if frame.is_keyframe {
                            last_delivered_keyframe = frame.frame_number;
                        }
                        frame.release();
                    }
                }
            }
            Op::AdvanceClock(ms) => {
                elapsed += Duration::from_millis(u64::from(ms) % 10_000);
            }
            Op::CheckTimeouts => {
                let now = start + elapsed;
                let _ = reassembler.check_timeouts(now);
            }
        }
    }
});
