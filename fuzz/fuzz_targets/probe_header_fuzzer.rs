//! Fuzz target for `ProbeHeader::parse` (the quality-probe UDP wire format,
//! §4.8). Distinct layout from `FrameHeader` despite sharing the `"MIRQ"`
//! magic with the registration packet, so the parser must reject the
//! registration packet's 20-byte form just as readily as random garbage.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirage_proto::probe_packet::ProbeHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = ProbeHeader::parse(data) {
        let reencoded = header.to_bytes();
        assert_eq!(reencoded.len(), ProbeHeader::SIZE);
        assert_eq!(&reencoded[..], &data[..ProbeHeader::SIZE]);
    }
});
