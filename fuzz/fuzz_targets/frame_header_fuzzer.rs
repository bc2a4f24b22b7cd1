//! Fuzz target for `FrameHeader::deserialize`/`parse`.
//!
//! Arbitrary bytes must never panic the zero-copy header parse, and the two
//! entry points (`Option`-returning and `Result`-returning) must agree on
//! whether a buffer is valid.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirage_proto::header::FrameHeader;

fuzz_target!(|data: &[u8]| {
    let option_result = FrameHeader::deserialize(data);
    let typed_result = FrameHeader::parse(data);

    assert_eq!(option_result.is_some(), typed_result.is_ok());

    if let Some(header) = option_result {
        // Re-serializing a parsed header must reproduce the same leading
        // bytes the parser consumed.
        let reencoded = header.to_bytes();
        assert_eq!(reencoded.len(), FrameHeader::SIZE);
        assert_eq!(&reencoded[..], &data[..FrameHeader::SIZE]);

        // Field accessors must never panic, including on tile info that's
        // only meaningfully populated when the tile flag is set.
        let _ = header.flags();
        let _ = header.stream_id();
        let _ = header.frame_number();
        let _ = header.fragment_index();
        let _ = header.fragment_count();
        let _ = header.content_rect();
        let _ = header.tile_info();
        let _ = header.dimension_token();
        let _ = header.epoch();
        let _ = header.verify_checksum(&data[FrameHeader::SIZE.min(data.len())..]);
    }
});
