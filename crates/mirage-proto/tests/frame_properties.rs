//! Property-based tests for `FrameHeader` encoding/decoding.
//!
//! Verifies round-trip and CRC properties hold for arbitrary, not just
//! hand-picked, header and payload values (the protocol description §8 universal
//! invariants).

use mirage_proto::{crc, ContentRect, FrameFlags, FrameHeader, TileInfo};
use proptest::prelude::*;

fn arbitrary_content_rect() -> impl Strategy<Value = ContentRect> {
    (
        -10_000.0f32..10_000.0,
        -10_000.0f32..10_000.0,
        0.0f32..10_000.0,
        0.0f32..10_000.0,
    )
        .prop_map(|(x, y, w, h)| ContentRect { x, y, w, h })
}

fn arbitrary_header() -> impl Strategy<Value = FrameHeader> {
    (
        any::<u16>(),
        any::<u8>(),
        any::<u32>(),
        any::<u64>(),
        any::<u32>(),
        any::<u16>(),
        any::<u16>(),
        any::<u16>(),
        arbitrary_content_rect(),
        any::<u16>(),
        prop::collection::vec(any::<u8>(), 0..2048),
    )
        .prop_map(
            |(
                stream_id,
                flag_byte,
                sequence_number,
                timestamp_ns,
                frame_number,
                fragment_index,
                fragment_count,
                epoch,
                content_rect,
                dimension_token,
                payload,
            )| {
                let mut header = FrameHeader::new(
                    stream_id,
                    FrameFlags::from_byte(flag_byte),
                    sequence_number,
                    timestamp_ns,
                    frame_number,
                    fragment_index,
                    fragment_count,
                    epoch,
                    content_rect,
                    dimension_token,
                );
                header.set_payload(&payload);
                header
            },
        )
}

proptest! {
    #[test]
    fn header_round_trips_through_bytes(header in arbitrary_header()) {
        let bytes = header.to_bytes();
        let decoded = FrameHeader::deserialize(&bytes).expect("valid header must deserialize");

        prop_assert_eq!(decoded.stream_id(), header.stream_id());
        prop_assert_eq!(decoded.sequence_number(), header.sequence_number());
        prop_assert_eq!(decoded.timestamp_ns(), header.timestamp_ns());
        prop_assert_eq!(decoded.frame_number(), header.frame_number());
        prop_assert_eq!(decoded.fragment_index(), header.fragment_index());
        prop_assert_eq!(decoded.fragment_count(), header.fragment_count());
        prop_assert_eq!(decoded.payload_length(), header.payload_length());
        prop_assert_eq!(decoded.checksum(), header.checksum());
        prop_assert_eq!(decoded.epoch(), header.epoch());
        prop_assert_eq!(decoded.dimension_token(), header.dimension_token());
    }

    #[test]
    fn crc_is_deterministic_and_sensitive_to_any_byte_change(
        payload in prop::collection::vec(any::<u8>(), 0..4096),
        flip_index in any::<usize>(),
    ) {
        let original = crc::crc32(&payload);
        prop_assert_eq!(crc::crc32(&payload), original);

        if !payload.is_empty() {
            let mut flipped = payload.clone();
            let index = flip_index % flipped.len();
            flipped[index] ^= 0x01;
            prop_assert_ne!(crc::crc32(&flipped), original);
        }
    }

    #[test]
    fn tile_info_round_trips_when_present(
        header in arbitrary_header(),
        grid_columns in any::<u16>(),
        grid_rows in any::<u16>(),
        column in any::<u16>(),
        row in any::<u16>(),
        x in any::<u16>(),
        y in any::<u16>(),
        w in any::<u16>(),
        h in any::<u16>(),
    ) {
        let tiled = header.with_tile(
            TileInfo { grid_columns, grid_rows, column, row, x, y, w, h },
            false,
        );
        let bytes = tiled.to_bytes();
        let decoded = FrameHeader::deserialize(&bytes).expect("valid header must deserialize");

        prop_assert!(decoded.flags().tile());
        let info = decoded.tile_info().expect("tile flag implies tile info");
        prop_assert_eq!(info.grid_columns, grid_columns);
        prop_assert_eq!(info.grid_rows, grid_rows);
        prop_assert_eq!(info.column, column);
        prop_assert_eq!(info.row, row);
        prop_assert_eq!(info.x, x);
        prop_assert_eq!(info.y, y);
        prop_assert_eq!(info.w, w);
        prop_assert_eq!(info.h, h);
    }

    #[test]
    fn deserialize_never_panics_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..200)) {
        let _ = FrameHeader::deserialize(&bytes);
    }
}
