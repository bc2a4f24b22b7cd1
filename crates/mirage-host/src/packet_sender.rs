//! UDP packet sender (§4.9, C9).
//!
//! Grounded on
//! `examples/other_examples/cfe2ab28_..._video_sender.rs.rs`'s
//! fragment-loop/header-then-payload datagram assembly, generalized to
//! `mirage_proto::FrameHeader`'s richer layout, optional per-block XOR
//! parity, and keyframe pacing. Reuses
//! `mirage_core::reassembler::ReassemblerConfig`'s `max_payload_size`/
//! `fec_block_size` rather than redefining them, so the sender and the
//! client's reassembler always agree on fragment sizing.

use std::time::Duration;

use mirage_core::reassembler::ReassemblerConfig;
use mirage_proto::{header::ContentRect, FrameFlags, FrameHeader, StreamId};

use crate::{
    config::HostConfig,
    error::{HostError, Result},
};

/// One already-encoded frame, handed to the sender by the (external)
/// encoder pipeline.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Raw encoded bytes (NAL units or equivalent; opaque to this crate).
    pub bytes: Vec<u8>,
    /// Whether this frame is a keyframe.
    pub is_keyframe: bool,
    /// Presentation timestamp, nanoseconds.
    pub timestamp_ns: u64,
    /// Content sub-rectangle this frame covers.
    pub content_rect: ContentRect,
}

/// A group of packets to send together, after waiting `delay_before`.
#[derive(Debug, Clone)]
pub struct PacedBurst {
    /// Ready-to-send UDP datagrams, in order.
    pub packets: Vec<Vec<u8>>,
    /// Delay to wait before sending this burst (zero for the first burst).
    pub delay_before: Duration,
}

/// Fragments encoded frames into `FrameHeader`-prefixed UDP datagrams.
pub struct PacketSender {
    reassembler_config: ReassemblerConfig,
    fec_enabled: bool,
    pacing_burst_fragments: usize,
    pacing_delay: Duration,
}

impl PacketSender {
    /// Build a sender from host configuration.
    #[must_use]
    pub fn new(config: &HostConfig) -> Self {
        Self {
            reassembler_config: ReassemblerConfig { max_packet_size: config.max_packet_size, ..ReassemblerConfig::default() },
            fec_enabled: config.fec_enabled,
            pacing_burst_fragments: config.keyframe_pacing_burst_fragments,
            pacing_delay: config.keyframe_pacing_delay,
        }
    }

    /// Fragment `frame` into UDP datagrams, optionally append XOR parity,
    /// and group them into paced bursts (§4.9).
    pub fn fragment(
        &self,
        stream_id: StreamId,
        frame_number: u32,
        epoch: u16,
        dimension_token: u16,
        sequence_number_start: u32,
        frame: &EncodedFrame,
    ) -> Result<Vec<PacedBurst>> {
        let max_payload = self.reassembler_config.max_payload_size();
        let byte_count = frame.bytes.len();
        let data_fragment_count_usize = byte_count.div_ceil(max_payload).max(1);
        if data_fragment_count_usize > usize::from(u16::MAX) {
            return Err(HostError::FrameTooLarge { byte_count, max_payload_size: max_payload });
        }
        let data_fragment_count = data_fragment_count_usize as u16;

        let mut sequence_number = sequence_number_start;
        let mut packets = Vec::with_capacity(data_fragment_count_usize);

        for index in 0..data_fragment_count {
            let start = usize::from(index) * max_payload;
            let end = (start + max_payload).min(byte_count);
            let payload = &frame.bytes[start..end];

            let mut flags = FrameFlags::empty();
            if frame.is_keyframe {
                flags = flags.with(FrameFlags::KEYFRAME);
            }
            if index + 1 == data_fragment_count {
                flags = flags.with(FrameFlags::END_OF_FRAME);
            }

            packets.push(self.build_packet(
                stream_id,
                flags,
                sequence_number,
                frame,
                frame_number,
                index,
                data_fragment_count,
                epoch,
                dimension_token,
                payload,
            ));
            sequence_number = sequence_number.wrapping_add(1);
        }

        if self.fec_enabled {
            let block_size = usize::from(self.reassembler_config.fec_block_size(frame.is_keyframe));
            let block_count = data_fragment_count_usize.div_ceil(block_size);

            for block in 0..block_count {
                let block_start = block * block_size;
                let block_end = (block_start + block_size).min(data_fragment_count_usize);
                let parity = xor_block(&frame.bytes, block_start, block_end, max_payload, byte_count);

                let mut flags = FrameFlags::empty().with(FrameFlags::FEC_PARITY);
                if frame.is_keyframe {
                    flags = flags.with(FrameFlags::KEYFRAME);
                }
                let fragment_index = data_fragment_count + block as u16;

                packets.push(self.build_packet(
                    stream_id,
                    flags,
                    sequence_number,
                    frame,
                    frame_number,
                    fragment_index,
                    data_fragment_count,
                    epoch,
                    dimension_token,
                    &parity,
                ));
                sequence_number = sequence_number.wrapping_add(1);
            }
        }

        Ok(self.pace(packets, frame.is_keyframe))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_packet(
        &self,
        stream_id: StreamId,
        flags: FrameFlags,
        sequence_number: u32,
        frame: &EncodedFrame,
        frame_number: u32,
        fragment_index: u16,
        fragment_count: u16,
        epoch: u16,
        dimension_token: u16,
        payload: &[u8],
    ) -> Vec<u8> {
        let mut header = FrameHeader::new(
            stream_id.0,
            flags,
            sequence_number,
            frame.timestamp_ns,
            frame_number,
            fragment_index,
            fragment_count,
            epoch,
            frame.content_rect,
            dimension_token,
        );
        header.set_payload(payload);
        let mut packet = header.to_bytes().to_vec();
        packet.extend_from_slice(payload);
        packet
    }

    fn pace(&self, packets: Vec<Vec<u8>>, is_keyframe: bool) -> Vec<PacedBurst> {
        if !is_keyframe || packets.len() <= self.pacing_burst_fragments || self.pacing_burst_fragments == 0 {
            return vec![PacedBurst { packets, delay_before: Duration::ZERO }];
        }
        packets
            .chunks(self.pacing_burst_fragments)
            .enumerate()
            .map(|(i, chunk)| PacedBurst {
                packets: chunk.to_vec(),
                delay_before: if i == 0 { Duration::ZERO } else { self.pacing_delay },
            })
            .collect()
    }
}

fn xor_block(bytes: &[u8], fragment_start: usize, fragment_end: usize, max_payload: usize, byte_count: usize) -> Vec<u8> {
    let mut parity = vec![0u8; max_payload];
    for index in fragment_start..fragment_end {
        let start = index * max_payload;
        let end = (start + max_payload).min(byte_count);
        if start >= end {
            continue;
        }
        for (p, b) in parity.iter_mut().zip(bytes[start..end].iter()) {
            *p ^= *b;
        }
    }
    parity
}

#[cfg(test)]
mod tests {
    use mirage_proto::FrameHeader as Header;

    use super::*;

    fn sample_frame(len: usize, is_keyframe: bool) -> EncodedFrame {
        EncodedFrame {
            bytes: (0..len).map(|i| i as u8).collect(),
            is_keyframe,
            timestamp_ns: 1,
            content_rect: ContentRect { x: 0.0, y: 0.0, w: 1920.0, h: 1080.0 },
        }
    }

    #[test]
    fn fragments_a_small_frame_into_one_packet() {
        let sender = PacketSender::new(&HostConfig::default());
        let frame = sample_frame(100, false);
        let bursts = sender.fragment(StreamId(1), 0, 0, 0, 0, &frame).unwrap();
        let packets: Vec<_> = bursts.into_iter().flat_map(|b| b.packets).collect();
        assert_eq!(packets.len(), 1);
        let header = Header::parse(&packets[0]).unwrap();
        assert_eq!(header.fragment_count(), 1);
        assert!(header.flags().end_of_frame());
    }

    #[test]
    fn fragments_a_large_frame_into_many_packets_with_parity() {
        let config = HostConfig { max_packet_size: 200, ..HostConfig::default() };
        let sender = PacketSender::new(&config);
        let max_payload = config.max_packet_size - FrameHeader::SIZE;
        let frame = sample_frame(max_payload * 40, false);

        let bursts = sender.fragment(StreamId(3), 5, 0, 0, 100, &frame).unwrap();
        let packets: Vec<_> = bursts.into_iter().flat_map(|b| b.packets).collect();

        let data_count = 40u16;
        let block_size = 16u16;
        let parity_count = data_count.div_ceil(block_size);
        assert_eq!(packets.len(), usize::from(data_count + parity_count));

        let parity_packets: Vec<_> =
            packets.iter().map(|p| Header::parse(p).unwrap()).filter(|h| h.flags().fec_parity()).collect();
        assert_eq!(parity_packets.len(), usize::from(parity_count));
    }

    #[test]
    fn keyframes_are_paced_into_bounded_bursts() {
        let config = HostConfig { max_packet_size: 200, keyframe_pacing_burst_fragments: 4, ..HostConfig::default() };
        let sender = PacketSender::new(&config);
        let max_payload = config.max_packet_size - FrameHeader::SIZE;
        let frame = sample_frame(max_payload * 10, true);

        let bursts = sender.fragment(StreamId(1), 0, 0, 0, 0, &frame).unwrap();
        assert!(bursts.len() > 1);
        assert_eq!(bursts[0].delay_before, Duration::ZERO);
        assert!(bursts[1].delay_before > Duration::ZERO);
        assert!(bursts.iter().all(|b| b.packets.len() <= 4));
    }

    #[test]
    fn disabling_fec_emits_only_data_fragments() {
        let config = HostConfig { max_packet_size: 200, fec_enabled: false, ..HostConfig::default() };
        let sender = PacketSender::new(&config);
        let max_payload = config.max_packet_size - FrameHeader::SIZE;
        let frame = sample_frame(max_payload * 5, false);

        let bursts = sender.fragment(StreamId(1), 0, 0, 0, 0, &frame).unwrap();
        let packets: Vec<_> = bursts.into_iter().flat_map(|b| b.packets).collect();
        assert_eq!(packets.len(), 5);
        assert!(packets.iter().all(|p| !Header::parse(p).unwrap().flags().fec_parity()));
    }
}
