//! UDP video/data channel: registration, best-effort send, and the
//! validate-then-dispatch receive loop (§4.7/§6).

use std::net::SocketAddr;

use mirage_proto::{FrameHeader, RegistrationPacket};
use tokio::net::{ToSocketAddrs, UdpSocket};

use crate::error::{Result, TransportError};

/// One received UDP datagram, classified by its magic number.
#[derive(Debug)]
pub enum VideoDatagram {
    /// A `"MIRQ"` registration packet associating a UDP peer with a device.
    Registration(RegistrationPacket),
    /// A `"MIRG"` video frame fragment: its header and the payload bytes
    /// that followed it in the same datagram.
    Frame {
        /// Parsed, validated frame header.
        header: FrameHeader,
        /// Payload bytes (the datagram minus the header).
        payload: Vec<u8>,
    },
}

/// The UDP data channel for one session.
pub struct VideoChannel {
    socket: UdpSocket,
}

impl VideoChannel {
    /// Bind a UDP socket for sending/receiving video packets.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(TransportError::ConnectionFailed)?;
        Ok(Self { socket })
    }

    /// Locally bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send the client's registration packet to `peer` (§4.7: "the
    /// client, immediately after UDP is up, sends a special 20-byte
    /// packet").
    pub async fn send_registration(&self, peer: SocketAddr, device_id: [u8; 16]) -> Result<()> {
        let packet = RegistrationPacket::new(device_id);
        self.socket.send_to(&packet.to_bytes(), peer).await.map_err(TransportError::ConnectionFailed)?;
        Ok(())
    }

    /// Fire-and-forget send of pre-built video packets, in the order
    /// submitted (§4.7 `sendVideoPackets`).
    pub async fn send_video_packets(&self, peer: SocketAddr, packets: &[Vec<u8>]) -> Result<()> {
        for packet in packets {
            self.socket.send_to(packet, peer).await.map_err(TransportError::ConnectionFailed)?;
        }
        Ok(())
    }

    /// Receive one datagram and classify it. Datagrams shorter than the
    /// smaller of the two known magic-prefixed formats are rejected (spec
    /// §4.7: "expect at least 70 bytes" for video packets; this crate's
    /// header is 72 bytes, see `mirage-proto`'s `DESIGN.md` rationale).
    pub async fn recv_datagram(&self, buf: &mut [u8]) -> Result<(SocketAddr, VideoDatagram)> {
        let (n, peer) = self.socket.recv_from(buf).await.map_err(TransportError::ConnectionFailed)?;
        let datagram = Self::classify(&buf[..n])?;
        Ok((peer, datagram))
    }

    fn classify(bytes: &[u8]) -> Result<VideoDatagram> {
        if bytes.len() >= RegistrationPacket::SIZE && bytes[0..4] == RegistrationPacket::MAGIC {
            let packet = RegistrationPacket::parse(bytes)?;
            return Ok(VideoDatagram::Registration(packet));
        }
        if bytes.len() < FrameHeader::SIZE {
            return Err(TransportError::ShortDatagram { expected: FrameHeader::SIZE, actual: bytes.len() });
        }
        let header = FrameHeader::parse(bytes)?;
        let payload = bytes[FrameHeader::SIZE..].to_vec();
        Ok(VideoDatagram::Frame { header, payload })
    }
}

#[cfg(test)]
mod tests {
    use mirage_proto::{header::ContentRect, FrameFlags};

    use super::*;

    #[tokio::test]
    async fn round_trips_a_registration_packet_over_loopback() {
        let server = VideoChannel::bind("127.0.0.1:0").await.unwrap();
        let client = VideoChannel::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        client.send_registration(server_addr, [3u8; 16]).await.unwrap();

        let mut buf = [0u8; 1500];
        let (_, datagram) = server.recv_datagram(&mut buf).await.unwrap();
        match datagram {
            VideoDatagram::Registration(packet) => assert_eq!(packet.device_id, [3u8; 16]),
            VideoDatagram::Frame { .. } => panic!("expected a registration packet"),
        }
    }

    #[tokio::test]
    async fn round_trips_a_video_fragment_over_loopback() {
        let server = VideoChannel::bind("127.0.0.1:0").await.unwrap();
        let client = VideoChannel::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        let mut header = FrameHeader::new(
            7,
            FrameFlags::empty().with(FrameFlags::KEYFRAME),
            1,
            0,
            1,
            0,
            1,
            0,
            ContentRect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 },
            0,
        );
        header.set_payload(b"hello");
        let mut packet = header.to_bytes().to_vec();
        packet.extend_from_slice(b"hello");

        client.send_video_packets(server_addr, &[packet]).await.unwrap();

        let mut buf = [0u8; 1500];
        let (_, datagram) = server.recv_datagram(&mut buf).await.unwrap();
        match datagram {
            VideoDatagram::Frame { header, payload } => {
                assert!(header.flags().keyframe());
                assert_eq!(payload, b"hello");
            },
            VideoDatagram::Registration(_) => panic!("expected a video fragment"),
        }
    }

    #[tokio::test]
    async fn short_datagram_is_rejected() {
        let server = VideoChannel::bind("127.0.0.1:0").await.unwrap();
        let client = VideoChannel::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        client.send_video_packets(server_addr, &[vec![1, 2, 3]]).await.unwrap();

        let mut buf = [0u8; 1500];
        assert!(server.recv_datagram(&mut buf).await.is_err());
    }
}
