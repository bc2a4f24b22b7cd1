//! Turmoil network simulation tests for [`mirage_harness::SimHost`].
//!
//! Plain `turmoil::Builder::new().build()` scenarios with a `sim.host` and
//! one or more `sim.client`s, run to completion with `sim.run()`. Exercises the
//! handshake, start-stream, UDP video registration, and encoded-frame
//! delivery path end to end over turmoil's simulated sockets, which is the
//! thing `mirage-harness` exists to make testable without real network I/O.

use std::time::Duration;

use bytes::BytesMut;
use mirage_harness::SimHost;
use mirage_host::driver::HostEvent;
use mirage_host::packet_sender::EncodedFrame;
use mirage_proto::control::Envelope;
use mirage_proto::header::{ContentRect, FrameHeader};
use mirage_proto::payloads::session::Hello;
use mirage_proto::payloads::stream::StartStream;
use mirage_proto::payloads::Payload;
use mirage_proto::{RegistrationPacket, StreamId, WindowId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use turmoil::net::{TcpStream, UdpSocket};

fn hello(device_id: [u8; 16]) -> Hello {
    Hello {
        device_id,
        device_name: "turmoil-client".into(),
        device_type: "test".into(),
        protocol_version: mirage_host::driver::SUPPORTED_PROTOCOL_VERSION,
        capabilities: Vec::new(),
    }
}

fn start_stream() -> StartStream {
    StartStream {
        window_id: WindowId(1),
        preferred_quality: "auto".into(),
        data_port: None,
        scale_factor: None,
        pixel_width: Some(640),
        pixel_height: Some(480),
        display_width: None,
        display_height: None,
        key_frame_interval: None,
        frame_quality: None,
        keyframe_quality: None,
        pixel_format: None,
        color_space: None,
        capture_queue_depth: None,
        min_bitrate: None,
        max_bitrate: None,
        stream_scale: None,
        adaptive_scale_enabled: None,
        latency_mode: None,
        max_refresh_rate: None,
    }
}

async fn send_payload(stream: &mut TcpStream, payload: &Payload) {
    let mut body = BytesMut::new();
    payload.encode(&mut body).expect("payload encodes");
    let envelope = Envelope::new(payload.opcode(), body.freeze());
    let mut wire = BytesMut::new();
    envelope.encode(&mut wire).expect("envelope encodes");
    stream.write_all(&wire).await.expect("write envelope");
}

async fn recv_payload(stream: &mut TcpStream) -> Payload {
    let mut wire = BytesMut::new();
    loop {
        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await.expect("read control stream");
        assert!(n > 0, "control stream closed before a full envelope arrived");
        wire.extend_from_slice(&chunk[..n]);
        let mut view = wire.clone().freeze();
        if let Some(envelope) = Envelope::decode(&mut view) {
            let opcode = envelope.opcode().expect("known opcode");
            return Payload::decode(opcode, &envelope.payload).expect("payload decodes");
        }
    }
}

/// A client that handshakes, starts a stream, registers its UDP peer
/// address, and receives one fragmented encoded frame's worth of video
/// datagrams, all over turmoil's simulated network.
#[test]
fn handshake_start_stream_and_video_delivery() {
    let mut sim = turmoil::Builder::new().build();

    sim.host("host", || async {
        let mut host = SimHost::bind("0.0.0.0:7830", "0.0.0.0:7831", [7u8; 16]).await?;

        let session_id = host.accept_session().await?;
        assert!(host.pump_session(session_id).await?); // Hello
        assert!(host.pump_session(session_id).await?); // StartStream

        let mut reg_buf = [0u8; 64];
        host.recv_video_datagram(&mut reg_buf).await?;

        assert_eq!(host.driver().session_count(), 1);

        let frame = EncodedFrame {
            bytes: vec![0xAB; 9_000],
            is_keyframe: true,
            timestamp_ns: 0,
            content_rect: ContentRect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 },
        };
        host.feed(HostEvent::EncodedFrameReady { session_id, stream_id: StreamId(1), frame }).await?;

        Ok(())
    });

    sim.client("client", async {
        let mut control = TcpStream::connect("host:7830").await?;
        send_payload(&mut control, &Payload::Hello(hello([9u8; 16]))).await;
        let response = recv_payload(&mut control).await;
        let Payload::HelloResponse(response) = response else {
            panic!("expected HelloResponse, got {response:?}");
        };
        assert!(response.accepted);

        let video = UdpSocket::bind("0.0.0.0:0").await?;
        let registration = RegistrationPacket::new([9u8; 16]);
        video.send_to(&registration.to_bytes(), "host:7831").await?;

        send_payload(&mut control, &Payload::StartStream(start_stream())).await;
        let started = recv_payload(&mut control).await;
        assert!(matches!(started, Payload::StreamStarted(_)));

        let mut fragments_received = 0;
        let mut buf = vec![0u8; 2048];
        loop {
            let (n, _peer) = tokio::time::timeout(Duration::from_secs(5), video.recv_from(&mut buf)).await??;
            let header = FrameHeader::parse(&buf[..n]).expect("fragment header parses");
            fragments_received += 1;
            if header.fragment_index() + 1 == header.fragment_count() {
                break;
            }
        }
        assert!(fragments_received > 1, "a 9000-byte frame should fragment into multiple datagrams");

        Ok(())
    });

    sim.run().expect("simulation failed");
}

/// Multiple clients can hold independent sessions against the same host
/// simulated process concurrently.
#[test]
fn concurrent_sessions_stay_independent() {
    let mut sim = turmoil::Builder::new().build();

    sim.host("host", || async {
        let mut host = SimHost::bind("0.0.0.0:7830", "0.0.0.0:7831", [1u8; 16]).await?;
        let first = host.accept_session().await?;
        let second = host.accept_session().await?;
        assert_ne!(first, second);
        assert!(host.pump_session(first).await?);
        assert!(host.pump_session(second).await?);
        assert_eq!(host.driver().device_id_for_session(first), Some([1u8; 16]));
        assert_eq!(host.driver().device_id_for_session(second), Some([2u8; 16]));
        Ok(())
    });

    sim.client("client-a", async {
        let mut control = TcpStream::connect("host:7830").await?;
        send_payload(&mut control, &Payload::Hello(hello([1u8; 16]))).await;
        let response = recv_payload(&mut control).await;
        assert!(matches!(response, Payload::HelloResponse(_)));
        Ok(())
    });

    sim.client("client-b", async {
        let mut control = TcpStream::connect("host:7830").await?;
        send_payload(&mut control, &Payload::Hello(hello([2u8; 16]))).await;
        let response = recv_payload(&mut control).await;
        assert!(matches!(response, Payload::HelloResponse(_)));
        Ok(())
    });

    sim.run().expect("simulation failed");
}

/// A client that disconnects mid-handshake is forgotten by the driver
/// rather than leaving dangling session state.
#[test]
fn disconnect_before_start_stream_cleans_up() {
    let mut sim = turmoil::Builder::new().build();

    sim.host("host", || async {
        let mut host = SimHost::bind("0.0.0.0:7830", "0.0.0.0:7831", [5u8; 16]).await?;
        let session_id = host.accept_session().await?;
        assert!(host.pump_session(session_id).await?); // Hello
        assert!(!host.pump_session(session_id).await?); // peer closed
        assert_eq!(host.driver().session_count(), 0);
        Ok(())
    });

    sim.client("client", async {
        let mut control = TcpStream::connect("host:7830").await?;
        send_payload(&mut control, &Payload::Hello(hello([3u8; 16]))).await;
        let _ = recv_payload(&mut control).await;
        drop(control);
        Ok(())
    });

    sim.run().expect("simulation failed");
}
