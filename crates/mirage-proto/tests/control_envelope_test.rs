//! Integration tests for the control-channel envelope plus CBOR payload
//! pipeline together (as a transport actually uses them: encode a `Payload`,
//! wrap it in an `Envelope`, push it through the deframer, decode it back).

use bytes::{Bytes, BytesMut};
use mirage_proto::{
    payloads::{session, stream},
    Envelope, Opcode, Payload,
};

fn send(payload: &Payload, wire: &mut BytesMut) {
    let mut body = BytesMut::new();
    payload.encode(&mut body).expect("payload encodes");
    Envelope::new(payload.opcode(), body.freeze()).encode(wire).expect("envelope encodes");
}

#[test]
fn hello_then_start_stream_deframe_in_order() {
    let hello = Payload::Hello(session::Hello {
        device_id: [1; 16],
        device_name: "mac-studio".to_string(),
        device_type: "macos".to_string(),
        protocol_version: 3,
        capabilities: vec!["hevc".to_string(), "fec".to_string()],
    });
    let start_stream = Payload::StartStream(stream::StartStream {
        window_id: 42.into(),
        preferred_quality: "high".to_string(),
        data_port: Some(7777),
        scale_factor: None,
        pixel_width: Some(1920),
        pixel_height: Some(1080),
        display_width: None,
        display_height: None,
        key_frame_interval: Some(120),
        frame_quality: Some(0.85),
        keyframe_quality: Some(0.95),
        pixel_format: None,
        color_space: None,
        capture_queue_depth: None,
        min_bitrate: None,
        max_bitrate: Some(8_000_000),
        stream_scale: None,
        adaptive_scale_enabled: Some(true),
        latency_mode: None,
        max_refresh_rate: None,
    });

    let mut wire = BytesMut::new();
    send(&hello, &mut wire);
    send(&start_stream, &mut wire);

    let mut buf = wire.freeze();

    let first = Envelope::decode(&mut buf).expect("hello deframes");
    let first_payload =
        Payload::decode(first.opcode().expect("known opcode"), &first.payload).expect("decodes");
    assert_eq!(first_payload, hello);

    let second = Envelope::decode(&mut buf).expect("start_stream deframes");
    let second_payload =
        Payload::decode(second.opcode().expect("known opcode"), &second.payload).expect("decodes");
    assert_eq!(second_payload, start_stream);

    assert!(buf.is_empty());
}

#[test]
fn partial_message_yields_no_envelope_until_complete() {
    let mut wire = BytesMut::new();
    send(&Payload::Ping, &mut wire);
    let full = wire.freeze();

    // Feed one byte at a time; only once every byte has arrived should the
    // deframer yield anything.
    for split_at in 0..full.len() {
        let mut partial = full.slice(0..split_at);
        assert!(
            Envelope::decode(&mut partial).is_none(),
            "should not deframe from {split_at} of {} bytes",
            full.len()
        );
    }

    let mut complete: Bytes = full;
    assert!(Envelope::decode(&mut complete).is_some());
}

#[test]
fn unrecognized_opcode_is_reported_not_silently_dropped() {
    let mut wire = BytesMut::new();
    Envelope::new(Opcode::Ping, Bytes::new()).encode(&mut wire).expect("encodes");
    let mut buf = wire.freeze();
    // Corrupt the type byte to something outside the known table.
    let mut corrupted = BytesMut::from(&buf[..]);
    corrupted[0] = 0xC4;
    buf = corrupted.freeze();

    let envelope = Envelope::decode(&mut buf).expect("still deframes on length alone");
    assert_eq!(envelope.opcode(), None);
    assert_eq!(envelope.type_byte, 0xC4);
}
