//! Fuzz target for `Payload::decode`.
//!
//! The envelope carries no variant tag of its own (the opcode byte is the
//! only discriminant), so a malformed or adversarial CBOR body for *any*
//! opcode must produce a decode error, never a panic or a mismatched
//! variant.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirage_proto::{opcode::Opcode, payloads::Payload};

const OPCODES: &[Opcode] = &[
    Opcode::Hello,
    Opcode::HelloResponse,
    Opcode::Disconnect,
    Opcode::Ping,
    Opcode::Pong,
    Opcode::WindowListRequest,
    Opcode::WindowList,
    Opcode::WindowUpdate,
    Opcode::StartStream,
    Opcode::StopStream,
    Opcode::StreamStarted,
    Opcode::StreamStopped,
    Opcode::StreamMetrics,
    Opcode::InputEvent,
    Opcode::KeyframeRequest,
    Opcode::CursorUpdate,
    Opcode::CursorPosition,
    Opcode::ContentBoundsUpdate,
    Opcode::DisplayResolutionChange,
    Opcode::StreamScaleChange,
    Opcode::StreamRefreshRateChange,
    Opcode::SessionStateUpdate,
    Opcode::UnlockRequest,
    Opcode::UnlockResponse,
    Opcode::LoginDisplayReady,
    Opcode::LoginDisplayStopped,
    Opcode::AppList,
    Opcode::AppSelect,
    Opcode::MenuBarUpdate,
    Opcode::MenuActionRequest,
    Opcode::MenuActionResult,
    Opcode::StartDesktopStream,
    Opcode::StopDesktopStream,
    Opcode::DesktopStreamStarted,
    Opcode::DesktopStreamStopped,
    Opcode::QualityTestRequest,
    Opcode::QualityTestResult,
    Opcode::QualityProbeRequest,
    Opcode::QualityProbeResult,
    Opcode::Error,
];

fuzz_target!(|data: &[u8]| {
    for &opcode in OPCODES {
        if let Ok(payload) = Payload::decode(opcode, data) {
            // A successful decode must self-report the opcode it was
            // decoded for, never a different one.
            assert_eq!(payload.opcode(), opcode);

            // Re-encoding a successfully decoded payload must never panic.
            let mut out = Vec::new();
            let _ = payload.encode(&mut out);
        }
    }
});
