//! CBOR-encoded control-channel payloads.
//!
//! A single `Payload` enum covering every message family, opcode-to-variant
//! mapping via an
//! exhaustive `match`, and CBOR encoding that serializes only the inner
//! struct — never a variant tag — since the envelope's type byte (see
//! `crate::control`) already identifies the payload type. An attacker who
//! flips the type byte without touching the CBOR body gets a decode error,
//! not payload confusion.

pub mod app;
pub mod input;
pub mod probe;
pub mod session;
pub mod stream;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{ProtocolError, Result},
    opcode::Opcode,
};

/// Error payload for `error` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error code identifying the type of error.
    pub code: u16,
    /// Human-readable error message.
    pub message: String,
    /// Optional retry-after duration, seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorPayload {
    /// Transport: not connected.
    pub const NOT_CONNECTED: u16 = 0x0001;
    /// Protocol: unknown opcode.
    pub const UNKNOWN_OPCODE: u16 = 0x0002;
    /// Protocol: envelope truncated or malformed.
    pub const MALFORMED_ENVELOPE: u16 = 0x0003;
    /// Protocol: unsupported protocol version.
    pub const UNSUPPORTED_VERSION: u16 = 0x0004;
    /// Session: stream not found.
    pub const STREAM_NOT_FOUND: u16 = 0x0005;
    /// Session: window not found.
    pub const WINDOW_NOT_FOUND: u16 = 0x0006;
    /// Session: permission denied.
    pub const PERMISSION_DENIED: u16 = 0x0007;

    /// Build an error payload with no retry hint.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), retry_after: None }
    }
}

/// A decoded, opcode-tagged control message.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Initial handshake.
    Hello(session::Hello),
    /// Host's handshake reply.
    HelloResponse(session::HelloResponse),
    /// Graceful disconnect.
    Disconnect(session::Disconnect),
    /// Keepalive ping (zero-byte payload).
    Ping,
    /// Keepalive pong (zero-byte payload).
    Pong,
    /// Request the window list.
    WindowListRequest,
    /// Full window list.
    WindowList(stream::WindowList),
    /// Incremental window list change.
    WindowUpdate(stream::WindowUpdate),
    /// Start streaming a window.
    StartStream(stream::StartStream),
    /// Stop a stream.
    StopStream(stream::StopStream),
    /// Stream started confirmation.
    StreamStarted(stream::StreamStarted),
    /// Stream stopped confirmation.
    StreamStopped(stream::StreamStopped),
    /// Periodic stream metrics.
    StreamMetrics(stream::StreamMetrics),
    /// Synthesized input event.
    InputEvent(input::InputEvent),
    /// Request a fresh keyframe.
    KeyframeRequest(stream::KeyframeRequest),
    /// Cursor image update.
    CursorUpdate(app::CursorUpdate),
    /// Cursor position update.
    CursorPosition(app::CursorPosition),
    /// Content bounds update.
    ContentBoundsUpdate(app::ContentBoundsUpdate),
    /// Display resolution change.
    DisplayResolutionChange(stream::DisplayResolutionChange),
    /// Stream scale change request.
    StreamScaleChange(stream::StreamScaleChange),
    /// Stream refresh rate change request.
    StreamRefreshRateChange(stream::StreamRefreshRateChange),
    /// Session lock-state update.
    SessionStateUpdate(session::SessionStateUpdate),
    /// Unlock request.
    UnlockRequest(session::UnlockRequest),
    /// Unlock response.
    UnlockResponse(session::UnlockResponse),
    /// Login display became available.
    LoginDisplayReady,
    /// Login display stopped.
    LoginDisplayStopped,
    /// Remotable application list request/result (`appList`, `0x80`).
    AppList(app::Opaque),
    /// Remotable application selection (`appSelect`, `0x81`).
    AppSelect(app::Opaque),
    /// Remote menu bar snapshot.
    MenuBarUpdate(app::MenuBarUpdate),
    /// Remote menu action request.
    MenuActionRequest(app::MenuActionRequest),
    /// Remote menu action result.
    MenuActionResult(app::MenuActionResult),
    /// Start a full-desktop stream.
    StartDesktopStream(stream::StartDesktopStream),
    /// Stop a desktop stream.
    StopDesktopStream(stream::StopDesktopStream),
    /// Desktop stream started confirmation.
    DesktopStreamStarted(stream::DesktopStreamStarted),
    /// Desktop stream stopped confirmation.
    DesktopStreamStopped(stream::DesktopStreamStopped),
    /// One-shot codec benchmark request.
    QualityTestRequest(probe::QualityTestRequest),
    /// One-shot codec benchmark result.
    QualityTestResult(probe::QualityTestResult),
    /// Staged bandwidth search request.
    QualityProbeRequest,
    /// Staged bandwidth search result.
    QualityProbeResult(probe::QualityProbeResult),
    /// Generic error response.
    Error(ErrorPayload),
}

macro_rules! cbor_variant {
    ($self:expr, $writer:expr, { $($variant:ident => $inner:expr),* $(,)? }, { $($empty:ident),* $(,)? }) => {
        match $self {
            $(Self::$variant(inner) => ciborium::ser::into_writer(inner, $writer)
                .map_err(|e| ProtocolError::InvalidPayload {
                    opcode: $self.opcode().to_u8(),
                    reason: e.to_string(),
                }),)*
            $(Self::$empty => Ok(()),)*
        }
    };
}

impl Payload {
    /// Opcode corresponding to this payload's variant.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Hello(_) => Opcode::Hello,
            Self::HelloResponse(_) => Opcode::HelloResponse,
            Self::Disconnect(_) => Opcode::Disconnect,
            Self::Ping => Opcode::Ping,
            Self::Pong => Opcode::Pong,
            Self::WindowListRequest => Opcode::WindowListRequest,
            Self::WindowList(_) => Opcode::WindowList,
            Self::WindowUpdate(_) => Opcode::WindowUpdate,
            Self::StartStream(_) => Opcode::StartStream,
            Self::StopStream(_) => Opcode::StopStream,
            Self::StreamStarted(_) => Opcode::StreamStarted,
            Self::StreamStopped(_) => Opcode::StreamStopped,
            Self::StreamMetrics(_) => Opcode::StreamMetrics,
            Self::InputEvent(_) => Opcode::InputEvent,
            Self::KeyframeRequest(_) => Opcode::KeyframeRequest,
            Self::CursorUpdate(_) => Opcode::CursorUpdate,
            Self::CursorPosition(_) => Opcode::CursorPosition,
            Self::ContentBoundsUpdate(_) => Opcode::ContentBoundsUpdate,
            Self::DisplayResolutionChange(_) => Opcode::DisplayResolutionChange,
            Self::StreamScaleChange(_) => Opcode::StreamScaleChange,
            Self::StreamRefreshRateChange(_) => Opcode::StreamRefreshRateChange,
            Self::SessionStateUpdate(_) => Opcode::SessionStateUpdate,
            Self::UnlockRequest(_) => Opcode::UnlockRequest,
            Self::UnlockResponse(_) => Opcode::UnlockResponse,
            Self::LoginDisplayReady => Opcode::LoginDisplayReady,
            Self::LoginDisplayStopped => Opcode::LoginDisplayStopped,
            Self::AppList(_) => Opcode::AppList,
            Self::AppSelect(_) => Opcode::AppSelect,
            Self::MenuBarUpdate(_) => Opcode::MenuBarUpdate,
            Self::MenuActionRequest(_) => Opcode::MenuActionRequest,
            Self::MenuActionResult(_) => Opcode::MenuActionResult,
            Self::StartDesktopStream(_) => Opcode::StartDesktopStream,
            Self::StopDesktopStream(_) => Opcode::StopDesktopStream,
            Self::DesktopStreamStarted(_) => Opcode::DesktopStreamStarted,
            Self::DesktopStreamStopped(_) => Opcode::DesktopStreamStopped,
            Self::QualityTestRequest(_) => Opcode::QualityTestRequest,
            Self::QualityTestResult(_) => Opcode::QualityTestResult,
            Self::QualityProbeRequest => Opcode::QualityProbeRequest,
            Self::QualityProbeResult(_) => Opcode::QualityProbeResult,
            Self::Error(_) => Opcode::Error,
        }
    }

    /// Encode the inner value to CBOR. No variant tag is written.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();
        cbor_variant!(self, &mut writer, {
            Hello => (),
            HelloResponse => (),
            Disconnect => (),
            WindowList => (),
            WindowUpdate => (),
            StartStream => (),
            StopStream => (),
            StreamStarted => (),
            StreamStopped => (),
            StreamMetrics => (),
            InputEvent => (),
            KeyframeRequest => (),
            CursorUpdate => (),
            CursorPosition => (),
            ContentBoundsUpdate => (),
            DisplayResolutionChange => (),
            StreamScaleChange => (),
            StreamRefreshRateChange => (),
            SessionStateUpdate => (),
            UnlockRequest => (),
            UnlockResponse => (),
            AppList => (),
            AppSelect => (),
            MenuBarUpdate => (),
            MenuActionRequest => (),
            MenuActionResult => (),
            StartDesktopStream => (),
            StopDesktopStream => (),
            DesktopStreamStarted => (),
            DesktopStreamStopped => (),
            QualityTestRequest => (),
            QualityTestResult => (),
            QualityProbeResult => (),
            Error => (),
        }, {
            Ping,
            Pong,
            WindowListRequest,
            LoginDisplayReady,
            LoginDisplayStopped,
            QualityProbeRequest,
        })
    }

    /// Decode a payload given its opcode and raw CBOR body.
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        fn cbor<'a, T: Deserialize<'a>>(opcode: Opcode, bytes: &'a [u8]) -> Result<T> {
            ciborium::de::from_reader(bytes)
                .map_err(|e| ProtocolError::InvalidPayload { opcode: opcode.to_u8(), reason: e.to_string() })
        }

        Ok(match opcode {
            Opcode::Hello => Self::Hello(cbor(opcode, bytes)?),
            Opcode::HelloResponse => Self::HelloResponse(cbor(opcode, bytes)?),
            Opcode::Disconnect => Self::Disconnect(cbor(opcode, bytes)?),
            Opcode::Ping => Self::Ping,
            Opcode::Pong => Self::Pong,
            Opcode::WindowListRequest => Self::WindowListRequest,
            Opcode::WindowList => Self::WindowList(cbor(opcode, bytes)?),
            Opcode::WindowUpdate => Self::WindowUpdate(cbor(opcode, bytes)?),
            Opcode::StartStream => Self::StartStream(cbor(opcode, bytes)?),
            Opcode::StopStream => Self::StopStream(cbor(opcode, bytes)?),
            Opcode::StreamStarted => Self::StreamStarted(cbor(opcode, bytes)?),
            Opcode::StreamStopped => Self::StreamStopped(cbor(opcode, bytes)?),
            Opcode::StreamMetrics => Self::StreamMetrics(cbor(opcode, bytes)?),
            Opcode::InputEvent => Self::InputEvent(cbor(opcode, bytes)?),
            Opcode::KeyframeRequest => Self::KeyframeRequest(cbor(opcode, bytes)?),
            Opcode::CursorUpdate => Self::CursorUpdate(cbor(opcode, bytes)?),
            Opcode::CursorPosition => Self::CursorPosition(cbor(opcode, bytes)?),
            Opcode::ContentBoundsUpdate => Self::ContentBoundsUpdate(cbor(opcode, bytes)?),
            Opcode::DisplayResolutionChange => Self::DisplayResolutionChange(cbor(opcode, bytes)?),
            Opcode::StreamScaleChange => Self::StreamScaleChange(cbor(opcode, bytes)?),
            Opcode::StreamRefreshRateChange => Self::StreamRefreshRateChange(cbor(opcode, bytes)?),
            Opcode::SessionStateUpdate => Self::SessionStateUpdate(cbor(opcode, bytes)?),
            Opcode::UnlockRequest => Self::UnlockRequest(cbor(opcode, bytes)?),
            Opcode::UnlockResponse => Self::UnlockResponse(cbor(opcode, bytes)?),
            Opcode::LoginDisplayReady => Self::LoginDisplayReady,
            Opcode::LoginDisplayStopped => Self::LoginDisplayStopped,
            Opcode::AppList => Self::AppList(cbor(opcode, bytes)?),
            Opcode::AppSelect => Self::AppSelect(cbor(opcode, bytes)?),
            Opcode::MenuBarUpdate => Self::MenuBarUpdate(cbor(opcode, bytes)?),
            Opcode::MenuActionRequest => Self::MenuActionRequest(cbor(opcode, bytes)?),
            Opcode::MenuActionResult => Self::MenuActionResult(cbor(opcode, bytes)?),
            Opcode::StartDesktopStream => Self::StartDesktopStream(cbor(opcode, bytes)?),
            Opcode::StopDesktopStream => Self::StopDesktopStream(cbor(opcode, bytes)?),
            Opcode::DesktopStreamStarted => Self::DesktopStreamStarted(cbor(opcode, bytes)?),
            Opcode::DesktopStreamStopped => Self::DesktopStreamStopped(cbor(opcode, bytes)?),
            Opcode::QualityTestRequest => Self::QualityTestRequest(cbor(opcode, bytes)?),
            Opcode::QualityTestResult => Self::QualityTestResult(cbor(opcode, bytes)?),
            Opcode::QualityProbeRequest => Self::QualityProbeRequest,
            Opcode::QualityProbeResult => Self::QualityProbeResult(cbor(opcode, bytes)?),
            Opcode::Error => Self::Error(cbor(opcode, bytes)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    fn round_trip(opcode: Opcode, payload: &Payload) {
        let mut wire = BytesMut::new();
        payload.encode(&mut wire).expect("should encode");
        let decoded = Payload::decode(opcode, &wire).expect("should decode");
        assert_eq!(&decoded, payload);
    }

    #[test]
    fn ping_pong_are_zero_byte() {
        let mut wire = BytesMut::new();
        Payload::Ping.encode(&mut wire).unwrap();
        assert!(wire.is_empty());
    }

    #[test]
    fn hello_round_trips() {
        let payload = Payload::Hello(session::Hello {
            device_id: [1; 16],
            device_name: "studio".to_string(),
            device_type: "mac".to_string(),
            protocol_version: 3,
            capabilities: vec!["hevc".to_string()],
        });
        round_trip(Opcode::Hello, &payload);
    }

    #[test]
    fn start_stream_round_trips_with_optional_fields_absent() {
        let payload = Payload::StartStream(stream::StartStream {
            window_id: 7.into(),
            preferred_quality: "auto".to_string(),
            data_port: None,
            scale_factor: None,
            pixel_width: None,
            pixel_height: None,
            display_width: None,
            display_height: None,
            key_frame_interval: None,
            frame_quality: Some(0.8),
            keyframe_quality: Some(0.95),
            pixel_format: None,
            color_space: None,
            capture_queue_depth: None,
            min_bitrate: None,
            max_bitrate: None,
            stream_scale: None,
            adaptive_scale_enabled: None,
            latency_mode: None,
            max_refresh_rate: None,
        });
        round_trip(Opcode::StartStream, &payload);
    }

    #[test]
    fn error_payload_round_trips() {
        let payload = Payload::Error(ErrorPayload::new(ErrorPayload::STREAM_NOT_FOUND, "no such stream"));
        round_trip(Opcode::Error, &payload);
    }

    #[test]
    fn no_variant_tag_is_serialized() {
        // A Ping and a Pong both encode to zero bytes: the opcode alone
        // disambiguates them, proving no discriminant rides in the CBOR body.
        let mut ping_wire = BytesMut::new();
        let mut pong_wire = BytesMut::new();
        Payload::Ping.encode(&mut ping_wire).unwrap();
        Payload::Pong.encode(&mut pong_wire).unwrap();
        assert_eq!(ping_wire, pong_wire);
    }
}
