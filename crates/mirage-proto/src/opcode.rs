//! Control-channel opcode table.
//!
//! One variant per wire value, with `to_u8`/`from_u8` conversion, carried as
//! a single `u8` discriminant per the control envelope in `crate::control`.
//! Values are part of the wire contract and must not be renumbered.

/// Control-channel message type, carried as the envelope's leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Opcode {
    /// Initial handshake from client to host.
    Hello,
    /// Host's reply to `hello`.
    HelloResponse,
    /// Graceful disconnect notice.
    Disconnect,
    /// Keepalive ping.
    Ping,
    /// Keepalive pong.
    Pong,
    /// Request the list of capturable windows.
    WindowListRequest,
    /// Full window list response.
    WindowList,
    /// Incremental window list update.
    WindowUpdate,
    /// Request to start streaming a window.
    StartStream,
    /// Request to stop a stream.
    StopStream,
    /// Host confirms a stream has started.
    StreamStarted,
    /// Host confirms a stream has stopped.
    StreamStopped,
    /// Periodic stream metrics report.
    StreamMetrics,
    /// Synthesized input event for playback on the host.
    InputEvent,
    /// Client requests a fresh keyframe.
    KeyframeRequest,
    /// Cursor image update.
    CursorUpdate,
    /// Cursor position update.
    CursorPosition,
    /// Content bounds (visible sub-rect) update.
    ContentBoundsUpdate,
    /// Host display resolution changed.
    DisplayResolutionChange,
    /// Client requests a different stream scale.
    StreamScaleChange,
    /// Client requests a different stream refresh rate.
    StreamRefreshRateChange,
    /// Session (lock/unlock) state update.
    SessionStateUpdate,
    /// Client requests the host's login session be unlocked.
    UnlockRequest,
    /// Host's response to an unlock request.
    UnlockResponse,
    /// Host's login display became available for streaming.
    LoginDisplayReady,
    /// Host's login display stopped.
    LoginDisplayStopped,
    /// Request the list of remotable applications.
    AppList,
    /// Select a remotable application to bring to front.
    AppSelect,
    /// Remote menu-bar snapshot.
    MenuBarUpdate,
    /// Remote menu action request.
    MenuActionRequest,
    /// Result of a remote menu action.
    MenuActionResult,
    /// Request to start a desktop (not single-window) stream.
    StartDesktopStream,
    /// Request to stop a desktop stream.
    StopDesktopStream,
    /// Host confirms a desktop stream has started.
    DesktopStreamStarted,
    /// Host confirms a desktop stream has stopped.
    DesktopStreamStopped,
    /// Request a one-shot codec benchmark.
    QualityTestRequest,
    /// Result of a one-shot codec benchmark.
    QualityTestResult,
    /// Request a staged bandwidth probe.
    QualityProbeRequest,
    /// Result of a staged bandwidth probe.
    QualityProbeResult,
    /// Generic error response.
    Error,
}

impl Opcode {
    /// Wire value for this opcode.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Hello => 0x01,
            Self::HelloResponse => 0x02,
            Self::Disconnect => 0x03,
            Self::Ping => 0x04,
            Self::Pong => 0x05,
            Self::WindowListRequest => 0x20,
            Self::WindowList => 0x21,
            Self::WindowUpdate => 0x22,
            Self::StartStream => 0x23,
            Self::StopStream => 0x24,
            Self::StreamStarted => 0x25,
            Self::StreamStopped => 0x26,
            Self::StreamMetrics => 0x27,
            Self::InputEvent => 0x30,
            Self::KeyframeRequest => 0x42,
            Self::CursorUpdate => 0x50,
            Self::CursorPosition => 0x51,
            Self::ContentBoundsUpdate => 0x60,
            Self::DisplayResolutionChange => 0x61,
            Self::StreamScaleChange => 0x62,
            Self::StreamRefreshRateChange => 0x63,
            Self::SessionStateUpdate => 0x70,
            Self::UnlockRequest => 0x71,
            Self::UnlockResponse => 0x72,
            Self::LoginDisplayReady => 0x73,
            Self::LoginDisplayStopped => 0x74,
            Self::AppList => 0x80,
            Self::AppSelect => 0x81,
            Self::MenuBarUpdate => 0x90,
            Self::MenuActionRequest => 0x91,
            Self::MenuActionResult => 0x92,
            Self::StartDesktopStream => 0xA0,
            Self::StopDesktopStream => 0xA1,
            Self::DesktopStreamStarted => 0xA2,
            Self::DesktopStreamStopped => 0xA3,
            Self::QualityTestRequest => 0xA4,
            Self::QualityTestResult => 0xA5,
            Self::QualityProbeRequest => 0xA6,
            Self::QualityProbeResult => 0xA7,
            Self::Error => 0xFF,
        }
    }

    /// Recover an opcode from its wire value, if recognized.
    ///
    /// Unknown values are not an error at this layer: the protocol description §4.2 requires
    /// the framer to honor the declared length and let the caller decide
    /// whether to skip or escalate, so callers handle the `None` case rather
    /// than this function returning a `Result`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => Self::Hello,
            0x02 => Self::HelloResponse,
            0x03 => Self::Disconnect,
            0x04 => Self::Ping,
            0x05 => Self::Pong,
            0x20 => Self::WindowListRequest,
            0x21 => Self::WindowList,
            0x22 => Self::WindowUpdate,
            0x23 => Self::StartStream,
            0x24 => Self::StopStream,
            0x25 => Self::StreamStarted,
            0x26 => Self::StreamStopped,
            0x27 => Self::StreamMetrics,
            0x30 => Self::InputEvent,
            0x42 => Self::KeyframeRequest,
            0x50 => Self::CursorUpdate,
            0x51 => Self::CursorPosition,
            0x60 => Self::ContentBoundsUpdate,
            0x61 => Self::DisplayResolutionChange,
            0x62 => Self::StreamScaleChange,
            0x63 => Self::StreamRefreshRateChange,
            0x70 => Self::SessionStateUpdate,
            0x71 => Self::UnlockRequest,
            0x72 => Self::UnlockResponse,
            0x73 => Self::LoginDisplayReady,
            0x74 => Self::LoginDisplayStopped,
            0x80 => Self::AppList,
            0x81 => Self::AppSelect,
            0x90 => Self::MenuBarUpdate,
            0x91 => Self::MenuActionRequest,
            0x92 => Self::MenuActionResult,
            0xA0 => Self::StartDesktopStream,
            0xA1 => Self::StopDesktopStream,
            0xA2 => Self::DesktopStreamStarted,
            0xA3 => Self::DesktopStreamStopped,
            0xA4 => Self::QualityTestRequest,
            0xA5 => Self::QualityTestResult,
            0xA6 => Self::QualityProbeRequest,
            0xA7 => Self::QualityProbeResult,
            0xFF => Self::Error,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Opcode;

    #[test]
    fn wire_values_match_contract() {
        assert_eq!(Opcode::Hello.to_u8(), 0x01);
        assert_eq!(Opcode::StartStream.to_u8(), 0x23);
        assert_eq!(Opcode::QualityProbeResult.to_u8(), 0xA7);
        assert_eq!(Opcode::Error.to_u8(), 0xFF);
    }

    #[test]
    fn round_trips_through_u8() {
        for opcode in [
            Opcode::Hello,
            Opcode::StartStream,
            Opcode::StreamStarted,
            Opcode::InputEvent,
            Opcode::KeyframeRequest,
            Opcode::QualityProbeRequest,
            Opcode::Error,
        ] {
            assert_eq!(Opcode::from_u8(opcode.to_u8()), Some(opcode));
        }
    }

    #[test]
    fn unknown_value_is_none_not_error() {
        assert_eq!(Opcode::from_u8(0x99), None);
    }
}
