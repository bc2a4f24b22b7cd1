//! Application input events.
//!
//! [`AppEvent`] is the comprehensive set of inputs that drive the
//! [`crate::App`] state machine. Events originate from two sources: user
//! interaction (keyboard, terminal resize, ticks) and protocol
//! notifications translated from [`mirage_client::Client`] by
//! [`crate::Bridge`].

use mirage_core::{MetricsSnapshot, ResizeAction};
use mirage_proto::StreamId;

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Connection in progress.
    Connecting,

    /// Connected to the host.
    Connected {
        /// Host's stable UUID.
        host_id: [u8; 16],
        /// Host's human-readable name.
        host_name: String,
        /// UDP port to register the video channel against.
        data_port: u16,
    },

    /// The host rejected the handshake.
    ConnectionRejected {
        /// Human-readable reason.
        reason: String,
    },

    /// A stream started.
    StreamStarted {
        /// Assigned stream identifier.
        stream_id: StreamId,
        /// Negotiated pixel width.
        width: u32,
        /// Negotiated pixel height.
        height: u32,
    },

    /// A stream stopped.
    StreamStopped {
        /// Stream that stopped.
        stream_id: StreamId,
    },

    /// A stream's resize state changed.
    ResizeApplied {
        /// Stream being resized.
        stream_id: StreamId,
        /// Resize details.
        action: ResizeAction,
    },

    /// A stream's input-blocked (frozen) state changed.
    InputBlockedChanged {
        /// Stream whose input-blocked state changed.
        stream_id: StreamId,
        /// New blocked state.
        blocked: bool,
    },

    /// A metrics snapshot arrived for a stream.
    Metrics {
        /// Stream these metrics describe.
        stream_id: StreamId,
        /// The snapshot.
        snapshot: MetricsSnapshot,
    },

    /// Diagnostic log line.
    Log {
        /// Log message.
        message: String,
    },

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
