//! Client events and actions.

use mirage_core::{MetricsSnapshot, PixelSize, ResizeAction};
use mirage_proto::{
    payloads::{stream::StartStream, Payload},
    FrameHeader, StreamId,
};

/// Events the caller feeds into the client.
///
/// Generic over `I` (Instant type) so the same state machine drives both
/// production (`std::time::Instant`) and simulation time.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// Control-channel payload arrived from the host.
    ControlMessageReceived(Payload),

    /// One UDP video datagram arrived, already header-parsed.
    VideoPacketReceived {
        /// Parsed frame header.
        header: FrameHeader,
        /// Payload bytes following the header.
        payload: Vec<u8>,
        /// Arrival time, for reassembly timeout bookkeeping.
        now: I,
    },

    /// Periodic tick for timer-driven state (resize debounce, freeze
    /// monitor, keyframe recovery, metrics).
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// Send the initial handshake.
    Connect {
        /// Protocol version to advertise (almost always
        /// [`crate::PROTOCOL_VERSION`]).
        protocol_version: u8,
        /// Capability strings to advertise.
        capabilities: Vec<String>,
    },

    /// Request the host start streaming a window.
    RequestStartStream(StartStream),

    /// Request the host stop a stream.
    RequestStopStream {
        /// Stream to stop.
        stream_id: StreamId,
    },

    /// The UI's drawable size changed.
    DrawableSizeChanged {
        /// Stream this resize applies to.
        stream_id: StreamId,
        /// New drawable pixel size.
        pixel_size: PixelSize,
        /// Screen pixel size, for the relative-scale calculation.
        screen_size: PixelSize,
        /// Current time, to start the resize debounce clock.
        now: I,
    },

    /// The host confirmed a resize (new `StreamStarted`/dimension update
    /// with a minimum size negotiated).
    ResizeConfirmed {
        /// Stream that was resized.
        stream_id: StreamId,
        /// Current time.
        now: I,
    },

    /// The app backgrounded or the transport reconnected.
    BackgroundedOrReconnected {
        /// Stream to reset.
        stream_id: StreamId,
    },
}

/// Actions the client produces for the caller to execute.
#[derive(Debug)]
pub enum ClientAction {
    /// Send a control payload to the host.
    SendControl(Payload),

    /// Apply a resize for one stream.
    Resize {
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

    /// Deliver a metrics snapshot to the UI.
    Metrics {
        /// Stream these metrics describe.
        stream_id: StreamId,
        /// The snapshot.
        snapshot: MetricsSnapshot,
    },

    /// The host accepted the handshake.
    Connected {
        /// Host's stable UUID.
        host_id: [u8; 16],
        /// Host's human-readable name.
        host_name: String,
        /// Whether the host requires authentication.
        requires_auth: bool,
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

    /// Log message for diagnostics.
    Log {
        /// Log message.
        message: String,
    },
}
