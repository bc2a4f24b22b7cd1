//! Sans-IO host session driver (§4.7, §5, §6).
//!
//! A pure state machine that consumes [`HostEvent`]s and returns [`HostAction`]s
//! for the binary's I/O loop to execute, keeping session bookkeeping, opcode
//! dispatch, and protocol-version gating testable without sockets.

use std::collections::HashMap;

use mirage_proto::{
    payloads::{
        session::{Disconnect, Hello, HelloResponse},
        stream::{KeyframeRequest, StartStream, StopStream, StreamStarted, StreamStopped},
        ErrorPayload, Payload,
    },
    ProtocolError, StreamId, WindowId,
};
use tracing::{debug, info, warn};

use crate::{
    config::HostConfig,
    packet_sender::{EncodedFrame, PacedBurst, PacketSender},
};

/// Protocol version this host accepts (§9 Open Question, resolved in
/// `DESIGN.md`: only `protocolVersion = 3`'s key set is understood).
pub const SUPPORTED_PROTOCOL_VERSION: u8 = 3;

/// Severity for [`HostAction::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Routine informational event.
    Info,
    /// Unexpected but recoverable condition.
    Warn,
}

/// Inputs to the host driver.
#[derive(Debug)]
pub enum HostEvent {
    /// A client completed its TCP accept and is ready for a handshake.
    SessionConnected {
        /// Driver-assigned session identifier.
        session_id: u64,
    },
    /// A control message arrived on a session's control channel.
    ControlMessageReceived {
        /// Session the message arrived on.
        session_id: u64,
        /// Decoded payload.
        payload: Payload,
    },
    /// A session's transport was torn down.
    SessionDisconnected {
        /// Session that disconnected.
        session_id: u64,
    },
    /// The external encoder pipeline produced a frame for a running stream.
    EncodedFrameReady {
        /// Session owning the stream.
        session_id: u64,
        /// Stream the frame belongs to.
        stream_id: StreamId,
        /// The encoded frame.
        frame: EncodedFrame,
    },
}

/// Outputs of the host driver, for the binary's I/O loop to execute.
#[derive(Debug)]
pub enum HostAction {
    /// Send a control payload to a session.
    SendControl {
        /// Destination session.
        session_id: u64,
        /// Payload to send.
        payload: Payload,
    },
    /// Send paced UDP bursts to a session's registered video peer.
    SendVideo {
        /// Destination session.
        session_id: u64,
        /// Bursts to send, in order.
        bursts: Vec<PacedBurst>,
    },
    /// Tear down a session's transport.
    CloseSession {
        /// Session to close.
        session_id: u64,
        /// Human-readable reason, for logging.
        reason: String,
    },
    /// Ask the external encoder pipeline for a fresh keyframe.
    RequestKeyframe {
        /// Session whose stream needs a keyframe.
        session_id: u64,
        /// Stream that needs a keyframe.
        stream_id: StreamId,
    },
    /// Structured log line.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
    },
}

struct StreamSession {
    stream_id: StreamId,
    window_id: WindowId,
    width: u32,
    height: u32,
    frame_rate: u32,
    epoch: u16,
    dimension_token: u16,
    next_frame_number: u32,
    next_sequence_number: u32,
}

struct Session {
    hello: Option<Hello>,
    stream: Option<StreamSession>,
}

impl Session {
    fn new() -> Self {
        Self { hello: None, stream: None }
    }
}

/// Sans-IO host session driver.
///
/// Owns no socket: [`HostDriver::handle`] takes one [`HostEvent`] and
/// returns the [`HostAction`]s the caller should perform.
pub struct HostDriver {
    config: HostConfig,
    host_id: [u8; 16],
    host_name: String,
    data_port: u16,
    sender: PacketSender,
    sessions: HashMap<u64, Session>,
    next_stream_id: u16,
}

impl HostDriver {
    /// Build a driver with a fixed host identity and data-channel port.
    #[must_use]
    pub fn new(config: HostConfig, host_id: [u8; 16], host_name: String, data_port: u16) -> Self {
        let sender = PacketSender::new(&config);
        Self { config, host_id, host_name, data_port, sender, sessions: HashMap::new(), next_stream_id: 1 }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Number of sessions currently tracked.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The device UUID a session declared in its `hello`, if it has
    /// completed the handshake. Used by the UDP registration path (§4.7) to
    /// map a registered data-channel peer address back to the session whose
    /// video bursts it should receive.
    #[must_use]
    pub fn device_id_for_session(&self, session_id: u64) -> Option<[u8; 16]> {
        self.sessions.get(&session_id)?.hello.as_ref().map(|hello| hello.device_id)
    }

    /// Process one event, returning the actions the caller should perform.
    pub fn handle(&mut self, event: HostEvent) -> Vec<HostAction> {
        match event {
            HostEvent::SessionConnected { session_id } => self.on_connected(session_id),
            HostEvent::ControlMessageReceived { session_id, payload } => self.on_control(session_id, payload),
            HostEvent::SessionDisconnected { session_id } => self.on_disconnected(session_id),
            HostEvent::EncodedFrameReady { session_id, stream_id, frame } => {
                self.on_encoded_frame(session_id, stream_id, &frame)
            },
        }
    }

    fn on_connected(&mut self, session_id: u64) -> Vec<HostAction> {
        if self.sessions.len() >= self.config.max_sessions {
            return vec![HostAction::CloseSession { session_id, reason: "max sessions reached".into() }];
        }
        self.sessions.insert(session_id, Session::new());
        vec![HostAction::Log { level: LogLevel::Info, message: format!("session {session_id} connected") }]
    }

    fn on_disconnected(&mut self, session_id: u64) -> Vec<HostAction> {
        self.sessions.remove(&session_id);
        vec![HostAction::Log { level: LogLevel::Info, message: format!("session {session_id} disconnected") }]
    }

    fn on_control(&mut self, session_id: u64, payload: Payload) -> Vec<HostAction> {
        if !self.sessions.contains_key(&session_id) {
            warn!(session_id, "control message for unknown session");
            return vec![HostAction::CloseSession { session_id, reason: "unknown session".into() }];
        }

        match payload {
            Payload::Hello(hello) => self.on_hello(session_id, hello),
            Payload::Ping => vec![HostAction::SendControl { session_id, payload: Payload::Pong }],
            Payload::Disconnect(Disconnect { reason }) => {
                debug!(session_id, ?reason, "client requested disconnect");
                vec![HostAction::CloseSession { session_id, reason: reason.unwrap_or_default() }]
            },
            Payload::StartStream(start) => self.on_start_stream(session_id, start),
            Payload::StopStream(StopStream { stream_id }) => self.on_stop_stream(session_id, stream_id),
            Payload::KeyframeRequest(KeyframeRequest { stream_id }) => {
                self.on_keyframe_request(session_id, stream_id)
            },
            other => {
                debug!(session_id, opcode = ?other.opcode(), "unhandled control opcode");
                Vec::new()
            },
        }
    }

    fn on_hello(&mut self, session_id: u64, hello: Hello) -> Vec<HostAction> {
        if hello.protocol_version != SUPPORTED_PROTOCOL_VERSION {
            let error = ErrorPayload::new(
                ErrorPayload::UNSUPPORTED_VERSION,
                ProtocolError::UnsupportedVersion(hello.protocol_version).to_string(),
            );
            return vec![
                HostAction::SendControl { session_id, payload: Payload::Error(error) },
                HostAction::CloseSession { session_id, reason: "unsupported protocol version".into() },
            ];
        }

        let response = HelloResponse {
            accepted: true,
            host_id: self.host_id,
            host_name: self.host_name.clone(),
            requires_auth: false,
            data_port: self.data_port,
        };

        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.hello = Some(hello);
        }

        vec![HostAction::SendControl { session_id, payload: Payload::HelloResponse(response) }]
    }

    fn on_start_stream(&mut self, session_id: u64, start: StartStream) -> Vec<HostAction> {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return Vec::new();
        };

        let stream_id = StreamId(self.next_stream_id);
        self.next_stream_id = self.next_stream_id.wrapping_add(1).max(1);

        let width = start.pixel_width.unwrap_or(1920);
        let height = start.pixel_height.unwrap_or(1080);
        let frame_rate = start.max_refresh_rate_or_default();
        let dimension_token: u16 = 1;

        session.stream = Some(StreamSession {
            stream_id,
            window_id: start.window_id,
            width,
            height,
            frame_rate,
            epoch: 0,
            dimension_token,
            next_frame_number: 0,
            next_sequence_number: 0,
        });

        let started = StreamStarted {
            stream_id,
            window_id: start.window_id,
            width,
            height,
            frame_rate,
            codec: "hevc".into(),
            min_width: None,
            min_height: None,
            dimension_token: Some(dimension_token),
        };

        info!(session_id, %stream_id, width, height, "stream started");
        vec![HostAction::SendControl { session_id, payload: Payload::StreamStarted(started) }]
    }

    fn on_stop_stream(&mut self, session_id: u64, stream_id: StreamId) -> Vec<HostAction> {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return Vec::new();
        };
        let matches = session.stream.as_ref().is_some_and(|s| s.stream_id == stream_id);
        if !matches {
            return Vec::new();
        }
        session.stream = None;
        vec![HostAction::SendControl {
            session_id,
            payload: Payload::StreamStopped(StreamStopped { stream_id }),
        }]
    }

    fn on_keyframe_request(&mut self, session_id: u64, stream_id: StreamId) -> Vec<HostAction> {
        let Some(session) = self.sessions.get(&session_id) else {
            return Vec::new();
        };
        if session.stream.as_ref().is_some_and(|s| s.stream_id == stream_id) {
            vec![HostAction::RequestKeyframe { session_id, stream_id }]
        } else {
            Vec::new()
        }
    }

    fn on_encoded_frame(&mut self, session_id: u64, stream_id: StreamId, frame: &EncodedFrame) -> Vec<HostAction> {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return vec![HostAction::Log {
                level: LogLevel::Warn,
                message: format!("encoded frame for unknown session {session_id}"),
            }];
        };
        let Some(stream) = session.stream.as_mut().filter(|s| s.stream_id == stream_id) else {
            return vec![HostAction::Log {
                level: LogLevel::Warn,
                message: format!("encoded frame for session {session_id} with no matching stream {stream_id}"),
            }];
        };

        let frame_number = stream.next_frame_number;
        stream.next_frame_number = stream.next_frame_number.wrapping_add(1);
        let sequence_start = stream.next_sequence_number;

        match self.sender.fragment(
            stream_id,
            frame_number,
            stream.epoch,
            stream.dimension_token,
            sequence_start,
            frame,
        ) {
            Ok(bursts) => {
                let fragment_count: usize = bursts.iter().map(|b| b.packets.len()).sum();
                stream.next_sequence_number = sequence_start.wrapping_add(fragment_count as u32);
                vec![HostAction::SendVideo { session_id, bursts }]
            },
            Err(error) => vec![HostAction::Log {
                level: LogLevel::Warn,
                message: format!("failed to fragment frame for session {session_id}: {error}"),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use mirage_proto::header::ContentRect;

    use super::*;

    fn hello(version: u8) -> Hello {
        Hello {
            device_id: [1; 16],
            device_name: "test-client".into(),
            device_type: "macos".into(),
            protocol_version: version,
            capabilities: Vec::new(),
        }
    }

    fn start_stream() -> StartStream {
        StartStream {
            window_id: WindowId(1),
            preferred_quality: "high".into(),
            data_port: None,
            scale_factor: None,
            pixel_width: Some(1920),
            pixel_height: Some(1080),
            display_width: None,
            display_height: None,
            key_frame_interval: None,
            frame_quality: Some(0.8),
            keyframe_quality: Some(0.9),
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

    fn driver() -> HostDriver {
        HostDriver::new(HostConfig::default(), [9; 16], "test-host".into(), 5000)
    }

    #[test]
    fn accepts_supported_protocol_version() {
        let mut driver = driver();
        driver.handle(HostEvent::SessionConnected { session_id: 1 });
        let actions = driver.handle(HostEvent::ControlMessageReceived {
            session_id: 1,
            payload: Payload::Hello(hello(SUPPORTED_PROTOCOL_VERSION)),
        });
        assert!(matches!(
            actions.as_slice(),
            [HostAction::SendControl { payload: Payload::HelloResponse(r), .. }] if r.accepted
        ));
    }

    #[test]
    fn rejects_unsupported_protocol_version_and_closes() {
        let mut driver = driver();
        driver.handle(HostEvent::SessionConnected { session_id: 1 });
        let actions = driver.handle(HostEvent::ControlMessageReceived {
            session_id: 1,
            payload: Payload::Hello(hello(2)),
        });
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], HostAction::SendControl { payload: Payload::Error(_), .. }));
        assert!(matches!(actions[1], HostAction::CloseSession { .. }));
    }

    #[test]
    fn start_stream_assigns_a_stream_id_and_replies() {
        let mut driver = driver();
        driver.handle(HostEvent::SessionConnected { session_id: 1 });
        driver.handle(HostEvent::ControlMessageReceived {
            session_id: 1,
            payload: Payload::Hello(hello(SUPPORTED_PROTOCOL_VERSION)),
        });
        let actions = driver.handle(HostEvent::ControlMessageReceived {
            session_id: 1,
            payload: Payload::StartStream(start_stream()),
        });
        let Some(HostAction::SendControl { payload: Payload::StreamStarted(started), .. }) = actions.into_iter().next()
        else {
            panic!("expected StreamStarted");
        };
        assert_eq!(started.stream_id, StreamId(1));
        assert_eq!(started.width, 1920);
    }

    #[test]
    fn keyframe_request_for_unknown_stream_is_ignored() {
        let mut driver = driver();
        driver.handle(HostEvent::SessionConnected { session_id: 1 });
        let actions = driver.handle(HostEvent::ControlMessageReceived {
            session_id: 1,
            payload: Payload::KeyframeRequest(KeyframeRequest { stream_id: StreamId(99) }),
        });
        assert!(actions.is_empty());
    }

    #[test]
    fn encoded_frame_fragments_into_a_send_video_action() {
        let mut driver = driver();
        driver.handle(HostEvent::SessionConnected { session_id: 1 });
        driver.handle(HostEvent::ControlMessageReceived {
            session_id: 1,
            payload: Payload::Hello(hello(SUPPORTED_PROTOCOL_VERSION)),
        });
        driver.handle(HostEvent::ControlMessageReceived {
            session_id: 1,
            payload: Payload::StartStream(start_stream()),
        });

        let frame = EncodedFrame {
            bytes: vec![1, 2, 3, 4],
            is_keyframe: true,
            timestamp_ns: 0,
            content_rect: ContentRect { x: 0.0, y: 0.0, w: 1920.0, h: 1080.0 },
        };
        let actions = driver.handle(HostEvent::EncodedFrameReady { session_id: 1, stream_id: StreamId(1), frame });
        assert!(matches!(actions.as_slice(), [HostAction::SendVideo { .. }]));
    }

    #[test]
    fn device_id_for_session_available_after_hello() {
        let mut driver = driver();
        driver.handle(HostEvent::SessionConnected { session_id: 1 });
        assert_eq!(driver.device_id_for_session(1), None);
        driver.handle(HostEvent::ControlMessageReceived {
            session_id: 1,
            payload: Payload::Hello(hello(SUPPORTED_PROTOCOL_VERSION)),
        });
        assert_eq!(driver.device_id_for_session(1), Some([1; 16]));
    }

    #[test]
    fn session_disconnect_forgets_its_state() {
        let mut driver = driver();
        driver.handle(HostEvent::SessionConnected { session_id: 1 });
        driver.handle(HostEvent::SessionDisconnected { session_id: 1 });
        assert_eq!(driver.session_count(), 0);
    }
}
