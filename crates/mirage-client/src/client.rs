//! Sans-IO client state machine (§4.6, §4.7, §6).
//!
//! Action-based shape: the client owns no socket, receives
//! [`crate::ClientEvent`]s, and returns [`crate::ClientAction`]s for the
//! caller's transport layer to execute. One `Client` manages one host
//! connection and the streams currently open against it, each backed by a
//! [`mirage_core::stream_controller::StreamController`].

use std::{collections::HashMap, time::Duration};

use mirage_core::{
    reassembler::Reassembler, ControllerAction, Decoder, DecodeQueueConfig, FrameBufferPool, ReassemblerConfig,
    StreamController,
};
use mirage_proto::{
    payloads::{session::Hello, Payload},
    StreamId,
};
use tracing::{debug, warn};

use crate::event::{ClientAction, ClientEvent};

/// Protocol version this client speaks (§9 Open Question, resolved in
/// `DESIGN.md`: only `protocolVersion = 3`'s key set is produced).
pub const PROTOCOL_VERSION: u8 = 3;

/// Stable identity this client presents in its handshake.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Stable client device UUID.
    pub device_id: [u8; 16],
    /// Human-readable device name.
    pub device_name: String,
    /// Client platform/device type string.
    pub device_type: String,
}

/// Sans-IO client: owns per-stream [`StreamController`]s and handshake
/// state, generic over the instant type `I` and the decoder `D` the caller
/// supplies.
///
/// `F` is a factory invoked once per new stream to build a fresh decoder
/// instance, since each stream needs its own decoding session.
pub struct Client<I, D, F>
where
    D: Decoder,
    F: Fn() -> D,
{
    identity: ClientIdentity,
    pool: FrameBufferPool,
    reassembler_config: ReassemblerConfig,
    queue_config: DecodeQueueConfig,
    decoder_factory: F,
    streams: HashMap<StreamId, StreamController<I, D>>,
    host_id: Option<[u8; 16]>,
}

impl<I, D, F> Client<I, D, F>
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
    D: Decoder,
    F: Fn() -> D,
{
    /// Build a client with the given identity and a fresh buffer pool.
    #[must_use]
    pub fn new(identity: ClientIdentity, decoder_factory: F) -> Self {
        Self {
            identity,
            pool: FrameBufferPool::new(mirage_core::buffer_pool::DEFAULT_PER_CAPACITY_BOUND),
            reassembler_config: ReassemblerConfig::default(),
            queue_config: DecodeQueueConfig::default(),
            decoder_factory,
            streams: HashMap::new(),
            host_id: None,
        }
    }

    /// The host's stable UUID, once connected.
    #[must_use]
    pub fn host_id(&self) -> Option<[u8; 16]> {
        self.host_id
    }

    /// Number of streams currently tracked.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Process one event, returning the actions the caller should perform.
    pub fn handle(&mut self, event: ClientEvent<I>) -> Vec<ClientAction> {
        match event {
            ClientEvent::Connect { protocol_version, capabilities } => self.on_connect(protocol_version, capabilities),
            ClientEvent::ControlMessageReceived(payload) => self.on_control(payload),
            ClientEvent::VideoPacketReceived { header, payload, now } => self.on_video_packet(&header, &payload, now),
            ClientEvent::Tick { now } => self.on_tick(now),
            ClientEvent::RequestStartStream(start) => {
                vec![ClientAction::SendControl(Payload::StartStream(start))]
            },
            ClientEvent::RequestStopStream { stream_id } => {
                vec![ClientAction::SendControl(Payload::StopStream(
                    mirage_proto::payloads::stream::StopStream { stream_id },
                ))]
            },
            ClientEvent::DrawableSizeChanged { stream_id, pixel_size, screen_size, now } => {
                if let Some(controller) = self.streams.get_mut(&stream_id) {
                    controller.on_drawable_size_changed(pixel_size, screen_size, now);
                }
                Vec::new()
            },
            ClientEvent::ResizeConfirmed { stream_id, now } => {
                if let Some(controller) = self.streams.get_mut(&stream_id) {
                    controller.on_resize_confirmed(now);
                }
                Vec::new()
            },
            ClientEvent::BackgroundedOrReconnected { stream_id } => {
                if let Some(controller) = self.streams.get_mut(&stream_id) {
                    controller.on_background_or_reconnect();
                }
                Vec::new()
            },
        }
    }

    fn on_connect(&mut self, protocol_version: u8, capabilities: Vec<String>) -> Vec<ClientAction> {
        let hello = Hello {
            device_id: self.identity.device_id,
            device_name: self.identity.device_name.clone(),
            device_type: self.identity.device_type.clone(),
            protocol_version,
            capabilities,
        };
        vec![ClientAction::SendControl(Payload::Hello(hello))]
    }

    fn on_control(&mut self, payload: Payload) -> Vec<ClientAction> {
        match payload {
            Payload::HelloResponse(response) => {
                if !response.accepted {
                    return vec![ClientAction::ConnectionRejected { reason: "host rejected handshake".into() }];
                }
                self.host_id = Some(response.host_id);
                vec![ClientAction::Connected {
                    host_id: response.host_id,
                    host_name: response.host_name,
                    requires_auth: response.requires_auth,
                    data_port: response.data_port,
                }]
            },
            Payload::StreamStarted(started) => {
                let decoder = (self.decoder_factory)();
                let reassembler = Reassembler::new(started.stream_id, self.pool.clone(), self.reassembler_config);
                let mut controller = StreamController::new(started.stream_id, decoder, reassembler, self.queue_config);
                if let Some(token) = started.dimension_token {
                    controller.enable_dimension_token_validation(token);
                }
                self.streams.insert(started.stream_id, controller);
                vec![ClientAction::StreamStarted {
                    stream_id: started.stream_id,
                    width: started.width,
                    height: started.height,
                }]
            },
            Payload::StreamStopped(stopped) => {
                self.streams.remove(&stopped.stream_id);
                vec![ClientAction::StreamStopped { stream_id: stopped.stream_id }]
            },
            Payload::Ping => vec![ClientAction::SendControl(Payload::Pong)],
            Payload::Error(error) => {
                warn!(code = error.code, message = %error.message, "host reported an error");
                vec![ClientAction::Log { message: format!("host error {}: {}", error.code, error.message) }]
            },
            other => {
                debug!(opcode = ?other.opcode(), "unhandled control payload");
                Vec::new()
            },
        }
    }

    fn on_video_packet(&mut self, header: &mirage_proto::FrameHeader, payload: &[u8], now: I) -> Vec<ClientAction> {
        let stream_id = StreamId(header.stream_id());
        let Some(controller) = self.streams.get_mut(&stream_id) else {
            return Vec::new();
        };
        controller
            .ingest_packet(payload, *header, now)
            .into_iter()
            .map(|action| translate(stream_id, action))
            .collect()
    }

    fn on_tick(&mut self, now: I) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        for (stream_id, controller) in &mut self.streams {
            for action in controller.tick(now) {
                actions.push(translate(*stream_id, action));
            }
        }
        actions
    }

    /// Request a stream stop and forget its local state immediately,
    /// without waiting for the host's confirmation (caller teardown path).
    pub fn forget_stream(&mut self, stream_id: StreamId) {
        self.streams.remove(&stream_id);
    }
}

fn translate(stream_id: StreamId, action: ControllerAction) -> ClientAction {
    match action {
        ControllerAction::Resize(action) => ClientAction::Resize { stream_id, action },
        ControllerAction::InputBlockedChanged(blocked) => ClientAction::InputBlockedChanged { stream_id, blocked },
        ControllerAction::RequestKeyframe => ClientAction::SendControl(Payload::KeyframeRequest(
            mirage_proto::payloads::stream::KeyframeRequest { stream_id },
        )),
        ControllerAction::Metrics(snapshot) => ClientAction::Metrics { stream_id, snapshot },
    }
}
