//! Protocol-to-application translation layer.
//!
//! The [`Bridge`] wraps the low-level [`mirage_client::Client`] and adapts
//! it to the high-level application lifecycle: it turns [`crate::AppAction`]s
//! into [`mirage_client::ClientEvent`]s, accumulates outgoing control
//! payloads for the driver's next I/O cycle, and turns the resulting
//! [`mirage_client::ClientAction`]s back into [`crate::AppEvent`]s.

use std::{ops::Sub, time::Duration};

use mirage_client::{Client, ClientAction, ClientEvent, ClientIdentity};
use mirage_core::Decoder;
use mirage_proto::{payloads::Payload, FrameHeader};

use crate::{AppAction, AppEvent};

/// Bridge between [`crate::App`] and [`Client`] protocol logic.
///
/// Generic over the instant type `I`, the decoder `D` streams decode into,
/// and the factory `F` that builds a fresh decoder per stream.
pub struct Bridge<I, D, F>
where
    D: Decoder,
    F: Fn() -> D,
{
    client: Client<I, D, F>,
    outgoing: Vec<Payload>,
}

impl<I, D, F> Bridge<I, D, F>
where
    I: Copy + Ord + Sub<Output = Duration>,
    D: Decoder,
    F: Fn() -> D,
{
    /// Create a new bridge wrapping a fresh client.
    pub fn new(identity: ClientIdentity, decoder_factory: F) -> Self {
        Self { client: Client::new(identity, decoder_factory), outgoing: Vec::new() }
    }

    /// Send the initial handshake.
    pub fn connect(&mut self, protocol_version: u8, capabilities: Vec<String>) -> Vec<AppEvent> {
        let actions = self.client.handle(ClientEvent::Connect { protocol_version, capabilities });
        self.process_client_actions(actions)
    }

    /// Process an App action that the client needs to know about.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::RequestStartStream(start) => {
                let actions = self.client.handle(ClientEvent::RequestStartStream(start));
                self.process_client_actions(actions)
            },
            AppAction::RequestStopStream { stream_id } => {
                let actions = self.client.handle(ClientEvent::RequestStopStream { stream_id });
                self.process_client_actions(actions)
            },
            AppAction::Render | AppAction::Quit | AppAction::Connect { .. } | AppAction::RegisterVideoPeer { .. } => {
                vec![]
            },
        }
    }

    /// Handle a control-channel payload received from the host.
    pub fn handle_control(&mut self, payload: Payload) -> Vec<AppEvent> {
        let actions = self.client.handle(ClientEvent::ControlMessageReceived(payload));
        self.process_client_actions(actions)
    }

    /// Handle one UDP video datagram.
    pub fn handle_video(&mut self, header: FrameHeader, payload: Vec<u8>, now: I) -> Vec<AppEvent> {
        let actions = self.client.handle(ClientEvent::VideoPacketReceived { header, payload, now });
        self.process_client_actions(actions)
    }

    /// Process a time tick.
    pub fn handle_tick(&mut self, now: I) -> Vec<AppEvent> {
        let actions = self.client.handle(ClientEvent::Tick { now });
        self.process_client_actions(actions)
    }

    /// Take pending outgoing control payloads.
    pub fn take_outgoing(&mut self) -> Vec<Payload> {
        std::mem::take(&mut self.outgoing)
    }

    fn process_client_actions(&mut self, actions: Vec<ClientAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();
        for action in actions {
            match action {
                ClientAction::SendControl(payload) => self.outgoing.push(payload),
                ClientAction::Resize { stream_id, action } => {
                    events.push(AppEvent::ResizeApplied { stream_id, action })
                },
                ClientAction::InputBlockedChanged { stream_id, blocked } => {
                    events.push(AppEvent::InputBlockedChanged { stream_id, blocked })
                },
                ClientAction::Metrics { stream_id, snapshot } => {
                    events.push(AppEvent::Metrics { stream_id, snapshot })
                },
                ClientAction::Connected { host_id, host_name, requires_auth: _, data_port } => {
                    events.push(AppEvent::Connected { host_id, host_name, data_port })
                },
                ClientAction::ConnectionRejected { reason } => {
                    events.push(AppEvent::ConnectionRejected { reason })
                },
                ClientAction::StreamStarted { stream_id, width, height } => {
                    events.push(AppEvent::StreamStarted { stream_id, width, height })
                },
                ClientAction::StreamStopped { stream_id } => events.push(AppEvent::StreamStopped { stream_id }),
                ClientAction::Log { message } => events.push(AppEvent::Log { message }),
            }
        }
        events
    }
}
