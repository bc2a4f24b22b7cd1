//! TCP/UDP transport for the client.
//!
//! Provides [`ConnectedClient`], which drives the Sans-IO [`Client`] against
//! a real [`mirage_transport::ControlChannel`] and [`mirage_transport::VideoChannel`].
//! This is a thin bridging layer; protocol and resize/freeze/recovery logic
//! all stay in [`Client`].

use std::net::SocketAddr;

use mirage_core::Decoder;
use mirage_transport::{ControlChannel, VideoChannel};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use crate::{
    client::{Client, ClientIdentity, PROTOCOL_VERSION},
    event::{ClientAction, ClientEvent},
};

/// How often the connection task ticks the client's timer-driven state
/// (resize debounce, freeze monitor, keyframe recovery, metrics).
const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

/// Size of the UDP receive buffer (largest video datagram is one MTU-sized
/// fragment plus the header).
const VIDEO_RECV_BUF: usize = 2048;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connecting to the host failed.
    #[error("connection failed: {0}")]
    Connection(#[from] mirage_transport::TransportError),

    /// Binding the UDP video socket failed.
    #[error("video bind failed: {0}")]
    VideoBind(std::io::Error),
}

/// Handle to a connected client with TCP/UDP transport.
///
/// `events` accepts UI-originated [`ClientEvent`]s (`RequestStartStream`,
/// `DrawableSizeChanged`, and the like); `actions` delivers the
/// [`ClientAction`]s the caller should render or log. The control/video
/// sockets and the tick timer are driven internally.
pub struct ConnectedClient {
    /// Send UI-originated events to the client.
    pub events: mpsc::Sender<ClientEvent>,
    /// Receive actions the client wants executed.
    pub actions: mpsc::Receiver<ClientAction>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedClient {
    /// Stop the connection.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Connect to a Mirage host: open the control channel, bind a UDP video
/// socket, and perform the handshake.
pub async fn connect<D, F>(
    control_addr: impl tokio::net::ToSocketAddrs,
    identity: ClientIdentity,
    capabilities: Vec<String>,
    decoder_factory: F,
) -> Result<ConnectedClient, TransportError>
where
    D: Decoder + Send + 'static,
    F: Fn() -> D + Send + 'static,
{
    let control = ControlChannel::connect(control_addr).await?;
    let video = VideoChannel::bind("0.0.0.0:0").await.map_err(TransportError::VideoBind)?;

    let (events_tx, events_rx) = mpsc::channel(32);
    let (actions_tx, actions_rx) = mpsc::channel(32);

    let device_id = identity.device_id;
    let client = Client::new(identity, decoder_factory);
    let handle = tokio::spawn(run_connection(client, control, video, device_id, capabilities, events_rx, actions_tx));

    Ok(ConnectedClient { events: events_tx, actions: actions_rx, abort_handle: handle.abort_handle() })
}

async fn run_connection<D, F>(
    mut client: Client<std::time::Instant, D, F>,
    mut control: ControlChannel,
    video: VideoChannel,
    device_id: [u8; 16],
    capabilities: Vec<String>,
    mut events: mpsc::Receiver<ClientEvent>,
    actions_tx: mpsc::Sender<ClientAction>,
) where
    D: Decoder,
    F: Fn() -> D,
{
    let mut host_video_addr: Option<SocketAddr> = None;
    let mut video_buf = vec![0u8; VIDEO_RECV_BUF];
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    for action in client.handle(ClientEvent::Connect { protocol_version: PROTOCOL_VERSION, capabilities }) {
        handle_action(action, &mut control, &video, device_id, &mut host_video_addr, &actions_tx).await;
    }

    loop {
        tokio::select! {
            envelope = control.recv_envelope() => {
                let Ok(Some(envelope)) = envelope else {
                    actions_tx.send(ClientAction::Log { message: "control channel closed".into() }).await.ok();
                    break;
                };
                let Some(opcode) = envelope.opcode() else {
                    warn!("unknown opcode on control channel");
                    continue;
                };
                let Ok(payload) = mirage_proto::payloads::Payload::decode(opcode, &envelope.payload) else {
                    warn!(?opcode, "failed to decode control payload");
                    continue;
                };
                for action in client.handle(ClientEvent::ControlMessageReceived(payload)) {
                    handle_action(action, &mut control, &video, device_id, &mut host_video_addr, &actions_tx).await;
                }
            },
            datagram = video.recv_datagram(&mut video_buf) => {
                let Ok((_, mirage_transport::VideoDatagram::Frame { header, payload })) = datagram else {
                    continue;
                };
                let now = std::time::Instant::now();
                for action in client.handle(ClientEvent::VideoPacketReceived { header, payload, now }) {
                    handle_action(action, &mut control, &video, device_id, &mut host_video_addr, &actions_tx).await;
                }
            },
            event = events.recv() => {
                let Some(event) = event else { break };
                for action in client.handle(event) {
                    handle_action(action, &mut control, &video, device_id, &mut host_video_addr, &actions_tx).await;
                }
            },
            _ = ticker.tick() => {
                let now = std::time::Instant::now();
                for action in client.handle(ClientEvent::Tick { now }) {
                    handle_action(action, &mut control, &video, device_id, &mut host_video_addr, &actions_tx).await;
                }
            },
        }
    }
}

async fn handle_action(
    action: ClientAction,
    control: &mut ControlChannel,
    video: &VideoChannel,
    device_id: [u8; 16],
    host_video_addr: &mut Option<SocketAddr>,
    actions_tx: &mpsc::Sender<ClientAction>,
) {
    match action {
        ClientAction::SendControl(payload) => {
            if let Err(error) = control.send_control(&payload).await {
                warn!(%error, "failed to send control payload");
            }
        },
        ClientAction::Connected { data_port, .. } => {
            if let Ok(peer) = control.peer_addr() {
                let video_peer = SocketAddr::new(peer.ip(), data_port);
                *host_video_addr = Some(video_peer);
                if let Err(error) = video.send_registration(video_peer, device_id).await {
                    warn!(%error, "failed to send video registration packet");
                }
            }
            actions_tx.send(action).await.ok();
        },
        other => {
            actions_tx.send(other).await.ok();
        },
    }
}
