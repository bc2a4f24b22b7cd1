//! [`mirage_app::Driver`] implementation over real TCP/UDP transport, with
//! no terminal library: input comes from stdin lines, output from
//! `tracing`.
//!
//! Grounded on `mirage-client::transport::run_connection`'s
//! `tokio::select!` shape, simplified since this driver forwards raw
//! [`Payload`]s/video datagrams to [`mirage_app::Runtime`] rather than
//! driving a `Client` state machine itself (the `Bridge` inside `Runtime`
//! already owns that).

use std::{net::SocketAddr, time::Instant};

use mirage_app::{App, AppEvent, Driver, KeyInput};
use mirage_proto::{payloads::Payload, FrameHeader};
use mirage_transport::{video::VideoDatagram, ControlChannel, TransportError, VideoChannel};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::warn;

/// How long `poll_event` waits for a stdin line before yielding control
/// back to the runtime's tick (bounds how often `Bridge::handle_tick` runs).
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

/// Channel depth for the driver's internal forwarding queues.
const CHANNEL_DEPTH: usize = 64;

/// Errors a [`CliDriver`] can surface to [`mirage_app::Runtime`].
#[derive(Debug, Error)]
pub enum CliError {
    /// Establishing the control or video channel failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The background I/O task's outbound channel is gone.
    #[error("connection task is no longer running")]
    Disconnected,
}

/// Headless [`Driver`]: stdin for keyboard input, `tracing` for rendering,
/// real `mirage-transport` channels for the network.
pub struct CliDriver {
    device_id: [u8; 16],
    stdin_lines: mpsc::Receiver<String>,
    outbound: Option<mpsc::Sender<Payload>>,
    inbound_control: Option<mpsc::Receiver<Payload>>,
    inbound_video: Option<mpsc::Receiver<(FrameHeader, Vec<u8>)>>,
    io_task: Option<tokio::task::JoinHandle<()>>,
}

impl CliDriver {
    /// Build a driver, spawning the background stdin reader immediately.
    #[must_use]
    pub fn new(device_id: [u8; 16]) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        tokio::spawn(read_stdin_lines(tx));
        Self {
            device_id,
            stdin_lines: rx,
            outbound: None,
            inbound_control: None,
            inbound_video: None,
            io_task: None,
        }
    }

    fn convert_line(line: &str) -> Option<AppEvent> {
        let key = match line.trim().chars().next()? {
            'c' => KeyInput::Char('c'),
            's' => KeyInput::Char('s'),
            'x' => KeyInput::Char('x'),
            '\t' => KeyInput::Tab,
            c => KeyInput::Char(c),
        };
        Some(AppEvent::Key(key))
    }
}

impl Driver for CliDriver {
    type Error = CliError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        tokio::select! {
            biased;

            line = self.stdin_lines.recv() => Ok(line.as_deref().and_then(Self::convert_line)),
            () = tokio::time::sleep(POLL_INTERVAL) => Ok(None),
        }
    }

    async fn send_control(&mut self, payload: Payload) -> Result<(), Self::Error> {
        let Some(outbound) = &self.outbound else {
            return Err(CliError::Disconnected);
        };
        outbound.send(payload).await.map_err(|_| CliError::Disconnected)
    }

    async fn recv_control(&mut self) -> Option<Payload> {
        self.inbound_control.as_mut()?.try_recv().ok()
    }

    async fn recv_video(&mut self) -> Option<(FrameHeader, Vec<u8>)> {
        self.inbound_video.as_mut()?.try_recv().ok()
    }

    async fn connect(&mut self, control_addr: &str) -> Result<(), Self::Error> {
        let control = ControlChannel::connect(control_addr).await?;
        let video = VideoChannel::bind("0.0.0.0:0").await?;

        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_DEPTH);
        let (control_tx, control_rx) = mpsc::channel(CHANNEL_DEPTH);
        let (video_tx, video_rx) = mpsc::channel(CHANNEL_DEPTH);

        let device_id = self.device_id;
        let handle = tokio::spawn(run_io(control, video, device_id, outbound_rx, control_tx, video_tx));

        self.outbound = Some(outbound_tx);
        self.inbound_control = Some(control_rx);
        self.inbound_video = Some(video_rx);
        self.io_task = Some(handle);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.outbound.is_some()
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        tracing::info!(
            connection = ?app.connection_state(),
            streams = app.streams().len(),
            log_tail = app.log().last().map(String::as_str).unwrap_or(""),
            "app state"
        );
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(handle) = self.io_task.take() {
            handle.abort();
        }
        self.outbound = None;
        self.inbound_control = None;
        self.inbound_video = None;
    }
}

async fn read_stdin_lines(tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            break;
        }
    }
}

/// Forwards control/video traffic between the real channels and the
/// driver's mpsc queues. Also sends the UDP registration packet once the
/// host's `helloResponse` reveals its data port (§4.7).
async fn run_io(
    mut control: ControlChannel,
    video: VideoChannel,
    device_id: [u8; 16],
    mut outbound_rx: mpsc::Receiver<Payload>,
    control_tx: mpsc::Sender<Payload>,
    video_tx: mpsc::Sender<(FrameHeader, Vec<u8>)>,
) {
    let mut video_buf = vec![0u8; 2048];

    loop {
        tokio::select! {
            envelope = control.recv_envelope() => {
                match envelope {
                    Ok(Some(envelope)) => {
                        let Some(opcode) = envelope.opcode() else {
                            warn!(type_byte = envelope.type_byte, "unknown control opcode");
                            continue;
                        };
                        let Ok(payload) = Payload::decode(opcode, &envelope.payload) else {
                            warn!(?opcode, "failed to decode control payload");
                            continue;
                        };
                        if let Payload::HelloResponse(ref response) = payload {
                            if let Ok(peer) = control.peer_addr() {
                                let peer = SocketAddr::new(peer.ip(), response.data_port);
                                if let Err(error) = video.send_registration(peer, device_id).await {
                                    warn!(%error, "failed to send video registration packet");
                                }
                            }
                        }
                        if control_tx.send(payload).await.is_err() {
                            return;
                        }
                    },
                    _ => return,
                }
            },
            datagram = video.recv_datagram(&mut video_buf) => {
                if let Ok((_, VideoDatagram::Frame { header, payload })) = datagram {
                    if video_tx.send((header, payload)).await.is_err() {
                        return;
                    }
                }
            },
            outgoing = outbound_rx.recv() => {
                let Some(payload) = outgoing else { return };
                if let Err(error) = control.send_control(&payload).await {
                    warn!(%error, "failed to send control payload");
                    return;
                }
            },
        }
    }
}
