//! In-process loopback host for the demo binary.
//!
//! Grounded on `mirage-host/src/main.rs`'s `run_session`/`execute_actions`
//! shape, trimmed to a single session (the demo has exactly one client) and
//! extended with a synthetic encoded-frame generator standing in for the
//! external capture/encode pipeline §1 excludes from the core's scope:
//! once a stream starts, a timer feeds tiny placeholder frames into
//! [`HostEvent::EncodedFrameReady`] so the video path (fragmentation,
//! pacing, UDP send, client reassembly, decode-queue delivery) runs for
//! real end to end.

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use mirage_core::{Environment, SystemEnvironment};
use mirage_host::{
    driver::{HostAction, HostDriver, HostEvent, LogLevel},
    packet_sender::EncodedFrame,
    HostConfig,
};
use mirage_proto::{header::ContentRect, payloads::Payload, StreamId};
use mirage_transport::{control::KEEPALIVE_INTERVAL, video::VideoDatagram, ControlChannel, VideoChannel};
use tokio::{
    net::TcpListener,
    sync::{mpsc, Mutex},
};
use tracing::{info, warn};

/// How often the synthetic encoder produces a frame once a stream starts.
const SYNTHETIC_FRAME_INTERVAL: Duration = Duration::from_millis(200);

/// Every Nth synthetic frame is a keyframe; the rest are tiny P-frames.
const KEYFRAME_INTERVAL: u32 = 30;

/// Placeholder encoded payload sizes, purely to exercise fragmentation;
/// no real HEVC bitstream (the encoder is external, §1).
const SYNTHETIC_KEYFRAME_BYTES: usize = 4096;
const SYNTHETIC_PFRAME_BYTES: usize = 256;

struct Shared {
    driver: Mutex<HostDriver>,
    video: VideoChannel,
    registrations: Mutex<HashMap<[u8; 16], SocketAddr>>,
}

/// Starts the demo host, returning the address its control channel is
/// listening on. The host runs on a background task for the lifetime of
/// the process.
///
/// # Errors
///
/// Returns an error if the control or video sockets cannot be bound.
pub async fn run_demo_host(host_id: [u8; 16]) -> std::io::Result<SocketAddr> {
    let video = VideoChannel::bind("127.0.0.1:0").await.map_err(to_io_error)?;
    let data_port = video.local_addr().map_err(to_io_error)?.port();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let control_addr = listener.local_addr()?;

    let driver = HostDriver::new(HostConfig::default(), host_id, "mirage-cli-demo-host".into(), data_port);
    let shared = Arc::new(Shared { driver: Mutex::new(driver), video, registrations: Mutex::new(HashMap::new()) });

    tokio::spawn(run_video_listener(shared.clone()));
    tokio::spawn(accept_loop(shared, listener));

    Ok(control_addr)
}

async fn run_video_listener(shared: Arc<Shared>) {
    let mut buf = vec![0u8; 2048];
    loop {
        match shared.video.recv_datagram(&mut buf).await {
            Ok((peer, VideoDatagram::Registration(packet))) => {
                shared.registrations.lock().await.insert(packet.device_id, peer);
            },
            Ok((_, VideoDatagram::Frame { .. })) => {},
            Err(error) => warn!(%error, "demo host video channel receive error"),
        }
    }
}

async fn accept_loop(shared: Arc<Shared>, listener: TcpListener) {
    let mut next_session_id = 1u64;
    loop {
        let Ok((stream, peer)) = listener.accept().await else {
            return;
        };
        let session_id = next_session_id;
        next_session_id += 1;
        let shared = shared.clone();
        tokio::spawn(async move {
            if let Err(error) = run_session(shared, session_id, stream).await {
                warn!(session_id, %peer, %error, "demo host session ended with error");
            }
        });
    }
}

async fn run_session(
    shared: Arc<Shared>,
    session_id: u64,
    stream: tokio::net::TcpStream,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut control = ControlChannel::from_stream(stream)?;
    let mut device_id: Option<[u8; 16]> = None;
    let (synthetic_tx, mut synthetic_rx) = mpsc::channel::<HostEvent>(8);

    let actions = shared.driver.lock().await.handle(HostEvent::SessionConnected { session_id });
    if !execute_actions(&shared, session_id, &mut control, &mut device_id, &synthetic_tx, actions).await? {
        return Ok(());
    }

    let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
    keepalive.tick().await;

    loop {
        tokio::select! {
            envelope = control.recv_envelope() => {
                let Some(envelope) = envelope? else { break };
                let Some(opcode) = envelope.opcode() else {
                    warn!(session_id, type_byte = envelope.type_byte, "demo host: unknown opcode");
                    continue;
                };
                let Ok(payload) = Payload::decode(opcode, &envelope.payload) else {
                    warn!(session_id, "demo host: failed to decode control payload");
                    continue;
                };
                if let Payload::Hello(ref hello) = payload {
                    device_id = Some(hello.device_id);
                }
                let actions = shared.driver.lock().await.handle(HostEvent::ControlMessageReceived { session_id, payload });
                if !execute_actions(&shared, session_id, &mut control, &mut device_id, &synthetic_tx, actions).await? {
                    break;
                }
            }
            Some(event) = synthetic_rx.recv() => {
                let actions = shared.driver.lock().await.handle(event);
                if !execute_actions(&shared, session_id, &mut control, &mut device_id, &synthetic_tx, actions).await? {
                    break;
                }
            }
            _ = keepalive.tick() => {
                control.send_control(&Payload::Ping).await?;
            }
        }
    }

    let actions = shared.driver.lock().await.handle(HostEvent::SessionDisconnected { session_id });
    execute_actions(&shared, session_id, &mut control, &mut device_id, &synthetic_tx, actions).await?;
    Ok(())
}

/// Executes the driver's actions. Returns `false` once the session's
/// control channel should stop being driven. On observing a
/// `streamStarted` confirmation, arms the synthetic frame generator for
/// that stream.
async fn execute_actions(
    shared: &Arc<Shared>,
    session_id: u64,
    control: &mut ControlChannel,
    device_id: &mut Option<[u8; 16]>,
    synthetic_tx: &mpsc::Sender<HostEvent>,
    actions: Vec<HostAction>,
) -> Result<bool, Box<dyn std::error::Error>> {
    for action in actions {
        match action {
            HostAction::SendControl { payload, .. } => {
                if let Payload::StreamStarted(ref started) = payload {
                    tokio::spawn(generate_synthetic_frames(session_id, started.stream_id, synthetic_tx.clone()));
                }
                control.send_control(&payload).await?;
            },
            HostAction::SendVideo { bursts, .. } => {
                let Some(id) = device_id else {
                    warn!(session_id, "demo host: dropping video burst, no registered device");
                    continue;
                };
                let peer = shared.registrations.lock().await.get(id).copied();
                let Some(peer) = peer else {
                    warn!(session_id, "demo host: dropping video burst, peer not yet registered");
                    continue;
                };
                for burst in bursts {
                    if !burst.delay_before.is_zero() {
                        tokio::time::sleep(burst.delay_before).await;
                    }
                    shared.video.send_video_packets(peer, &burst.packets).await?;
                }
            },
            HostAction::CloseSession { reason, .. } => {
                info!(session_id, reason, "demo host: closing session");
                return Ok(false);
            },
            HostAction::RequestKeyframe { stream_id, .. } => {
                info!(session_id, %stream_id, "demo host: keyframe requested");
            },
            HostAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!(session_id, "{message}"),
                LogLevel::Info => info!(session_id, "{message}"),
                LogLevel::Warn => warn!(session_id, "{message}"),
            },
        }
    }
    Ok(true)
}

/// Feeds one synthetic encoded frame per tick into the session's event
/// channel, stopping once the channel closes (session ended).
async fn generate_synthetic_frames(session_id: u64, stream_id: StreamId, tx: mpsc::Sender<HostEvent>) {
    let env = SystemEnvironment;
    let start = env.now();
    let mut ticker = tokio::time::interval(SYNTHETIC_FRAME_INTERVAL);
    let mut frame_index: u32 = 0;

    loop {
        ticker.tick().await;
        let is_keyframe = frame_index % KEYFRAME_INTERVAL == 0;
        let size = if is_keyframe { SYNTHETIC_KEYFRAME_BYTES } else { SYNTHETIC_PFRAME_BYTES };
        let mut bytes = vec![0u8; size];
        env.random_bytes(&mut bytes);

        let timestamp_ns = u64::try_from((env.now() - start).as_nanos()).unwrap_or(u64::MAX);
        let frame = EncodedFrame {
            bytes,
            is_keyframe,
            timestamp_ns,
            content_rect: ContentRect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 },
        };

        if tx.send(HostEvent::EncodedFrameReady { session_id, stream_id, frame }).await.is_err() {
            return;
        }
        frame_index = frame_index.wrapping_add(1);
    }
}

fn to_io_error(error: mirage_transport::TransportError) -> std::io::Error {
    std::io::Error::other(error)
}
