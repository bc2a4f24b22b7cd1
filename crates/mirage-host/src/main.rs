//! Mirage host binary: accepts control-channel connections, runs the
//! session driver, and fragments encoded frames onto the UDP video channel
//! (§4.7, §4.9, §6).
//!
//! Screen capture and video encoding are out of scope (§1); this
//! binary drives the wire protocol only. A real deployment would feed
//! [`HostEvent::EncodedFrameReady`] from a capture/encode pipeline wired in
//! by the caller of [`HostDriver`]; this binary has no such pipeline and so
//! only logs [`HostAction::RequestKeyframe`] rather than acting on it.

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use clap::Parser;
use mirage_core::{Environment, SystemEnvironment};
use mirage_host::{
    driver::{HostAction, HostDriver, HostEvent, LogLevel},
    HostConfig,
};
use mirage_proto::payloads::Payload;
use mirage_transport::{control::KEEPALIVE_INTERVAL, video::VideoDatagram, ControlChannel, VideoChannel};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Mirage host: streams a captured window or desktop over the Mirage
/// protocol.
#[derive(Debug, Parser)]
#[command(name = "mirage-host", about = "Mirage screen-streaming host")]
struct Args {
    /// TCP address for the control channel.
    #[arg(long, default_value = "0.0.0.0:7830")]
    control_bind: String,

    /// UDP address for the video channel.
    #[arg(long, default_value = "0.0.0.0:7831")]
    video_bind: String,

    /// Human-readable host name advertised in the handshake.
    #[arg(long, default_value = "mirage-host")]
    host_name: String,

    /// Log level filter, passed straight to `tracing_subscriber::EnvFilter`.
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct SharedState {
    driver: Mutex<HostDriver>,
    video: VideoChannel,
    registrations: Mutex<HashMap<[u8; 16], SocketAddr>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(tracing_subscriber::fmt::layer()).with(filter).init();

    let env = SystemEnvironment;
    let mut host_id = [0u8; 16];
    env.random_bytes(&mut host_id);

    let video = VideoChannel::bind(&args.video_bind).await?;
    let data_port = video.local_addr()?.port();

    let driver = HostDriver::new(HostConfig::default(), host_id, args.host_name.clone(), data_port);
    let state = Arc::new(SharedState { driver: Mutex::new(driver), video, registrations: Mutex::new(HashMap::new()) });

    tokio::spawn(run_video_listener(state.clone()));

    let listener = TcpListener::bind(&args.control_bind).await?;
    info!(control_bind = %args.control_bind, video_bind = %args.video_bind, "mirage-host listening");

    let mut next_session_id = 1u64;
    loop {
        let (stream, peer) = listener.accept().await?;
        let session_id = next_session_id;
        next_session_id += 1;

        let state = state.clone();
        tokio::spawn(async move {
            if let Err(error) = run_session(state, session_id, stream).await {
                warn!(session_id, peer = %peer, %error, "session ended with error");
            }
        });
    }
}

/// Receives UDP datagrams and tracks the latest peer address for each
/// client's registered device ID (§4.7 registration packet).
async fn run_video_listener(state: Arc<SharedState>) {
    let mut buf = vec![0u8; 2048];
    loop {
        match state.video.recv_datagram(&mut buf).await {
            Ok((peer, VideoDatagram::Registration(packet))) => {
                state.registrations.lock().await.insert(packet.device_id, peer);
            },
            Ok((_, VideoDatagram::Frame { .. })) => {
                // The host is the sender on the video channel; stray frame
                // datagrams from a client are not part of this protocol.
            },
            Err(error) => warn!(%error, "video channel receive error"),
        }
    }
}

async fn run_session(
    state: Arc<SharedState>,
    session_id: u64,
    stream: tokio::net::TcpStream,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut control = ControlChannel::from_stream(stream)?;
    let mut device_id: Option<[u8; 16]> = None;

    let actions = state.driver.lock().await.handle(HostEvent::SessionConnected { session_id });
    if !execute_actions(&state, session_id, &mut control, &mut device_id, actions).await? {
        return Ok(());
    }

    let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
    keepalive.tick().await;

    loop {
        tokio::select! {
            envelope = control.recv_envelope() => {
                let Some(envelope) = envelope? else {
                    break;
                };
                let Some(opcode) = envelope.opcode() else {
                    warn!(session_id, type_byte = envelope.type_byte, "unknown opcode");
                    continue;
                };
                let payload = match Payload::decode(opcode, &envelope.payload) {
                    Ok(payload) => payload,
                    Err(error) => {
                        warn!(session_id, %error, "failed to decode control payload");
                        continue;
                    },
                };
                if let Payload::Hello(ref hello) = payload {
                    device_id = Some(hello.device_id);
                }
                let actions = state.driver.lock().await.handle(HostEvent::ControlMessageReceived { session_id, payload });
                if !execute_actions(&state, session_id, &mut control, &mut device_id, actions).await? {
                    break;
                }
            }
            _ = keepalive.tick() => {
                control.send_control(&Payload::Ping).await?;
            }
        }
    }

    let actions = state.driver.lock().await.handle(HostEvent::SessionDisconnected { session_id });
    execute_actions(&state, session_id, &mut control, &mut device_id, actions).await?;
    Ok(())
}

/// Executes the actions the driver returned. Returns `false` if the caller
/// should stop driving this session (its control channel was closed).
async fn execute_actions(
    state: &Arc<SharedState>,
    session_id: u64,
    control: &mut ControlChannel,
    device_id: &mut Option<[u8; 16]>,
    actions: Vec<HostAction>,
) -> Result<bool, Box<dyn std::error::Error>> {
    for action in actions {
        match action {
            HostAction::SendControl { payload, .. } => {
                control.send_control(&payload).await?;
            },
            HostAction::SendVideo { bursts, .. } => {
                let Some(id) = device_id else {
                    warn!(session_id, "dropping video burst: no registered device yet");
                    continue;
                };
                let peer = state.registrations.lock().await.get(id).copied();
                let Some(peer) = peer else {
                    warn!(session_id, "dropping video burst: peer not yet registered");
                    continue;
                };
                for burst in bursts {
                    if !burst.delay_before.is_zero() {
                        tokio::time::sleep(burst.delay_before).await;
                    }
                    state.video.send_video_packets(peer, &burst.packets).await?;
                }
            },
            HostAction::CloseSession { reason, .. } => {
                info!(session_id, reason, "closing session");
                return Ok(false);
            },
            HostAction::RequestKeyframe { stream_id, .. } => {
                info!(session_id, %stream_id, "keyframe requested (no encoder pipeline attached)");
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
