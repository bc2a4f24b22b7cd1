//! Simulation host wrapper for testing with turmoil.
//!
//! `SimHost` wraps [`HostDriver`] the way `mirage_host`'s real binary does,
//! but hand-rolls the control/video I/O against `turmoil::net` sockets
//! instead of `mirage_transport` (whose channel types are hardwired to
//! `tokio::net`, not generic over a socket trait). The framing itself —
//! accumulate-then-deframe on the control stream, classify-then-dispatch on
//! the video socket — mirrors `mirage_transport::control`/`video` exactly so
//! a SimHost and a real host are wire-compatible.

use std::{collections::HashMap, io, net::SocketAddr};

use bytes::{Buf, Bytes, BytesMut};
use mirage_host::{
    driver::{HostAction, HostDriver, HostEvent, LogLevel},
    HostConfig,
};
use mirage_proto::{control::Envelope, payloads::Payload, RegistrationPacket};
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use turmoil::net::{TcpListener, TcpStream, UdpSocket};

/// Write half plus accumulating read buffer for one simulated session's
/// control connection.
struct SimSession {
    writer: WriteHalf<TcpStream>,
}

/// Simulation host: wraps [`HostDriver`] over turmoil TCP (control) and UDP
/// (video), one session per accepted connection.
///
/// Like `mirage_host`'s real binary, tests drive this by calling
/// [`SimHost::accept_session`]/[`SimHost::pump_session`] explicitly rather
/// than having it run autonomously, so assertions can interleave with I/O.
pub struct SimHost {
    driver: HostDriver,
    listener: TcpListener,
    video: UdpSocket,
    sessions: HashMap<u64, SimSession>,
    pending_readers: HashMap<u64, ReadHalf<TcpStream>>,
    registrations: HashMap<[u8; 16], SocketAddr>,
    next_session_id: u64,
}

impl SimHost {
    /// Bind control and video sockets and construct the driver.
    pub async fn bind(control_addr: &str, video_addr: &str, host_id: [u8; 16]) -> io::Result<Self> {
        Self::bind_with_config(control_addr, video_addr, host_id, HostConfig::default()).await
    }

    /// As [`SimHost::bind`], with a custom [`HostConfig`].
    pub async fn bind_with_config(
        control_addr: &str,
        video_addr: &str,
        host_id: [u8; 16],
        config: HostConfig,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(control_addr).await?;
        let video = UdpSocket::bind(video_addr).await?;
        let data_port = video.local_addr()?.port();
        let driver = HostDriver::new(config, host_id, "sim-host".into(), data_port);
        Ok(Self {
            driver,
            listener,
            video,
            sessions: HashMap::new(),
            pending_readers: HashMap::new(),
            registrations: HashMap::new(),
            next_session_id: 1,
        })
    }

    /// Accept one connection, assign it a session id, and feed the driver
    /// `SessionConnected`.
    pub async fn accept_session(&mut self) -> io::Result<u64> {
        let (stream, _peer) = self.listener.accept().await?;
        let session_id = self.next_session_id;
        self.next_session_id += 1;
        let (reader, writer) = tokio::io::split(stream);
        self.sessions.insert(session_id, SimSession { writer });

        let actions = self.driver.handle(HostEvent::SessionConnected { session_id });
        self.execute(actions).await?;

        // The read half isn't stored; callers drive per-session reads via
        // `pump_session`, which owns its own loop over `reader`.
        self.pending_readers.insert(session_id, reader);
        Ok(session_id)
    }

    /// Read and process exactly one control envelope from `session_id`,
    /// returning `false` once the peer has closed the stream.
    pub async fn pump_session(&mut self, session_id: u64) -> io::Result<bool> {
        let Some(reader) = self.pending_readers.get_mut(&session_id) else {
            return Ok(false);
        };
        let mut buf = BytesMut::with_capacity(4096);
        let envelope = loop {
            if let Some(envelope) = try_deframe(&mut buf) {
                break Some(envelope);
            }
            let mut chunk = [0u8; 4096];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                break None;
            }
            buf.extend_from_slice(&chunk[..n]);
        };
        let Some(envelope) = envelope else {
            self.close_session(session_id, "peer closed").await?;
            return Ok(false);
        };
        let Some(opcode) = envelope.opcode() else {
            return Ok(true);
        };
        let Ok(payload) = Payload::decode(opcode, &envelope.payload) else {
            return Ok(true);
        };
        let actions = self.driver.handle(HostEvent::ControlMessageReceived { session_id, payload });
        self.execute(actions).await?;
        Ok(true)
    }

    /// Feed a host-produced event (typically `EncodedFrameReady` from a
    /// synthetic encoder) straight to the driver.
    pub async fn feed(&mut self, event: HostEvent) -> io::Result<()> {
        let actions = self.driver.handle(event);
        self.execute(actions).await
    }

    /// Receive and classify one UDP datagram, recording registrations.
    pub async fn recv_video_datagram(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let (n, peer) = self.video.recv_from(buf).await?;
        if n >= RegistrationPacket::SIZE && buf[0..4] == RegistrationPacket::MAGIC {
            if let Ok(packet) = RegistrationPacket::parse(&buf[..n]) {
                self.registrations.insert(packet.device_id, peer);
            }
        }
        Ok(())
    }

    async fn execute(&mut self, actions: Vec<HostAction>) -> io::Result<()> {
        for action in actions {
            match action {
                HostAction::SendControl { session_id, payload } => {
                    self.send_control(session_id, &payload).await?;
                },
                HostAction::SendVideo { session_id, bursts } => {
                    self.send_video(session_id, bursts).await?;
                },
                HostAction::CloseSession { session_id, .. } => {
                    self.close_session(session_id, "driver requested close").await?;
                },
                HostAction::RequestKeyframe { .. } => {},
                HostAction::Log { level, message } => log(level, &message),
            }
        }
        Ok(())
    }

    async fn send_control(&mut self, session_id: u64, payload: &Payload) -> io::Result<()> {
        let Some(session) = self.sessions.get_mut(&session_id) else { return Ok(()) };
        let mut body = BytesMut::new();
        payload.encode(&mut body).map_err(io::Error::other)?;
        let envelope = Envelope::new(payload.opcode(), body.freeze());
        let mut wire = BytesMut::new();
        envelope.encode(&mut wire).map_err(io::Error::other)?;
        session.writer.write_all(&wire).await?;
        Ok(())
    }

    async fn send_video(&mut self, session_id: u64, bursts: Vec<mirage_host::packet_sender::PacedBurst>) -> io::Result<()> {
        let device_id = self.driver.device_id_for_session(session_id);
        let Some(device_id) = device_id else { return Ok(()) };
        let Some(peer) = self.registrations.get(&device_id).copied() else { return Ok(()) };
        for burst in bursts {
            if !burst.delay_before.is_zero() {
                tokio::time::sleep(burst.delay_before).await;
            }
            for packet in &burst.packets {
                self.video.send_to(packet, peer).await?;
            }
        }
        Ok(())
    }

    async fn close_session(&mut self, session_id: u64, _reason: &str) -> io::Result<()> {
        self.sessions.remove(&session_id);
        self.pending_readers.remove(&session_id);
        let actions = self.driver.handle(HostEvent::SessionDisconnected { session_id });
        self.execute(actions).await
    }

    /// Underlying driver, for test assertions.
    pub fn driver(&self) -> &HostDriver {
        &self.driver
    }
}

fn try_deframe(buf: &mut BytesMut) -> Option<Envelope> {
    let mut view: Bytes = buf.clone().freeze();
    let envelope = Envelope::decode(&mut view)?;
    let consumed = buf.len() - view.len();
    buf.advance(consumed);
    Some(envelope)
}

fn log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => tracing::debug!("{message}"),
        LogLevel::Info => tracing::info!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
    }
}
