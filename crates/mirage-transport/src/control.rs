//! TCP control channel: framing, send, and the accumulate-and-deframe
//! receive loop (§4.7).
//!
//! A connection-bridging shape over a single `tokio::net::TcpStream` (one
//! ordered byte stream, not a multiplexed connection), with framing
//! delegated entirely to `mirage_proto::control::Envelope`.

use bytes::{Buf, Bytes, BytesMut};
use mirage_proto::{control::Envelope, payloads::Payload};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, ToSocketAddrs},
};

use crate::error::{Result, TransportError};

/// Interval at which an idle control channel sends a keepalive ping (spec
/// §4.7: "keep-alive with 5 s interval").
pub const KEEPALIVE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// One TCP control channel: an accumulating read buffer plus a plain
/// `TcpStream`, framed with [`Envelope`].
pub struct ControlChannel {
    stream: TcpStream,
    read_buf: BytesMut,
}

impl ControlChannel {
    /// Connect to `addr`, enabling `TCP_NODELAY` (§4.7: "no-delay on").
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(TransportError::ConnectionFailed)?;
        Self::from_stream(stream)
    }

    /// Wrap an already-accepted stream (host side).
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self { stream, read_buf: BytesMut::with_capacity(4096) })
    }

    /// Peer address, for logging.
    pub fn peer_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }

    /// Serialize and send a control payload (§4.7 `sendControl`).
    pub async fn send_control(&mut self, payload: &Payload) -> Result<()> {
        let mut body = BytesMut::new();
        payload.encode(&mut body)?;
        let envelope = Envelope::new(payload.opcode(), body.freeze());
        let mut wire = BytesMut::new();
        envelope.encode(&mut wire)?;
        self.stream.write_all(&wire).await.map_err(TransportError::ConnectionFailed)?;
        Ok(())
    }

    /// Read from the socket, accumulating into the internal buffer, until
    /// one complete [`Envelope`] can be deframed, or the peer closes the
    /// stream (`Ok(None)`).
    pub async fn recv_envelope(&mut self) -> Result<Option<Envelope>> {
        loop {
            if let Some(envelope) = self.try_deframe() {
                return Ok(Some(envelope));
            }
            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await.map_err(TransportError::ConnectionFailed)?;
            if n == 0 {
                return Ok(None);
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn try_deframe(&mut self) -> Option<Envelope> {
        let mut view: Bytes = self.read_buf.clone().freeze();
        let envelope = Envelope::decode(&mut view)?;
        let consumed = self.read_buf.len() - view.len();
        self.read_buf.advance(consumed);
        Some(envelope)
    }
}

#[cfg(test)]
mod tests {
    use mirage_proto::payloads::session::Disconnect;
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn round_trips_one_message_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut channel = ControlChannel::from_stream(stream).unwrap();
            channel.recv_envelope().await.unwrap().expect("one message")
        });

        let mut client = ControlChannel::connect(addr).await.unwrap();
        client.send_control(&Payload::Disconnect(Disconnect { reason: Some("bye".into()) })).await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(received.opcode(), Some(mirage_proto::Opcode::Disconnect));
    }

    #[tokio::test]
    async fn deframes_two_messages_sent_back_to_back() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut channel = ControlChannel::from_stream(stream).unwrap();
            let first = channel.recv_envelope().await.unwrap().expect("first message");
            let second = channel.recv_envelope().await.unwrap().expect("second message");
            (first.opcode(), second.opcode())
        });

        let mut client = ControlChannel::connect(addr).await.unwrap();
        client.send_control(&Payload::Ping).await.unwrap();
        client.send_control(&Payload::Pong).await.unwrap();

        let (first, second) = server.await.unwrap();
        assert_eq!(first, Some(mirage_proto::Opcode::Ping));
        assert_eq!(second, Some(mirage_proto::Opcode::Pong));
    }

    #[tokio::test]
    async fn recv_returns_none_on_clean_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut client = ControlChannel::connect(addr).await.unwrap();
        server.await.unwrap();
        assert!(client.recv_envelope().await.unwrap().is_none());
    }
}
