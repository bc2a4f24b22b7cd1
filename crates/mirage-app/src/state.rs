//! Observable application state types.
//!
//! These structures are the "view model" for the application: the subset
//! of client state needed to render a UI, without exposing
//! [`mirage_client::Client`]'s internal reassembler/decode-queue machinery.

use mirage_core::MetricsSnapshot;

/// Connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to a host.
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Connected with an established session.
    Connected {
        /// Host's stable UUID.
        host_id: [u8; 16],
        /// Host's human-readable name.
        host_name: String,
    },
    /// The host rejected the handshake.
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
}

/// Per-stream view state.
#[derive(Debug, Clone)]
pub struct StreamView {
    /// Negotiated pixel width.
    pub width: u32,
    /// Negotiated pixel height.
    pub height: u32,
    /// Most recent metrics snapshot, if any has arrived yet.
    pub metrics: Option<MetricsSnapshot>,
    /// Whether the stream is currently considered frozen (input blocked).
    pub input_blocked: bool,
}

impl StreamView {
    /// Create a fresh view for a stream that just started.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, metrics: None, input_blocked: false }
    }
}
