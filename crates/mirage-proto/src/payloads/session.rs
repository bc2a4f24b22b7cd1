//! Connection-lifecycle payloads: handshake, disconnect, session-lock state.

use serde::{Deserialize, Serialize};

/// Initial handshake sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hello {
    /// Stable client device UUID.
    pub device_id: [u8; 16],
    /// Human-readable device name.
    pub device_name: String,
    /// Client platform/device type string.
    pub device_type: String,
    /// Protocol version the client speaks.
    pub protocol_version: u8,
    /// Free-form capability flags the client advertises.
    pub capabilities: Vec<String>,
}

/// Host's reply to [`Hello`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelloResponse {
    /// Whether the host accepted the connection.
    pub accepted: bool,
    /// Host's stable UUID.
    pub host_id: [u8; 16],
    /// Human-readable host name.
    pub host_name: String,
    /// Whether the host requires authentication before streaming.
    pub requires_auth: bool,
    /// UDP port the client should send video-channel traffic to.
    pub data_port: u16,
}

/// Graceful disconnect notice, either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disconnect {
    /// Human-readable reason, for logging only.
    pub reason: Option<String>,
}

/// Host login-session lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionLockState {
    /// Session is unlocked and capturable.
    Unlocked,
    /// Session is locked (e.g. screensaver / login window).
    Locked,
}

/// Host session (lock/unlock) state update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStateUpdate {
    /// Current lock state.
    pub state: SessionLockState,
}

/// Client request to unlock the host's login session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockRequest {
    /// Opaque credential blob; this core does not interpret or validate it.
    pub credential: Vec<u8>,
}

/// Host's response to an [`UnlockRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockResponse {
    /// Whether the unlock succeeded.
    pub success: bool,
    /// Human-readable failure reason, if any.
    pub reason: Option<String>,
}

