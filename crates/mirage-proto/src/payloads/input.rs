//! Input-event routing payload.
//!
//! Platform input synthesis is an explicit external collaborator
//! (the protocol description §1); this core only routes an opaque, self-describing event
//! document from client to host keyed by stream. The concrete event schema
//! (key codes, pointer deltas, …) is owned by the platform-input layer, not
//! this transport.

use ciborium::Value;
use serde::{Deserialize, Serialize};

use crate::ids::StreamId;

/// A synthesized input event bound for a specific stream's host window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Stream the event should be played back against.
    pub stream_id: StreamId,
    /// Opaque, platform-defined event document.
    pub event: Value,
}
