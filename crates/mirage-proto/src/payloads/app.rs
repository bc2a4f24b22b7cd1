//! Desktop-stream app-surface payloads: cursor, content bounds, remote menus.
//!
//! These ride the same control channel as the stream-lifecycle messages but
//! describe the desktop/app chrome around a stream rather than the stream
//! itself. Message families the protocol description §4.2 elides the detailed schema for
//! (`appList`/`appSelect`/… `0x80`-`0x8E`) are carried as [`Opaque`] so the
//! framer stays forward-compatible without this crate guessing a shape the
//! specification didn't commit to.

use ciborium::Value;
use serde::{Deserialize, Serialize};

use crate::ids::StreamId;

/// Cursor bitmap update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorUpdate {
    /// Stream the cursor belongs to.
    pub stream_id: StreamId,
    /// Cursor image, in a host-defined encoding (e.g. PNG bytes).
    pub image: Vec<u8>,
    /// Hotspot x offset within `image`.
    pub hotspot_x: u32,
    /// Hotspot y offset within `image`.
    pub hotspot_y: u32,
}

/// Cursor position update, in content-rect-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Stream the cursor belongs to.
    pub stream_id: StreamId,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Whether the cursor is currently visible.
    pub visible: bool,
}

/// Update to the live-content sub-rectangle within a stream's frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentBoundsUpdate {
    /// Stream whose content rect changed.
    pub stream_id: StreamId,
    /// Left edge, source pixels.
    pub x: f32,
    /// Top edge, source pixels.
    pub y: f32,
    /// Width, source pixels.
    pub w: f32,
    /// Height, source pixels.
    pub h: f32,
}

/// Remote menu-bar snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuBarUpdate {
    /// Stream the menu bar belongs to.
    pub stream_id: StreamId,
    /// Opaque, host-defined menu tree document.
    pub menu: Value,
}

/// Request to invoke a remote menu action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuActionRequest {
    /// Stream the menu belongs to.
    pub stream_id: StreamId,
    /// Host-defined action identifier from the last [`MenuBarUpdate`].
    pub action_id: String,
}

/// Result of a [`MenuActionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuActionResult {
    /// Stream the menu belongs to.
    pub stream_id: StreamId,
    /// Whether the action succeeded.
    pub success: bool,
    /// Human-readable failure reason, if any.
    pub reason: Option<String>,
}

/// An elided app-management message (`0x80`-`0x8E`): app list/select/etc.
/// Carried verbatim; this core only forwards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opaque {
    /// Opaque, host-defined document.
    pub body: Value,
}
