//! Stream lifecycle payloads: window enumeration, start/stop, metrics.
//!
//! `StartStream` and `StreamStarted` mirror the protocol description §6's schemas exactly.
//! The `protocolVersion = 3` key-mapping open question (§9) is resolved by
//! only ever emitting/accepting `frame_quality`/`keyframe_quality` here; see
//! `DESIGN.md`.

use serde::{Deserialize, Serialize};

use crate::ids::{StreamId, WindowId};

/// A capturable window, as enumerated by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Host-assigned window identifier.
    pub window_id: WindowId,
    /// Window title, for display purposes only.
    pub title: String,
    /// Owning application name.
    pub app_name: String,
    /// Pixel width of the window at enumeration time.
    pub width: u32,
    /// Pixel height of the window at enumeration time.
    pub height: u32,
}

/// Full window list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowList {
    /// Currently capturable windows.
    pub windows: Vec<WindowInfo>,
}

/// Incremental window list change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WindowUpdate {
    /// A window appeared.
    Added(WindowInfo),
    /// A window's metadata changed.
    Changed(WindowInfo),
    /// A window disappeared.
    Removed(WindowId),
}

/// Client's request to begin streaming a window.
///
/// Optional fields are exactly those the protocol description §6 lists with a trailing `?`;
/// all use the protocol-version-3 key names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartStream {
    /// Window to capture.
    pub window_id: WindowId,
    /// Coarse quality hint understood by the host's encoder selection.
    pub preferred_quality: String,
    /// Requested UDP data port, if the client wants a specific one.
    pub data_port: Option<u16>,
    /// Requested capture scale factor.
    pub scale_factor: Option<f32>,
    /// Requested capture pixel width.
    pub pixel_width: Option<u32>,
    /// Requested capture pixel height.
    pub pixel_height: Option<u32>,
    /// Requested display-space width.
    pub display_width: Option<u32>,
    /// Requested display-space height.
    pub display_height: Option<u32>,
    /// Requested keyframe interval, in frames.
    pub key_frame_interval: Option<u32>,
    /// Target per-frame encode quality (protocol-version-3 key).
    pub frame_quality: Option<f32>,
    /// Keyframe-specific quality override (protocol-version-3 key).
    pub keyframe_quality: Option<f32>,
    /// Requested pixel format, host-defined string.
    pub pixel_format: Option<String>,
    /// Requested color space, host-defined string.
    pub color_space: Option<String>,
    /// Requested capture queue depth.
    pub capture_queue_depth: Option<u32>,
    /// Minimum acceptable encode bitrate, bits/sec.
    pub min_bitrate: Option<u64>,
    /// Maximum acceptable encode bitrate, bits/sec.
    pub max_bitrate: Option<u64>,
    /// Requested stream scale (independent of capture scale).
    pub stream_scale: Option<f32>,
    /// Whether the host may adapt scale at runtime.
    pub adaptive_scale_enabled: Option<bool>,
    /// Requested latency-vs-quality tradeoff mode, host-defined string.
    pub latency_mode: Option<String>,
    /// Maximum refresh rate; defaults to 60 if absent.
    pub max_refresh_rate: Option<u32>,
}

impl StartStream {
    /// `max_refresh_rate`, defaulting to 60 as the protocol description §6 specifies.
    #[must_use]
    pub fn max_refresh_rate_or_default(&self) -> u32 {
        self.max_refresh_rate.unwrap_or(60)
    }
}

/// Host's confirmation that a stream has started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamStarted {
    /// Assigned stream identifier.
    pub stream_id: StreamId,
    /// Window being captured.
    pub window_id: WindowId,
    /// Negotiated pixel width.
    pub width: u32,
    /// Negotiated pixel height.
    pub height: u32,
    /// Negotiated frame rate.
    pub frame_rate: u32,
    /// Negotiated codec identifier string.
    pub codec: String,
    /// Minimum pixel width the host will ever encode at.
    pub min_width: Option<u32>,
    /// Minimum pixel height the host will ever encode at.
    pub min_height: Option<u32>,
    /// Initial dimension token; absent implies validation starts disabled.
    pub dimension_token: Option<u16>,
}

/// Client's request to stop a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopStream {
    /// Stream to stop.
    pub stream_id: StreamId,
}

/// Host's confirmation that a stream has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStopped {
    /// Stream that stopped.
    pub stream_id: StreamId,
}

/// Periodic stream metrics report (see `mirage-core`'s metrics snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamMetrics {
    /// Stream these metrics describe.
    pub stream_id: StreamId,
    /// Decoded frames per second over the sampling window.
    pub decoded_fps: f32,
    /// Received frames per second over the sampling window.
    pub received_fps: f32,
    /// Total frames dropped (reassembler + decode queue) in the window.
    pub dropped_frames: u32,
}

/// Client's request for a fresh keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframeRequest {
    /// Stream that needs a keyframe.
    pub stream_id: StreamId,
}

/// Client's request to start a full-desktop (not single-window) stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartDesktopStream {
    /// Shared start-stream parameters (same fields the window case uses).
    pub params: StartStream,
}

/// Client's request to stop a desktop stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopDesktopStream {
    /// Desktop stream to stop.
    pub stream_id: StreamId,
}

/// Host's confirmation that a desktop stream has started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopStreamStarted {
    /// Shared started-stream fields (same shape as a window stream).
    pub started: StreamStarted,
}

/// Host's confirmation that a desktop stream has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopStreamStopped {
    /// Desktop stream that stopped.
    pub stream_id: StreamId,
}

/// Client's request to change a running stream's scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamScaleChange {
    /// Stream to rescale.
    pub stream_id: StreamId,
    /// New requested scale factor.
    pub scale: f32,
}

/// Client's request to change a running stream's refresh rate cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRefreshRateChange {
    /// Stream to adjust.
    pub stream_id: StreamId,
    /// New requested refresh rate cap.
    pub refresh_rate: u32,
}

/// Host's notice that the underlying display resolution changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayResolutionChange {
    /// New display pixel width.
    pub width: u32,
    /// New display pixel height.
    pub height: u32,
    /// New display scale factor.
    pub scale_factor: f32,
}
