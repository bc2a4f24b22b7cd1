//! Application state machine and UI logic.
//!
//! This is a pure state machine: it consumes [`AppEvent`] inputs and
//! produces [`AppAction`] instructions for the runtime to execute. Unlike
//! the protocol client (which handles reassembly and decode scheduling),
//! this module manages transient interaction state: which streams are open,
//! their last-known metrics, and a short diagnostic log for the UI.

use std::collections::HashMap;

use mirage_proto::{payloads::stream::StartStream, StreamId, WindowId};

use crate::{AppAction, AppEvent, ConnectionState, KeyInput, StreamView};

/// Maximum number of log lines retained for display.
const LOG_CAPACITY: usize = 200;

/// Application state machine.
///
/// Pure state machine that processes events and produces actions. No I/O
/// dependencies; fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    state: ConnectionState,
    control_addr: String,
    streams: HashMap<StreamId, StreamView>,
    active_stream: Option<StreamId>,
    log: Vec<String>,
    quit: bool,
}

impl App {
    /// Create a new App targeting the given control-channel address.
    #[must_use]
    pub fn new(control_addr: String) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            control_addr,
            streams: HashMap::new(),
            active_stream: None,
            log: Vec::new(),
            quit: false,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn connection_state(&self) -> &ConnectionState {
        &self.state
    }

    /// Streams currently tracked, keyed by stream ID.
    #[must_use]
    pub fn streams(&self) -> &HashMap<StreamId, StreamView> {
        &self.streams
    }

    /// Recent diagnostic log lines, oldest first.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Whether the application has requested to quit.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Process an event and return the actions the runtime should perform.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => Vec::new(),
            AppEvent::Resize(_, _) => vec![AppAction::Render],
            AppEvent::Connecting => {
                self.state = ConnectionState::Connecting;
                vec![AppAction::Render]
            },
            AppEvent::Connected { host_id, host_name, data_port } => {
                self.push_log(format!("connected to {host_name}"));
                self.state = ConnectionState::Connected { host_id, host_name };
                vec![AppAction::RegisterVideoPeer { data_port }, AppAction::Render]
            },
            AppEvent::ConnectionRejected { reason } => {
                self.push_log(format!("connection rejected: {reason}"));
                self.state = ConnectionState::Rejected { reason };
                vec![AppAction::Render]
            },
            AppEvent::StreamStarted { stream_id, width, height } => {
                self.push_log(format!("stream {stream_id} started at {width}x{height}"));
                self.streams.insert(stream_id, StreamView::new(width, height));
                self.active_stream.get_or_insert(stream_id);
                vec![AppAction::Render]
            },
            AppEvent::StreamStopped { stream_id } => {
                self.push_log(format!("stream {stream_id} stopped"));
                self.streams.remove(&stream_id);
                if self.active_stream == Some(stream_id) {
                    self.active_stream = self.streams.keys().next().copied();
                }
                vec![AppAction::Render]
            },
            AppEvent::ResizeApplied { stream_id, action } => {
                if let Some(view) = self.streams.get_mut(&stream_id) {
                    let mirage_core::ResizeAction::EmitResize { pixel_size, .. } = action;
                    view.width = pixel_size.width;
                    view.height = pixel_size.height;
                }
                vec![AppAction::Render]
            },
            AppEvent::InputBlockedChanged { stream_id, blocked } => {
                if let Some(view) = self.streams.get_mut(&stream_id) {
                    view.input_blocked = blocked;
                }
                vec![AppAction::Render]
            },
            AppEvent::Metrics { stream_id, snapshot } => {
                if let Some(view) = self.streams.get_mut(&stream_id) {
                    view.metrics = Some(snapshot);
                }
                vec![AppAction::Render]
            },
            AppEvent::Log { message } => {
                self.push_log(message);
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.push_log(format!("error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Esc => {
                self.quit = true;
                vec![AppAction::Quit]
            },
            KeyInput::Char('c') if self.state == ConnectionState::Disconnected => {
                vec![AppAction::Connect { control_addr: self.control_addr.clone() }]
            },
            KeyInput::Char('s') => {
                let start = StartStream {
                    window_id: WindowId(0),
                    preferred_quality: "balanced".into(),
                    data_port: None,
                    scale_factor: None,
                    pixel_width: None,
                    pixel_height: None,
                    display_width: None,
                    display_height: None,
                    key_frame_interval: None,
                    frame_quality: None,
                    keyframe_quality: None,
                    pixel_format: None,
                    color_space: None,
                    capture_queue_depth: None,
                    min_bitrate: None,
                    max_bitrate: None,
                    stream_scale: None,
                    adaptive_scale_enabled: None,
                    latency_mode: None,
                    max_refresh_rate: None,
                };
                vec![AppAction::RequestStartStream(start)]
            },
            KeyInput::Char('x') => self
                .active_stream
                .map(|stream_id| vec![AppAction::RequestStopStream { stream_id }])
                .unwrap_or_default(),
            KeyInput::Tab => {
                if let Some(current) = self.active_stream {
                    let mut ids: Vec<StreamId> = self.streams.keys().copied().collect();
                    ids.sort();
                    if let Some(pos) = ids.iter().position(|id| *id == current) {
                        self.active_stream = ids.get((pos + 1) % ids.len()).copied();
                    }
                }
                vec![AppAction::Render]
            },
            KeyInput::Char(_) | KeyInput::Enter | KeyInput::Up | KeyInput::Down => vec![AppAction::Render],
        }
    }

    fn push_log(&mut self, line: String) {
        self.log.push(line);
        if self.log.len() > LOG_CAPACITY {
            self.log.remove(0);
        }
    }
}
