//! Application side-effects and intents.
//!
//! [`AppAction`] values are instructions produced by the [`crate::App`]
//! state machine for the [`crate::Runtime`] to execute.

use mirage_proto::{payloads::stream::StartStream, StreamId};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Connect to a host.
    Connect {
        /// Control-channel address (host:port).
        control_addr: String,
    },

    /// Register the video channel's UDP peer now that the host's data port
    /// is known.
    RegisterVideoPeer {
        /// UDP port the host is listening for video traffic on.
        data_port: u16,
    },

    /// Request the host start streaming a window.
    RequestStartStream(StartStream),

    /// Request the host stop a stream.
    RequestStopStream {
        /// Stream to stop.
        stream_id: StreamId,
    },
}
