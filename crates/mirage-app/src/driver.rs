//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use mirage_proto::{payloads::Payload, FrameHeader};

use crate::{App, AppEvent};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic, so the same
/// orchestration code runs against a real terminal and transport, or a
/// deterministic simulation driver.
///
/// # Implementations
///
/// - **CLI**: crossterm-free loopback demo, `mirage-transport` over TCP/UDP
/// - **Simulation**: `turmoil` network, injected key events
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Poll for the next UI input event (keyboard, terminal resize, tick).
    ///
    /// Returns the available event, or `None` if none is ready yet.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Send a control-channel payload to the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the send fails.
    fn send_control(&mut self, payload: Payload) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive a control-channel payload from the host.
    ///
    /// Returns `None` if the connection closed.
    fn recv_control(&mut self) -> impl Future<Output = Option<Payload>> + Send;

    /// Receive one video datagram already header-parsed, if one has
    /// arrived.
    fn recv_video(&mut self) -> impl Future<Output = Option<(FrameHeader, Vec<u8>)>> + Send;

    /// Establish the control and video channels with the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn connect(&mut self, control_addr: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Whether the control channel is currently connected.
    fn is_connected(&self) -> bool;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
