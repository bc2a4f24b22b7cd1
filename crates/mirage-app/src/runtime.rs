//! Generic runtime for application orchestration.
//!
//! The [`Runtime`] drives the application event loop, coordinating between
//! [`App`] (UI state machine), [`Bridge`] (protocol bridge to
//! [`mirage_client::Client`]), and [`Driver`] (platform-specific I/O).

use std::{ops::Sub, time::Duration};

use mirage_client::{ClientIdentity, PROTOCOL_VERSION};
use mirage_core::Decoder;

use crate::{App, AppAction, AppEvent, Bridge, Driver};

/// Generic runtime that orchestrates [`App`], [`Bridge`], and a [`Driver`].
pub struct Runtime<Dr, D, F>
where
    Dr: Driver,
    D: Decoder,
    F: Fn() -> D,
{
    driver: Dr,
    app: App,
    bridge: Bridge<Dr::Instant, D, F>,
    control_addr: String,
}

impl<Dr, D, F> Runtime<Dr, D, F>
where
    Dr: Driver,
    Dr::Instant: Sub<Output = Duration>,
    D: Decoder,
    F: Fn() -> D,
{
    /// Create a new runtime with the given driver, identity, and decoder
    /// factory.
    pub fn new(driver: Dr, identity: ClientIdentity, decoder_factory: F, control_addr: String) -> Self {
        let app = App::new(control_addr.clone());
        let bridge = Bridge::new(identity, decoder_factory);
        Self { driver, app, bridge, control_addr }
    }

    /// Run the main event loop until the app requests to quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), Dr::Error> {
        self.driver.render(&self.app)?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    async fn process_cycle(&mut self) -> Result<bool, Dr::Error> {
        if let Some(event) = self.driver.poll_event().await? {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }

        if self.driver.is_connected() {
            if let Some(payload) = self.driver.recv_control().await {
                let events = self.bridge.handle_control(payload);
                self.send_outgoing().await?;
                if self.process_bridge_events(events).await? {
                    return Ok(true);
                }
            }

            if let Some((header, payload)) = self.driver.recv_video().await {
                let now = self.driver.now();
                let events = self.bridge.handle_video(header, payload, now);
                if self.process_bridge_events(events).await? {
                    return Ok(true);
                }
            }
        }

        let now = self.driver.now();
        let events = self.bridge.handle_tick(now);
        self.process_bridge_events(events).await
    }

    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, Dr::Error> {
        let mut pending = initial_actions;

        while !pending.is_empty() {
            let actions = std::mem::take(&mut pending);
            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),
                    AppAction::Connect { ref control_addr } => {
                        self.driver.connect(control_addr).await?;
                        let events = self.app.handle(AppEvent::Connecting);
                        pending.extend(events);
                        let events = self.bridge.connect(PROTOCOL_VERSION, Vec::new());
                        for event in events {
                            pending.extend(self.app.handle(event));
                        }
                        self.send_outgoing().await?;
                    },
                    AppAction::RequestStartStream(_) | AppAction::RequestStopStream { .. } => {
                        let events = self.bridge.process_app_action(action);
                        for event in events {
                            pending.extend(self.app.handle(event));
                        }
                        self.send_outgoing().await?;
                    },
                }
            }
        }
        Ok(false)
    }

    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<bool, Dr::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn send_outgoing(&mut self) -> Result<(), Dr::Error> {
        for payload in self.bridge.take_outgoing() {
            self.driver.send_control(payload).await?;
        }
        Ok(())
    }

    /// Reference to the current app state, for tests and embedding.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Control-channel address this runtime was configured with.
    #[must_use]
    pub fn control_addr(&self) -> &str {
        &self.control_addr
    }
}
