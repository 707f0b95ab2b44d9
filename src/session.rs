// Session: everything the event loop calls, one method per kind of event
//
// All methods run on the single event loop thread. Input is only turned into
// commands while the connection is open; after close nothing is sent.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::control::{Dispatcher, FrameSink, InputEvent, Reconciler};
use crate::messages::{MotorPairState, MotorState};
use crate::protocol::registry;
use crate::telemetry::{ConnectionState, Display, TelemetrySink};

pub struct Session<S, D> {
    reconciler: Reconciler<S>,
    sink: TelemetrySink<D>,
    connection: ConnectionState,
    camera_on: bool,
}

impl<S: FrameSink, D: Display> Session<S, D> {
    pub fn new(reconciler: Reconciler<S>, display: D) -> Self {
        Self {
            reconciler,
            sink: TelemetrySink::new(display),
            connection: ConnectionState::Connecting,
            camera_on: true,
        }
    }

    /// Session over a fresh dispatcher, no release watchdog
    pub fn with_sink(frames: S, display: D) -> Self {
        Self::new(Reconciler::new(Dispatcher::new(frames)), display)
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn motor_state(&self) -> MotorPairState {
        self.reconciler.state()
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    pub fn display(&self) -> &D {
        self.sink.display()
    }

    fn is_open(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    fn set_connection(&mut self, state: ConnectionState) {
        self.connection = state;
        self.sink.display_mut().set_connection_state(state);
    }

    pub fn on_connecting(&mut self) {
        self.set_connection(ConnectionState::Connecting);
    }

    pub fn on_open(&mut self) {
        info!("Connected");
        self.set_connection(ConnectionState::Connected);
        let state = self.reconciler.state();
        self.sink.display_mut().set_motor_labels(state);
    }

    pub fn on_close(&mut self) {
        info!("Disconnected");
        self.set_connection(ConnectionState::Disconnected);
    }

    pub fn on_error(&mut self, reason: &str) {
        warn!("Connection error: {}", reason);
        self.set_connection(ConnectionState::Error);
    }

    /// Feed one input event through the reconciler
    pub fn on_input(&mut self, event: InputEvent) {
        if !self.is_open() {
            debug!("Not connected, dropping {:?}", event);
            return;
        }

        match self.reconciler.handle(event) {
            Ok(Some(state)) => self.sink.display_mut().set_motor_labels(state),
            Ok(None) => {}
            Err(e) => warn!("Command for {:?} not sent: {}", event, e),
        }
    }

    /// Release holds the watchdog considers lost
    pub fn on_tick(&mut self, now: Instant) {
        if !self.is_open() {
            return;
        }

        match self.reconciler.tick(now) {
            Ok(Some(state)) => self.sink.display_mut().set_motor_labels(state),
            Ok(None) => {}
            Err(e) => warn!("Watchdog release not sent: {}", e),
        }
    }

    /// One binary transport message, expected to hold exactly one frame
    pub fn on_binary(&mut self, bytes: &[u8]) {
        if let Some(message) = registry::resolve(bytes) {
            self.sink.apply(message);
        }
    }

    /// Text messages are not protocol frames
    pub fn on_text(&mut self, text: &str) {
        info!("Vehicle says: {}", text);
    }

    /// Idle both motors before leaving, unless they already are
    pub fn stop_motors(&mut self) {
        if !self.is_open() || self.reconciler.state() == MotorPairState::default() {
            return;
        }

        info!("Stopping motors");
        match self
            .reconciler
            .dispatcher_mut()
            .send_motor_control(MotorState::Idle, MotorState::Idle)
        {
            Ok(state) => self.sink.display_mut().set_motor_labels(state),
            Err(e) => warn!("Stop not sent: {}", e),
        }
    }

    /// Flip the camera stream request; returns the requested state if sent
    pub fn toggle_camera(&mut self) -> Option<bool> {
        if !self.is_open() {
            return None;
        }

        let on = !self.camera_on;
        match self.reconciler.dispatcher_mut().send_camera_control(on) {
            Ok(()) => {
                info!("Camera {}", if on { "on" } else { "off" });
                self.camera_on = on;
                Some(on)
            }
            Err(e) => {
                warn!("Camera control not sent: {}", e);
                None
            }
        }
    }
}
