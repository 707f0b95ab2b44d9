// Command dispatcher: logical motor intents -> wire frames -> transport
//
// The dispatcher is the only writer of MotorPairState. A command updates the
// local model only once its frame has been handed to the transport, so the
// model always reflects exactly what was last transmitted.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::messages::{Message, MotorPairState, MotorState, MoveCommand};
use crate::protocol::{FrameError, encode_message};

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Encode error: {0}")]
    Frame(#[from] FrameError),

    #[error("Send failed: {0}")]
    Transport(#[from] TransportError),
}

/// Outbound side of the connection, one complete frame per call
pub trait FrameSink {
    fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;
}

/// Frames queued for the connection's writer task
impl FrameSink for UnboundedSender<Vec<u8>> {
    fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.send(frame).map_err(|_| TransportError::Closed)
    }
}

pub struct Dispatcher<S> {
    sink: S,
    state: MotorPairState,
}

impl<S: FrameSink> Dispatcher<S> {
    /// Start a session with both motors idle
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: MotorPairState::default(),
        }
    }

    /// Last transmitted motor state
    pub fn state(&self) -> MotorPairState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[cfg(test)]
    pub(crate) fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Drive both motors with one `motor-control` frame
    pub fn send_motor_control(
        &mut self,
        motor1: MotorState,
        motor2: MotorState,
    ) -> Result<MotorPairState, DispatchError> {
        let next = MotorPairState::new(motor1, motor2);
        self.transmit(&Message::MotorControl(next))?;
        Ok(self.commit(next))
    }

    /// Drive a single motor with one `move-control` frame
    pub fn send_move_control(&mut self, cmd: MoveCommand) -> Result<MotorPairState, DispatchError> {
        self.transmit(&Message::MoveControl(cmd))?;
        let next = self.state.with(cmd.motor(), cmd.state());
        Ok(self.commit(next))
    }

    /// Ask the vehicle to start or stop streaming camera frames
    pub fn send_camera_control(&mut self, on: bool) -> Result<(), DispatchError> {
        self.transmit(&Message::CameraControl { on })
    }

    fn transmit(&mut self, message: &Message) -> Result<(), DispatchError> {
        let frame = encode_message(message)?;
        self.sink.send_frame(frame)?;
        Ok(())
    }

    fn commit(&mut self, next: MotorPairState) -> MotorPairState {
        if next != self.state {
            debug!("Motor state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        next
    }
}
