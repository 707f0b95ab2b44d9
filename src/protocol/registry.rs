// Message registry: payload shapes per message type, typed decode and encode

use tracing::{debug, warn};

use super::codec::{self, Frame, FrameError};
use crate::messages::{
    Message, MessageType, Motor, MotorPairState, MotorState, MoveCommand, TelemetrySample,
};

/// Expected payload layout for a message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Exactly this many bytes
    Exact(usize),
    /// Any length, interpreted as a whole
    Opaque,
}

/// Reasons a decoded frame yields no typed message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown message type 0x{0:02X}")]
    UnknownMessageType(u8),

    #[error("Payload shape mismatch for {message_type:?}: expected {expected} bytes, got {actual}")]
    PayloadShapeMismatch {
        message_type: MessageType,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid ordinal {value} in {message_type:?} payload")]
    InvalidOrdinal {
        message_type: MessageType,
        value: u8,
    },

    #[error("{0:?} carries no payload semantics")]
    Unsupported(MessageType),
}

/// Payload shape for each message type, `None` for types without semantics
pub fn payload_shape(ty: MessageType) -> Option<PayloadShape> {
    let shape = match ty {
        MessageType::Unknown => return None,
        MessageType::MotorState => PayloadShape::Exact(2),
        MessageType::Telemetry => PayloadShape::Exact(4),
        MessageType::CameraControl => PayloadShape::Exact(1),
        MessageType::CameraChunk => PayloadShape::Opaque,
        MessageType::MotorControl => PayloadShape::Exact(2),
        MessageType::MoveControl => PayloadShape::Exact(1),
        MessageType::BatteryLevel => PayloadShape::Exact(1),
        MessageType::DistanceReading => PayloadShape::Exact(1),
    };
    Some(shape)
}

fn motor_state(ty: MessageType, value: u8) -> Result<MotorState, RegistryError> {
    MotorState::from_ordinal(value).ok_or(RegistryError::InvalidOrdinal {
        message_type: ty,
        value,
    })
}

/// Turn a decoded frame into a typed message
pub fn decode_message(frame: &Frame<'_>) -> Result<Message, RegistryError> {
    let ty = frame
        .message_type()
        .ok_or(RegistryError::UnknownMessageType(frame.type_id))?;
    let shape = payload_shape(ty).ok_or(RegistryError::Unsupported(ty))?;

    let p = frame.payload;
    if let PayloadShape::Exact(expected) = shape {
        if p.len() != expected {
            return Err(RegistryError::PayloadShapeMismatch {
                message_type: ty,
                expected,
                actual: p.len(),
            });
        }
    }

    let message = match ty {
        MessageType::MotorState => Message::MotorState {
            motor: Motor::from_ordinal(p[0]).ok_or(RegistryError::InvalidOrdinal {
                message_type: ty,
                value: p[0],
            })?,
            state: motor_state(ty, p[1])?,
        },
        MessageType::Telemetry => Message::Telemetry(TelemetrySample {
            motor1: motor_state(ty, p[0])?,
            motor2: motor_state(ty, p[1])?,
            battery: p[2],
            distance_cm: p[3],
        }),
        MessageType::CameraControl => Message::CameraControl { on: p[0] != 0 },
        MessageType::CameraChunk => Message::CameraChunk(p.to_vec()),
        MessageType::MotorControl => Message::MotorControl(MotorPairState::new(
            motor_state(ty, p[0])?,
            motor_state(ty, p[1])?,
        )),
        MessageType::MoveControl => {
            Message::MoveControl(MoveCommand::from_ordinal(p[0]).ok_or(
                RegistryError::InvalidOrdinal {
                    message_type: ty,
                    value: p[0],
                },
            )?)
        }
        MessageType::BatteryLevel => Message::BatteryLevel(p[0]),
        MessageType::DistanceReading => Message::DistanceReading(p[0]),
        MessageType::Unknown => return Err(RegistryError::Unsupported(ty)),
    };

    Ok(message)
}

/// Decode raw transport bytes, logging and dropping anything unusable
///
/// Never fails: malformed input yields `None` ("no applicable update").
pub fn resolve(bytes: &[u8]) -> Option<Message> {
    let frame = match codec::decode(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Dropping frame: {}", e);
            return None;
        }
    };

    match decode_message(&frame) {
        Ok(message) => Some(message),
        Err(e @ (RegistryError::UnknownMessageType(_) | RegistryError::Unsupported(_))) => {
            debug!("Ignoring frame: {}", e);
            None
        }
        Err(e) => {
            warn!("Dropping frame: {}", e);
            None
        }
    }
}

/// Serialize a typed message into its payload bytes
pub fn payload(message: &Message) -> Vec<u8> {
    match message {
        Message::MotorState { motor, state } => vec![motor.ordinal(), *state as u8],
        Message::Telemetry(t) => vec![t.motor1 as u8, t.motor2 as u8, t.battery, t.distance_cm],
        Message::CameraControl { on } => vec![u8::from(*on)],
        Message::CameraChunk(image) => image.clone(),
        Message::MotorControl(pair) => vec![pair.motor1 as u8, pair.motor2 as u8],
        Message::MoveControl(cmd) => vec![cmd.ordinal()],
        Message::BatteryLevel(level) => vec![*level],
        Message::DistanceReading(cm) => vec![*cm],
    }
}

/// Encode a typed message as a complete wire frame
pub fn encode_message(message: &Message) -> Result<Vec<u8>, FrameError> {
    codec::encode(message.message_type(), &payload(message))
}
