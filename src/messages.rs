// Message types shared by the wire protocol, the dispatcher and the display side

use serde::{Deserialize, Serialize};

/// Message identifiers carried in the first byte of every frame
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Unknown = 0,
    MotorState = 1,
    Telemetry = 2,
    CameraControl = 3,
    CameraChunk = 4,
    MotorControl = 5,
    MoveControl = 6,
    BatteryLevel = 7,
    DistanceReading = 8,
}

impl MessageType {
    /// Resolve a raw tag byte, `None` if the tag is not part of the protocol
    pub fn from_u8(tag: u8) -> Option<Self> {
        let ty = match tag {
            0 => Self::Unknown,
            1 => Self::MotorState,
            2 => Self::Telemetry,
            3 => Self::CameraControl,
            4 => Self::CameraChunk,
            5 => Self::MotorControl,
            6 => Self::MoveControl,
            7 => Self::BatteryLevel,
            8 => Self::DistanceReading,
            _ => return None,
        };
        Some(ty)
    }
}

/// One of the two drive motors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motor {
    One,
    Two,
}

impl Motor {
    /// Wire ordinal (0 = motor 1, 1 = motor 2)
    pub fn ordinal(self) -> u8 {
        match self {
            Motor::One => 0,
            Motor::Two => 1,
        }
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Motor::One),
            1 => Some(Motor::Two),
            _ => None,
        }
    }

    /// Human facing number, 1 or 2
    pub fn number(self) -> u8 {
        self.ordinal() + 1
    }
}

/// Drive state of a single motor
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorState {
    #[default]
    Idle = 0,
    Forward = 1,
    Backward = 2,
    Brake = 3,
}

impl MotorState {
    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Forward),
            2 => Some(Self::Backward),
            3 => Some(Self::Brake),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Forward => "Forward",
            Self::Backward => "Backward",
            Self::Brake => "Brake",
        }
    }
}

/// Single-motor directive: "set motor N to state S"
///
/// Ordinals 0..=3 address motor 1, 4..=7 motor 2, in `MotorState` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveCommand {
    motor: Motor,
    state: MotorState,
}

impl MoveCommand {
    pub fn new(motor: Motor, state: MotorState) -> Self {
        Self { motor, state }
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        let motor = Motor::from_ordinal(value / 4)?;
        let state = MotorState::from_ordinal(value % 4)?;
        Some(Self { motor, state })
    }

    pub fn ordinal(self) -> u8 {
        self.motor.ordinal() * 4 + self.state as u8
    }

    pub fn motor(self) -> Motor {
        self.motor
    }

    pub fn state(self) -> MotorState {
        self.state
    }
}

/// What the front end believes both motors are doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MotorPairState {
    pub motor1: MotorState,
    pub motor2: MotorState,
}

impl MotorPairState {
    pub fn new(motor1: MotorState, motor2: MotorState) -> Self {
        Self { motor1, motor2 }
    }

    pub fn get(&self, motor: Motor) -> MotorState {
        match motor {
            Motor::One => self.motor1,
            Motor::Two => self.motor2,
        }
    }

    /// Copy with one motor replaced
    pub fn with(self, motor: Motor, state: MotorState) -> Self {
        match motor {
            Motor::One => Self { motor1: state, ..self },
            Motor::Two => Self { motor2: state, ..self },
        }
    }

    /// Both motors in `state`
    pub fn both(&self, state: MotorState) -> bool {
        self.motor1 == state && self.motor2 == state
    }
}

/// Status snapshot reported by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub motor1: MotorState,
    pub motor2: MotorState,
    /// Raw level, 0..=255
    pub battery: u8,
    pub distance_cm: u8,
}

/// A decoded, typed protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    MotorState { motor: Motor, state: MotorState },
    Telemetry(TelemetrySample),
    CameraControl { on: bool },
    /// A complete still image (JPEG from the vehicle camera)
    CameraChunk(Vec<u8>),
    MotorControl(MotorPairState),
    MoveControl(MoveCommand),
    BatteryLevel(u8),
    DistanceReading(u8),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::MotorState { .. } => MessageType::MotorState,
            Message::Telemetry(_) => MessageType::Telemetry,
            Message::CameraControl { .. } => MessageType::CameraControl,
            Message::CameraChunk(_) => MessageType::CameraChunk,
            Message::MotorControl(_) => MessageType::MotorControl,
            Message::MoveControl(_) => MessageType::MoveControl,
            Message::BatteryLevel(_) => MessageType::BatteryLevel,
            Message::DistanceReading(_) => MessageType::DistanceReading,
        }
    }
}
