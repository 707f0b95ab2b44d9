// Telemetry sink: inbound messages -> display model
//
// The display model is injected, so nothing here knows how values are
// rendered. The vehicle's own report is authoritative for display, even when
// it disagrees with the last command sent from here.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::messages::{Message, Motor, MotorPairState, MotorState};

/// Connection state shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// Coloring band for the battery gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryBand {
    /// above 60%
    High,
    /// above 20%
    Medium,
    Low,
}

impl BatteryBand {
    pub fn from_percent(percent: u8) -> Self {
        if percent > 60 {
            BatteryBand::High
        } else if percent > 20 {
            BatteryBand::Medium
        } else {
            BatteryBand::Low
        }
    }
}

/// Convert a raw 0..=255 battery level to a rounded percentage
pub fn battery_percent(level: u8) -> u8 {
    // level * 100 / 255 never lands on .5, so half-up and half-even agree
    ((level as u32 * 100 + 127) / 255) as u8
}

/// Capabilities the core needs from whatever renders the dashboard
pub trait Display {
    fn set_motor_label(&mut self, motor: Motor, state: MotorState);
    fn set_battery_percent(&mut self, percent: u8, band: BatteryBand);
    fn set_distance(&mut self, cm: u8);
    /// Replace the shown image; releasing the previous one is up to the display
    fn show_image(&mut self, jpeg: Vec<u8>);
    fn set_connection_state(&mut self, state: ConnectionState);

    fn set_motor_labels(&mut self, pair: MotorPairState) {
        self.set_motor_label(Motor::One, pair.motor1);
        self.set_motor_label(Motor::Two, pair.motor2);
    }
}

/// Applies decoded inbound messages to the display model
pub struct TelemetrySink<D> {
    display: D,
}

impl<D: Display> TelemetrySink<D> {
    pub fn new(display: D) -> Self {
        Self { display }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Apply one message; returns false if it carries nothing to display
    pub fn apply(&mut self, message: Message) -> bool {
        match message {
            Message::Telemetry(sample) => {
                self.display
                    .set_motor_labels(MotorPairState::new(sample.motor1, sample.motor2));
                self.set_battery(sample.battery);
                self.display.set_distance(sample.distance_cm);
            }
            Message::MotorState { motor, state } => self.display.set_motor_label(motor, state),
            Message::BatteryLevel(level) => self.set_battery(level),
            Message::DistanceReading(cm) => self.display.set_distance(cm),
            Message::CameraChunk(jpeg) => self.display.show_image(jpeg),
            other => {
                debug!("No display update for {:?}", other.message_type());
                return false;
            }
        }
        true
    }

    fn set_battery(&mut self, level: u8) {
        let percent = battery_percent(level);
        self.display
            .set_battery_percent(percent, BatteryBand::from_percent(percent));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::messages::TelemetrySample;

    /// Every call the core made, in order
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        MotorLabel(Motor, MotorState),
        Battery(u8, BatteryBand),
        Distance(u8),
        Image(Vec<u8>),
        Connection(ConnectionState),
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingDisplay {
        pub calls: Vec<Call>,
    }

    impl Display for RecordingDisplay {
        fn set_motor_label(&mut self, motor: Motor, state: MotorState) {
            self.calls.push(Call::MotorLabel(motor, state));
        }

        fn set_battery_percent(&mut self, percent: u8, band: BatteryBand) {
            self.calls.push(Call::Battery(percent, band));
        }

        fn set_distance(&mut self, cm: u8) {
            self.calls.push(Call::Distance(cm));
        }

        fn show_image(&mut self, jpeg: Vec<u8>) {
            self.calls.push(Call::Image(jpeg));
        }

        fn set_connection_state(&mut self, state: ConnectionState) {
            self.calls.push(Call::Connection(state));
        }
    }

    #[test]
    fn test_battery_percent() {
        assert_eq!(battery_percent(0), 0);
        assert_eq!(battery_percent(128), 50);
        assert_eq!(battery_percent(255), 100);
        assert_eq!(battery_percent(1), 0); // 0.39
        assert_eq!(battery_percent(2), 1); // 0.78
        for level in 0..=255u8 {
            let expected = (level as f64 / 255.0 * 100.0).round() as u8;
            assert_eq!(battery_percent(level), expected, "level {level}");
        }
    }

    #[test]
    fn test_battery_bands() {
        assert_eq!(BatteryBand::from_percent(100), BatteryBand::High);
        assert_eq!(BatteryBand::from_percent(61), BatteryBand::High);
        assert_eq!(BatteryBand::from_percent(60), BatteryBand::Medium);
        assert_eq!(BatteryBand::from_percent(21), BatteryBand::Medium);
        assert_eq!(BatteryBand::from_percent(20), BatteryBand::Low);
        assert_eq!(BatteryBand::from_percent(0), BatteryBand::Low);
    }

    #[test]
    fn test_telemetry_updates_everything() {
        let mut sink = TelemetrySink::new(RecordingDisplay::default());
        let applied = sink.apply(Message::Telemetry(TelemetrySample {
            motor1: MotorState::Forward,
            motor2: MotorState::Backward,
            battery: 128,
            distance_cm: 50,
        }));

        assert!(applied);
        assert_eq!(
            sink.display().calls,
            vec![
                Call::MotorLabel(Motor::One, MotorState::Forward),
                Call::MotorLabel(Motor::Two, MotorState::Backward),
                Call::Battery(50, BatteryBand::Medium),
                Call::Distance(50),
            ]
        );
    }

    #[test]
    fn test_single_value_messages() {
        let mut sink = TelemetrySink::new(RecordingDisplay::default());
        sink.apply(Message::BatteryLevel(40));
        sink.apply(Message::DistanceReading(7));
        sink.apply(Message::MotorState {
            motor: Motor::Two,
            state: MotorState::Brake,
        });

        assert_eq!(
            sink.display().calls,
            vec![
                Call::Battery(16, BatteryBand::Low),
                Call::Distance(7),
                Call::MotorLabel(Motor::Two, MotorState::Brake),
            ]
        );
    }

    #[test]
    fn test_each_camera_chunk_replaces_the_image() {
        let mut sink = TelemetrySink::new(RecordingDisplay::default());
        sink.apply(Message::CameraChunk(vec![1, 2, 3]));
        sink.apply(Message::CameraChunk(vec![4]));

        assert_eq!(
            sink.display().calls,
            vec![Call::Image(vec![1, 2, 3]), Call::Image(vec![4])]
        );
    }

    #[test]
    fn test_control_messages_are_not_displayed() {
        let mut sink = TelemetrySink::new(RecordingDisplay::default());
        assert!(!sink.apply(Message::CameraControl { on: true }));
        assert!(!sink.apply(Message::MotorControl(MotorPairState::default())));
        assert!(sink.display().calls.is_empty());
    }
}
