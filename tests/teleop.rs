// End-to-end checks through the public API: input -> frames, frames -> display

use std::cell::RefCell;
use std::rc::Rc;

use rover_teleop::control::{Action, Direction, FrameSink, InputEvent, Source, TransportError};
use rover_teleop::messages::{Motor, MotorPairState, MotorState};
use rover_teleop::protocol::{FrameError, codec, registry};
use rover_teleop::session::Session;
use rover_teleop::telemetry::{BatteryBand, ConnectionState, Display};

/// Frames shared with the test so they can be inspected after the session takes the sink
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<Vec<u8>>>>);

impl FrameSink for SharedSink {
    fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.0.borrow_mut().push(frame);
        Ok(())
    }
}

#[derive(Default)]
struct Dashboard {
    motors: [Option<MotorState>; 2],
    battery: Option<(u8, BatteryBand)>,
    distance: Option<u8>,
    image: Option<Vec<u8>>,
    connection: Option<ConnectionState>,
}

impl Display for Dashboard {
    fn set_motor_label(&mut self, motor: Motor, state: MotorState) {
        self.motors[motor.ordinal() as usize] = Some(state);
    }

    fn set_battery_percent(&mut self, percent: u8, band: BatteryBand) {
        self.battery = Some((percent, band));
    }

    fn set_distance(&mut self, cm: u8) {
        self.distance = Some(cm);
    }

    fn show_image(&mut self, jpeg: Vec<u8>) {
        self.image = Some(jpeg);
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection = Some(state);
    }
}

fn open_session() -> (Session<SharedSink, Dashboard>, Rc<RefCell<Vec<Vec<u8>>>>) {
    let sink = SharedSink::default();
    let frames = sink.0.clone();
    let mut session = Session::with_sink(sink, Dashboard::default());
    session.on_open();
    (session, frames)
}

fn key_motor(motor: Motor, direction: Direction, action: Action) -> InputEvent {
    InputEvent::Motor {
        source: Source::Key,
        motor,
        direction,
        action,
    }
}

#[test]
fn brake_mid_hold_survives_stale_release() {
    let (mut session, frames) = open_session();

    session.on_input(key_motor(Motor::One, Direction::Forward, Action::Press));
    session.on_input(InputEvent::Brake {
        source: Source::Key,
        action: Action::Press,
    });
    session.on_input(key_motor(Motor::One, Direction::Forward, Action::Release));

    assert_eq!(
        *frames.borrow(),
        vec![vec![6, 1, 0, 1], vec![5, 2, 0, 3, 3]]
    );
    assert_eq!(
        session.motor_state(),
        MotorPairState::new(MotorState::Brake, MotorState::Brake)
    );
    assert_eq!(session.display().motors, [Some(MotorState::Brake); 2]);
}

#[test]
fn combined_release_after_independent_idle() {
    let (mut session, frames) = open_session();
    let both = |action| InputEvent::Both {
        source: Source::Key,
        direction: Direction::Forward,
        action,
    };

    session.on_input(both(Action::Press));
    session.on_input(InputEvent::Motor {
        source: Source::Touch,
        motor: Motor::One,
        direction: Direction::Forward,
        action: Action::Release,
    });
    session.on_input(both(Action::Release));

    // combined forward, independent idle for motor 1, nothing else
    assert_eq!(
        *frames.borrow(),
        vec![vec![5, 2, 0, 1, 1], vec![6, 1, 0, 0]]
    );
    assert_eq!(
        session.motor_state(),
        MotorPairState::new(MotorState::Idle, MotorState::Forward)
    );
}

#[test]
fn telemetry_frame_updates_dashboard() {
    let (mut session, _) = open_session();
    let bytes = codec::encode(
        rover_teleop::messages::MessageType::Telemetry,
        &[1, 2, 128, 50],
    )
    .unwrap();

    session.on_binary(&bytes);

    let dashboard = session.display();
    assert_eq!(
        dashboard.motors,
        [Some(MotorState::Forward), Some(MotorState::Backward)]
    );
    assert_eq!(dashboard.battery, Some((50, BatteryBand::Medium)));
    assert_eq!(dashboard.distance, Some(50));
    assert_eq!(dashboard.connection, Some(ConnectionState::Connected));
}

#[test]
fn camera_frames_replace_each_other() {
    let (mut session, _) = open_session();
    session.on_binary(&[4, 3, 0, 0xFF, 0xD8, 0xFF]);
    session.on_binary(&[4, 2, 0, 0xFF, 0xD9]);

    assert_eq!(session.display().image, Some(vec![0xFF, 0xD9]));
}

#[test]
fn malformed_and_unknown_frames_are_dropped() {
    assert_eq!(codec::decode(&[2, 0]), Err(FrameError::TooShort { len: 2 }));
    assert!(codec::decode(&[200, 1, 0, 7]).is_ok());
    assert_eq!(registry::resolve(&[200, 1, 0, 7]), None);

    let (mut session, frames) = open_session();
    session.on_binary(&[200, 1, 0, 7]);
    session.on_binary(&[2, 9, 0, 1, 2, 3, 4]);
    session.on_binary(&[7, 2, 0, 1, 1]);

    let dashboard = session.display();
    assert_eq!(dashboard.battery, None);
    assert_eq!(dashboard.distance, None);
    assert!(frames.borrow().is_empty());
}
