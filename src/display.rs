// Headless display models for the terminal front end
//
// Text mode keeps one status line refreshed in place; JSON mode writes one
// object per update so the stream can be piped into other tools.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use crossterm::{
    cursor::MoveToColumn,
    queue,
    terminal::{Clear, ClearType},
};
use serde::Serialize;
use tracing::warn;

use crate::config::OutputFormat;
use crate::messages::{Motor, MotorState};
use crate::telemetry::{BatteryBand, ConnectionState, Display};

/// One display update, as written in JSON mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayUpdate {
    MotorLabel { motor: Motor, state: MotorState },
    Battery { percent: u8, band: BatteryBand },
    Distance { cm: u8 },
    Image { bytes: usize },
    Connection { state: ConnectionState },
}

/// Everything currently on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    pub connection: ConnectionState,
    pub motor1: MotorState,
    pub motor2: MotorState,
    pub battery: Option<(u8, BatteryBand)>,
    pub distance_cm: Option<u8>,
    pub frames: u64,
}

impl Default for DisplaySnapshot {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Connecting,
            motor1: MotorState::Idle,
            motor2: MotorState::Idle,
            battery: None,
            distance_cm: None,
            frames: 0,
        }
    }
}

impl DisplaySnapshot {
    fn apply(&mut self, update: &DisplayUpdate) {
        match *update {
            DisplayUpdate::MotorLabel { motor, state } => match motor {
                Motor::One => self.motor1 = state,
                Motor::Two => self.motor2 = state,
            },
            DisplayUpdate::Battery { percent, band } => self.battery = Some((percent, band)),
            DisplayUpdate::Distance { cm } => self.distance_cm = Some(cm),
            DisplayUpdate::Image { .. } => self.frames += 1,
            DisplayUpdate::Connection { state } => self.connection = state,
        }
    }
}

impl fmt::Display for DisplaySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connection = match self.connection {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Error => "Connection Error",
        };
        write!(
            f,
            "{} | M1: {} | M2: {}",
            connection,
            self.motor1.label(),
            self.motor2.label()
        )?;
        match self.battery {
            Some((percent, band)) => write!(f, " | Battery: {}% ({:?})", percent, band)?,
            None => write!(f, " | Battery: --")?,
        }
        match self.distance_cm {
            Some(cm) => write!(f, " | Distance: {} cm", cm)?,
            None => write!(f, " | Distance: --")?,
        }
        write!(f, " | Frames: {}", self.frames)
    }
}

/// Display model writing to a terminal (or any writer)
pub struct ConsoleDisplay<W: Write> {
    out: W,
    format: OutputFormat,
    snapshot: DisplaySnapshot,
    frame_path: Option<PathBuf>,
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            snapshot: DisplaySnapshot::default(),
            frame_path: None,
        }
    }

    /// Write every received camera image to `path`, replacing the last one
    pub fn with_frame_path(mut self, path: PathBuf) -> Self {
        self.frame_path = Some(path);
        self
    }

    pub fn snapshot(&self) -> &DisplaySnapshot {
        &self.snapshot
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn update(&mut self, update: DisplayUpdate) {
        self.snapshot.apply(&update);
        if let Err(e) = self.render(&update) {
            warn!("Display write failed: {}", e);
        }
    }

    fn render(&mut self, update: &DisplayUpdate) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
                write!(self.out, "{}", self.snapshot)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, update)?;
                // raw mode: explicit carriage return
                write!(self.out, "\r\n")?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write> Display for ConsoleDisplay<W> {
    fn set_motor_label(&mut self, motor: Motor, state: MotorState) {
        self.update(DisplayUpdate::MotorLabel { motor, state });
    }

    fn set_battery_percent(&mut self, percent: u8, band: BatteryBand) {
        self.update(DisplayUpdate::Battery { percent, band });
    }

    fn set_distance(&mut self, cm: u8) {
        self.update(DisplayUpdate::Distance { cm });
    }

    fn show_image(&mut self, jpeg: Vec<u8>) {
        if let Some(path) = &self.frame_path {
            if let Err(e) = std::fs::write(path, &jpeg) {
                warn!("Failed to write frame to {}: {}", path.display(), e);
            }
        }
        self.update(DisplayUpdate::Image { bytes: jpeg.len() });
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        self.update(DisplayUpdate::Connection { state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_lines() {
        let mut display = ConsoleDisplay::new(Vec::new(), OutputFormat::Json);
        display.set_connection_state(ConnectionState::Connected);
        display.set_motor_label(Motor::One, MotorState::Forward);
        display.set_battery_percent(50, BatteryBand::Medium);

        let out = String::from_utf8(display.into_inner()).unwrap();
        let lines: Vec<&str> = out.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            vec![
                r#"{"kind":"connection","state":"connected"}"#,
                r#"{"kind":"motor_label","motor":"one","state":"forward"}"#,
                r#"{"kind":"battery","percent":50,"band":"medium"}"#,
            ]
        );
    }

    #[test]
    fn test_snapshot_tracks_updates() {
        let mut display = ConsoleDisplay::new(Vec::new(), OutputFormat::Text);
        display.set_motor_label(Motor::Two, MotorState::Brake);
        display.set_distance(42);
        display.show_image(vec![0xFF, 0xD8]);
        display.show_image(vec![0xFF, 0xD8]);

        let snapshot = display.snapshot().clone();
        assert_eq!(snapshot.motor2, MotorState::Brake);
        assert_eq!(snapshot.distance_cm, Some(42));
        assert_eq!(snapshot.frames, 2);
        assert_eq!(
            snapshot.to_string(),
            "Connecting | M1: Idle | M2: Brake | Battery: -- | Distance: 42 cm | Frames: 2"
        );

        let out = String::from_utf8_lossy(&display.into_inner()).into_owned();
        assert!(out.ends_with("Frames: 2"));
    }

    #[test]
    fn test_frames_written_to_path() {
        let path = std::env::temp_dir().join(format!("rover-teleop-frame-{}.jpg", std::process::id()));
        let mut display =
            ConsoleDisplay::new(Vec::new(), OutputFormat::Json).with_frame_path(path.clone());

        display.show_image(vec![1, 2, 3]);
        display.show_image(vec![9]);
        assert_eq!(std::fs::read(&path).unwrap(), vec![9]);

        let _ = std::fs::remove_file(&path);
    }
}
