// Endpoints, timing and command line configuration
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

// WebSocket endpoint path on the serving host
pub const WS_PATH: &str = "/ws";

pub const DEFAULT_HOST: &str = "127.0.0.1:8080";

// Watchdog tick period
pub const TICK: Duration = Duration::from_millis(50);

// Release timeout used when the terminal cannot report key releases.
// Longer than the usual key repeat delay so a held key keeps reinforcing.
pub const FALLBACK_RELEASE_TIMEOUT: Duration = Duration::from_millis(750);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single status line, refreshed in place
    Text,
    /// One JSON object per display update
    Json,
}

/// Teleoperation front end for a two-motor rover
#[derive(Debug, Clone, Parser)]
#[command(name = "rover-teleop", version)]
pub struct Config {
    /// Host (and optional port) serving the WebSocket endpoint
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Use a secure WebSocket (wss://)
    #[arg(long)]
    pub secure: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Write the latest camera image to this file
    #[arg(long)]
    pub frame_path: Option<PathBuf>,

    /// Idle a motor when its input is not reinforced for this long
    #[arg(long)]
    pub release_timeout_ms: Option<u64>,
}

impl Config {
    pub fn ws_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.host, WS_PATH)
    }

    pub fn release_timeout(&self) -> Option<Duration> {
        self.release_timeout_ms.map(Duration::from_millis)
    }
}
