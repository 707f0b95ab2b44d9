pub mod config;
pub mod control;
pub mod display;
pub mod input;
pub mod messages;
pub mod protocol;
pub mod runtime;
pub mod session;
pub mod telemetry;
