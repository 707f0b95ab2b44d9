// Outbound control path: input events -> reconciler -> dispatcher -> frames
//
// Provides:
// - Command dispatcher (sole writer of the motor pair state)
// - Input reconciler (press/release state machine, optional release watchdog)

pub mod dispatcher;
pub mod reconciler;

pub use dispatcher::{DispatchError, Dispatcher, FrameSink, TransportError};
pub use reconciler::{Action, Command, Direction, InputEvent, Reconciler, Source, step};
