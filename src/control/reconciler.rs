//! Input reconciler
//!
//! Merges overlapping press/release events from keys and touch controls into
//! motor commands. Every decision is a function of the last transmitted
//! `MotorPairState` and the event, see [`step`].
//!
//! Releases are guarded: a release only idles a motor if that motor is still
//! doing what the released input asked for. A release that arrives after a
//! newer command (brake pressed mid-hold, another key taking over) is a no-op.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::dispatcher::{DispatchError, Dispatcher, FrameSink};
use crate::messages::{Motor, MotorPairState, MotorState, MoveCommand};

/// Where an input came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Key,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl From<Direction> for MotorState {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => MotorState::Forward,
            Direction::Backward => MotorState::Backward,
        }
    }
}

/// A discrete press or release from an input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// Drive one motor
    Motor {
        source: Source,
        motor: Motor,
        direction: Direction,
        action: Action,
    },
    /// Drive both motors in lockstep
    Both {
        source: Source,
        direction: Direction,
        action: Action,
    },
    Brake { source: Source, action: Action },
}

impl InputEvent {
    pub fn action(&self) -> Action {
        match *self {
            InputEvent::Motor { action, .. }
            | InputEvent::Both { action, .. }
            | InputEvent::Brake { action, .. } => action,
        }
    }

    /// Same input with a different action
    pub fn with_action(self, action: Action) -> Self {
        match self {
            InputEvent::Motor {
                source,
                motor,
                direction,
                ..
            } => InputEvent::Motor {
                source,
                motor,
                direction,
                action,
            },
            InputEvent::Both {
                source, direction, ..
            } => InputEvent::Both {
                source,
                direction,
                action,
            },
            InputEvent::Brake { source, .. } => InputEvent::Brake { source, action },
        }
    }
}

/// A command the reconciler asks the dispatcher to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `motor-control`: both motors at once
    Motors(MotorState, MotorState),
    /// `move-control`: one motor
    Move(MoveCommand),
}

impl Command {
    /// State after this command is applied to `state`
    pub fn apply(self, state: MotorPairState) -> MotorPairState {
        match self {
            Command::Motors(m1, m2) => MotorPairState::new(m1, m2),
            Command::Move(cmd) => state.with(cmd.motor(), cmd.state()),
        }
    }
}

/// Transition table: `(state, event) -> (next state, emitted command)`
pub fn step(state: MotorPairState, event: &InputEvent) -> (MotorPairState, Option<Command>) {
    use Action::*;

    let command = match *event {
        InputEvent::Motor {
            motor,
            direction,
            action: Press,
            ..
        } => Some(Command::Move(MoveCommand::new(motor, direction.into()))),

        InputEvent::Motor {
            motor,
            direction,
            action: Release,
            ..
        } if state.get(motor) == MotorState::from(direction) => {
            Some(Command::Move(MoveCommand::new(motor, MotorState::Idle)))
        }

        InputEvent::Both {
            direction,
            action: Press,
            ..
        } => Some(Command::Motors(direction.into(), direction.into())),

        // Partial match means a more specific command is newer: leave it
        InputEvent::Both {
            direction,
            action: Release,
            ..
        } if state.both(direction.into()) => {
            Some(Command::Motors(MotorState::Idle, MotorState::Idle))
        }

        InputEvent::Brake { action: Press, .. } => {
            Some(Command::Motors(MotorState::Brake, MotorState::Brake))
        }

        // Key brake is latched until another input replaces it
        InputEvent::Brake {
            source: Source::Touch,
            action: Release,
        } if state.both(MotorState::Brake) => {
            Some(Command::Motors(MotorState::Idle, MotorState::Idle))
        }

        _ => None,
    };

    let next = command.map_or(state, |cmd| cmd.apply(state));
    (next, command)
}

/// Held inputs and when they were last reinforced
#[derive(Debug)]
struct Watchdog {
    timeout: Duration,
    held: HashMap<InputEvent, Instant>,
}

impl Watchdog {
    fn observe(&mut self, event: &InputEvent, now: Instant) {
        let key = event.with_action(Action::Press);
        match event.action() {
            Action::Press => {
                self.held.insert(key, now);
            }
            Action::Release => {
                self.held.remove(&key);
            }
        }
    }

    /// Remove and return releases for every hold older than the timeout
    fn expire(&mut self, now: Instant) -> Vec<InputEvent> {
        let timeout = self.timeout;
        let mut expired: Vec<(InputEvent, Instant)> = self
            .held
            .iter()
            .filter(|(_, at)| now.saturating_duration_since(**at) > timeout)
            .map(|(event, at)| (*event, *at))
            .collect();
        // oldest first, so the newest hold decides the final state
        expired.sort_by_key(|(_, at)| *at);

        expired
            .into_iter()
            .map(|(event, _)| {
                self.held.remove(&event);
                event.with_action(Action::Release)
            })
            .collect()
    }
}

pub struct Reconciler<S> {
    dispatcher: Dispatcher<S>,
    watchdog: Option<Watchdog>,
}

impl<S: FrameSink> Reconciler<S> {
    pub fn new(dispatcher: Dispatcher<S>) -> Self {
        Self {
            dispatcher,
            watchdog: None,
        }
    }

    /// Synthesize releases for holds not reinforced within `timeout`
    ///
    /// Off by default: without it a lost release leaves the motor running.
    pub fn with_release_timeout(mut self, timeout: Duration) -> Self {
        info!("Release watchdog enabled ({}ms)", timeout.as_millis());
        self.watchdog = Some(Watchdog {
            timeout,
            held: HashMap::new(),
        });
        self
    }

    pub fn state(&self) -> MotorPairState {
        self.dispatcher.state()
    }

    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<S> {
        &mut self.dispatcher
    }

    /// Process one input event
    ///
    /// Returns the new motor state if a command was sent.
    pub fn handle(&mut self, event: InputEvent) -> Result<Option<MotorPairState>, DispatchError> {
        self.handle_at(event, Instant::now())
    }

    pub fn handle_at(
        &mut self,
        event: InputEvent,
        now: Instant,
    ) -> Result<Option<MotorPairState>, DispatchError> {
        if let Some(watchdog) = self.watchdog.as_mut() {
            watchdog.observe(&event, now);
        }
        self.apply(event)
    }

    /// Release expired holds; returns the state after the last command sent
    pub fn tick(&mut self, now: Instant) -> Result<Option<MotorPairState>, DispatchError> {
        let expired = match self.watchdog.as_mut() {
            Some(watchdog) => watchdog.expire(now),
            None => return Ok(None),
        };

        let mut last = None;
        for event in expired {
            warn!("No reinforcement for {:?}, releasing", event);
            if let Some(state) = self.apply(event)? {
                last = Some(state);
            }
        }
        Ok(last)
    }

    fn apply(&mut self, event: InputEvent) -> Result<Option<MotorPairState>, DispatchError> {
        let (_, command) = step(self.dispatcher.state(), &event);
        let Some(command) = command else {
            debug!("{:?} superseded by {:?}, nothing to send", event, self.state());
            return Ok(None);
        };

        let state = match command {
            Command::Motors(m1, m2) => self.dispatcher.send_motor_control(m1, m2)?,
            Command::Move(cmd) => self.dispatcher.send_move_control(cmd)?,
        };
        Ok(Some(state))
    }
}
