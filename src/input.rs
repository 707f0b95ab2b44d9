// Keyboard teleop: Q/A motor 1, E/D motor 2, W/S both, Space brake, C camera, Esc quit
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::control::{Action, Direction, InputEvent, Source};
use crate::messages::Motor;

/// What a key means to the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Input(InputEvent),
    ToggleCamera,
    Quit,
}

pub const HELP: &str =
    "Controls: Q/A=M1 fwd/back, E/D=M2 fwd/back, W/S=both fwd/back, Space=brake, C=camera, Esc=quit";

/// Translate a terminal key event, `None` for keys without a binding
pub fn translate(key: KeyEvent) -> Option<KeyAction> {
    // Repeat counts as a press: it reinforces the hold
    let action = match key.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => Action::Press,
        KeyEventKind::Release => Action::Release,
    };

    let motor = |motor, direction| InputEvent::Motor {
        source: Source::Key,
        motor,
        direction,
        action,
    };
    let both = |direction| InputEvent::Both {
        source: Source::Key,
        direction,
        action,
    };

    let event = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return (action == Action::Press).then_some(KeyAction::Quit);
        }
        KeyCode::Esc => return (action == Action::Press).then_some(KeyAction::Quit),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'q' => motor(Motor::One, Direction::Forward),
            'a' => motor(Motor::One, Direction::Backward),
            'e' => motor(Motor::Two, Direction::Forward),
            'd' => motor(Motor::Two, Direction::Backward),
            'w' => both(Direction::Forward),
            's' => both(Direction::Backward),
            ' ' => InputEvent::Brake {
                source: Source::Key,
                action,
            },
            'c' if key.kind == KeyEventKind::Press => return Some(KeyAction::ToggleCamera),
            _ => return None,
        },
        _ => return None,
    };

    Some(KeyAction::Input(event))
}
