// Single-threaded event loop: WebSocket in/out, keyboard input, watchdog tick
// Note: everything that touches the session runs on this one loop. The writer
// task only drains already-encoded frames onto the socket.

use std::io::{self, Write};
use std::time::Instant;

use crossterm::{
    event::{
        Event, EventStream, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info, warn};

use crate::config::{Config, FALLBACK_RELEASE_TIMEOUT, TICK};
use crate::control::{Dispatcher, Reconciler};
use crate::display::ConsoleDisplay;
use crate::input::{self, KeyAction};
use crate::session::Session;
use crate::telemetry::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Puts the terminal into raw mode for the lifetime of the guard
struct TerminalGuard {
    enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        // Key release events need the kitty keyboard protocol
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        Ok(Self { enhanced })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        println!();
    }
}

pub async fn run(config: Config) -> Result<(), BoxError> {
    let mut display = ConsoleDisplay::new(io::stdout(), config.output);
    if let Some(path) = &config.frame_path {
        info!("Writing camera frames to {}", path.display());
        display = display.with_frame_path(path.clone());
    }

    let terminal = TerminalGuard::enter()?;
    let release_timeout = match (config.release_timeout(), terminal.enhanced) {
        (Some(timeout), _) => Some(timeout),
        (None, true) => None,
        (None, false) => {
            warn!(
                "Terminal does not report key releases, idling after {}ms without key repeat",
                FALLBACK_RELEASE_TIMEOUT.as_millis()
            );
            Some(FALLBACK_RELEASE_TIMEOUT)
        }
    };

    let (frame_tx, frame_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let mut reconciler = Reconciler::new(Dispatcher::new(frame_tx));
    if let Some(timeout) = release_timeout {
        reconciler = reconciler.with_release_timeout(timeout);
    }
    let mut session = Session::new(reconciler, display);

    let url = config.ws_url();
    info!("Connecting to {}...", url);
    session.on_connecting();

    let result = drive(&url, session, frame_rx).await;
    drop(terminal);
    result
}

async fn drive<D: Display>(
    url: &str,
    mut session: Session<mpsc::UnboundedSender<Vec<u8>>, D>,
    mut frame_rx: mpsc::UnboundedReceiver<Vec<u8>>,
) -> Result<(), BoxError> {
    let (ws, _) = match connect_async(url).await {
        Ok(conn) => conn,
        Err(e) => {
            session.on_error(&e.to_string());
            return Err(e.into());
        }
    };
    session.on_open();
    info!("{}", input::HELP);

    let (mut ws_tx, mut ws_rx) = ws.split();

    // Frames leave in the order the loop dispatched them
    let writer = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            if let Err(e) = ws_tx.send(WsMessage::Binary(frame)).await {
                warn!("WebSocket send failed: {}", e);
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let mut keys = EventStream::new();
    let mut tick = interval(TICK);

    loop {
        tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(WsMessage::Binary(bytes))) => session.on_binary(&bytes),
                Some(Ok(WsMessage::Text(text))) => session.on_text(&text),
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!("Close frame: {:?}", frame);
                    session.on_close();
                    break;
                }
                Some(Ok(_)) => {} // ping/pong handled by tungstenite
                Some(Err(e)) => {
                    session.on_error(&e.to_string());
                    break;
                }
                None => {
                    session.on_close();
                    break;
                }
            },
            key = keys.next() => match key {
                Some(Ok(Event::Key(key))) => match input::translate(key) {
                    Some(KeyAction::Input(event)) => session.on_input(event),
                    Some(KeyAction::ToggleCamera) => {
                        session.toggle_camera();
                    }
                    Some(KeyAction::Quit) => {
                        info!("Quit requested");
                        session.stop_motors();
                        session.on_close();
                        break;
                    }
                    None => {}
                },
                Some(Ok(_)) => {}
                Some(Err(e)) => warn!("Input error: {}", e),
                None => break,
            },
            _ = tick.tick() => session.on_tick(Instant::now()),
        }
    }

    // Dropping the session drops the last sender; the writer drains what is
    // queued, closes the socket and exits.
    drop(session);
    if let Err(e) = writer.await {
        warn!("Writer task failed: {}", e);
    }
    io::stdout().flush()?;
    Ok(())
}
