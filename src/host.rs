//! Terminal host for the settings controller.
//!
//! A reader thread turns crossterm events into messages. Commands returned by
//! the controller run on the blocking pool and send their message back
//! through the same channel, so `update` only ever runs on the host task.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::settings::{Command, SettingsController, SettingsMessage};
use crate::ui;

const INPUT_POLL: Duration = Duration::from_millis(200);

/// Drive `controller` until it asks to quit or the input channel closes.
pub async fn run(terminal: &mut DefaultTerminal, mut controller: SettingsController) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_input_reader(tx.clone());

    let size = terminal.size()?;
    controller.update(SettingsMessage::Resize(size.width, size.height));

    while !controller.should_quit() {
        terminal.draw(|frame| ui::draw_screen(frame, &controller.view()))?;

        let Some(msg) = rx.recv().await else {
            break;
        };
        debug!("Handling {}", msg.name());
        if let Some(cmd) = controller.update(msg) {
            spawn_command(cmd, tx.clone());
        }
    }

    Ok(())
}

fn spawn_command(cmd: Command, tx: mpsc::UnboundedSender<SettingsMessage>) {
    tokio::spawn(async move {
        match tokio::task::spawn_blocking(move || cmd.run()).await {
            Ok(msg) => {
                let _ = tx.send(msg);
            }
            Err(e) => error!("Settings command failed to complete: {e}"),
        }
    });
}

fn spawn_input_reader(tx: mpsc::UnboundedSender<SettingsMessage>) {
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    error!("Failed to poll terminal events: {e}");
                    break;
                }
            }
            match event::read() {
                Ok(event) => {
                    if let Some(msg) = translate(event) {
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to read terminal event: {e}");
                    break;
                }
            }
        }
    });
}

/// Map a terminal event to a controller message. Key releases and repeats
/// are dropped.
pub fn translate(event: Event) -> Option<SettingsMessage> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            Some(SettingsMessage::KeyPress(key.code, key.modifiers))
        }
        Event::Resize(cols, rows) => Some(SettingsMessage::Resize(cols, rows)),
        _ => None,
    }
}
