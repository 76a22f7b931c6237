//! Terminal front end for the dialogue panel

use std::io::{BufRead, Write};
use std::time::Duration;

use hearth_core::presentation::{Color, Presentation};
use hearth_core::scheduler::{PlayerAction, TurnStatus};
use tokio::sync::{mpsc, watch};

/// Prints lines as they arrive; nothing is ever left typing
#[derive(Debug, Default)]
pub struct ConsolePresentation {
    color: bool,
}

impl ConsolePresentation {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.color {
            format!("\x1b[38;2;{};{};{}m{}\x1b[0m", color.r, color.g, color.b, text)
        } else {
            text.to_string()
        }
    }
}

impl Presentation for ConsolePresentation {
    fn is_typing(&self) -> bool {
        false
    }

    fn has_queued_lines(&self) -> bool {
        false
    }

    fn show_next_line(&mut self) {}

    fn show_line(&mut self, speaker: &str, color: Color, text: &str) {
        if text.is_empty() {
            return;
        }
        println!("{}: {}", self.paint(color, speaker), text);
    }

    fn open_panel(&mut self, _fade: Duration) {
        println!();
    }

    fn close_panel(&mut self, _fade: Duration) {
        println!("----");
    }

    fn open_player_input(&mut self) {
        print!("> ");
        let _ = std::io::stdout().flush();
    }

    fn close_player_input(&mut self) {}
}

/// Forward stdin lines as player actions: empty lines advance, text answers
///
/// Runs on a plain thread so a pending read never holds up runtime shutdown.
pub fn spawn_stdin_reader(actions: mpsc::Sender<PlayerAction>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            let action = if line.is_empty() {
                PlayerAction::Advance
            } else {
                PlayerAction::Submit(line.to_string())
            };
            if actions.blocking_send(action).is_err() {
                break;
            }
        }
    });
}

/// Advance automatically whenever the scheduler has nothing to wait for
pub fn spawn_auto_advance(
    mut status: watch::Receiver<TurnStatus>,
    actions: mpsc::Sender<PlayerAction>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            if matches!(current, TurnStatus::Pending | TurnStatus::TurnComplete)
                && actions.send(PlayerAction::Advance).await.is_err()
            {
                break;
            }
        }
    })
}
