// src/control.rs

//! Line-oriented control surface on stdin.
//!
//! The supervisor itself is transport-agnostic: anything that can send
//! [`SupervisorEvent`]s is a control surface. This module provides the
//! built-in one: `start <id>`, `stop <id>`, `restart <id>` and
//! `history <id>`, one command per line. History replies go to the
//! console observer attached in `lib.rs`.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::broadcast::{Broadcaster, ObserverId};
use crate::supervisor::{Command, SupervisorEvent};

/// A parsed control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlLine {
    Lifecycle(Command),
    History { id: String },
}

/// Parse one line of control input. Blank lines yield `None`; anything
/// unrecognized is an error carrying the offending line.
pub fn parse_line(line: &str) -> Result<Option<ControlLine>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let Some(id) = parts.next() else {
        return Err(format!("'{verb}' needs a script id"));
    };
    if parts.next().is_some() {
        return Err(format!("trailing input after '{verb} {id}'"));
    }

    let id = id.to_string();
    match verb {
        "start" => Ok(Some(ControlLine::Lifecycle(Command::Start { id }))),
        "stop" => Ok(Some(ControlLine::Lifecycle(Command::Stop { id }))),
        "restart" => Ok(Some(ControlLine::Lifecycle(Command::Restart { id }))),
        "history" => Ok(Some(ControlLine::History { id })),
        other => Err(format!("unknown command '{other}'")),
    }
}

/// Spawn the stdin listener. Runs until stdin closes or the supervisor
/// channel does.
pub fn spawn_stdin_listener(
    events_tx: mpsc::Sender<SupervisorEvent>,
    broadcaster: Broadcaster,
    console_observer: ObserverId,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            match parse_line(&line) {
                Ok(Some(ControlLine::Lifecycle(cmd))) => {
                    if events_tx.send(SupervisorEvent::Command(cmd)).await.is_err() {
                        break;
                    }
                }
                Ok(Some(ControlLine::History { id })) => {
                    broadcaster.replay_history(console_observer, &id);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(%err, "ignoring control input (expected: start|stop|restart|history <id>)");
                }
            }
        }

        debug!("stdin listener ended");
    });
}
