// src/broadcast.rs

//! Fan-out of log and status events to attached observers.
//!
//! Observers are unbounded channel senders; delivery is
//! fire-and-forget, and an observer whose receiver has gone away is
//! dropped from the set without disturbing the rest. The broadcaster
//! also remembers which scripts are currently running (derived from the
//! status events flowing through it) so that a late-joining observer
//! immediately learns the current state, and it serves per-observer
//! history replay out of the log store.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::store::StoreHandle;

/// Externally visible run state of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    Running,
    Stopped,
}

impl fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStatus::Running => write!(f, "running"),
            ScriptStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Events delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One raw chunk of script output (or a supervisor-generated line
    /// on the script's stream).
    Log { id: String, message: String },
    /// The script's run state changed (or is being reported to a new
    /// observer).
    Status { id: String, status: ScriptStatus },
    /// One-time reply to a history request: prior output, oldest
    /// first, concatenated.
    History { id: String, message: String },
}

/// Identifier of an attached observer.
pub type ObserverId = u64;

#[derive(Debug, Default)]
struct Inner {
    next_id: ObserverId,
    observers: HashMap<ObserverId, mpsc::UnboundedSender<Event>>,
    running: HashSet<String>,
}

/// Shared fan-out hub. Cheap to clone; all clones publish to the same
/// observer set.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    inner: Arc<Mutex<Inner>>,
    store: StoreHandle,
    history_limit: usize,
}

impl Broadcaster {
    pub fn new(store: StoreHandle, history_limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            store,
            history_limit: history_limit.max(1),
        }
    }

    /// Register a new observer and report every currently running
    /// script to it, so late joiners need not poll for state.
    pub fn attach(&self, sender: mpsc::UnboundedSender<Event>) -> ObserverId {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        for script in inner.running.iter() {
            let _ = sender.send(Event::Status {
                id: script.clone(),
                status: ScriptStatus::Running,
            });
        }

        inner.observers.insert(id, sender);
        debug!(observer = id, "observer attached");
        id
    }

    pub fn detach(&self, observer: ObserverId) {
        self.lock().observers.remove(&observer);
        debug!(observer, "observer detached");
    }

    /// Deliver a log chunk to every attached observer.
    pub fn publish_log(&self, id: &str, message: &str) {
        self.fan_out(Event::Log {
            id: id.to_string(),
            message: message.to_string(),
        });
    }

    /// Deliver a status transition to every attached observer.
    pub fn publish_status(&self, id: &str, status: ScriptStatus) {
        {
            let mut inner = self.lock();
            match status {
                ScriptStatus::Running => inner.running.insert(id.to_string()),
                ScriptStatus::Stopped => inner.running.remove(id),
            };
        }
        self.fan_out(Event::Status {
            id: id.to_string(),
            status,
        });
    }

    /// Asynchronously fetch recent history for `script_id` and send it
    /// to the requesting observer only, oldest chunk first.
    ///
    /// The store returns newest-first, so the result is reversed before
    /// concatenation. Runs on its own task and never blocks live
    /// delivery to other observers.
    pub fn replay_history(&self, observer: ObserverId, script_id: &str) {
        let sender = match self.lock().observers.get(&observer) {
            Some(sender) => sender.clone(),
            None => {
                debug!(observer, "history requested by unknown observer");
                return;
            }
        };

        let store = self.store.clone();
        let limit = self.history_limit;
        let script_id = script_id.to_string();

        tokio::spawn(async move {
            match store.query_recent(&script_id, limit).await {
                Ok(mut chunks) => {
                    chunks.reverse();
                    let message = chunks.concat();
                    let _ = sender.send(Event::History {
                        id: script_id,
                        message,
                    });
                }
                Err(err) => {
                    warn!(script = %script_id, error = %err, "history query failed");
                }
            }
        });
    }

    /// Number of currently attached observers (after pruning on last
    /// fan-out).
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    fn fan_out(&self, event: Event) {
        let mut inner = self.lock();
        // A failed send means the observer's receiver is gone; drop it
        // and keep delivering to the rest.
        inner
            .observers
            .retain(|_, sender| sender.send(event.clone()).is_ok());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
