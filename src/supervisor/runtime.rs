// src/supervisor/runtime.rs

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::broadcast::{Broadcaster, ScriptStatus};
use crate::config::ScriptConfig;
use crate::errors::StartError;
use crate::registry::{LifecycleState, ProcessEntry, ProcessRegistry};
use crate::store::StoreHandle;
use crate::supervisor::spawn;

/// Script identifier, as used throughout the supervisor.
pub type ScriptId = String;

/// Lifecycle commands accepted from the control surface.
///
/// Fire-and-forget: results are observed via log and status events on
/// the script's stream, never as return values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { id: ScriptId },
    Stop { id: ScriptId },
    Restart { id: ScriptId },
}

/// Events consumed by the supervisor loop.
///
/// - the control surface sends `Command`
/// - per-process exit waiters send `ProcessExited`
/// - Ctrl-C handling sends `Shutdown`
#[derive(Debug)]
pub enum SupervisorEvent {
    Command(Command),
    /// The process with this instance number exited (or could not be
    /// waited on). Delivered exactly once per spawned process.
    ProcessExited {
        id: ScriptId,
        instance: u64,
        code: Option<i32>,
    },
    Shutdown,
}

/// The process supervisor: owns the registry and serializes all
/// lifecycle commands through one event loop.
///
/// Serialization is what makes the at-most-one-process-per-id invariant
/// hold: between the `contains` check and the `insert` no other command
/// can run. Output capture and persistence happen on their own tasks
/// and never block this loop.
pub struct Supervisor {
    scripts: BTreeMap<ScriptId, ScriptConfig>,
    registry: ProcessRegistry,
    broadcaster: Broadcaster,
    store: StoreHandle,

    events_rx: mpsc::Receiver<SupervisorEvent>,
    /// Handed to exit waiters so they can report back into the loop.
    events_tx: mpsc::Sender<SupervisorEvent>,

    /// Restart continuations, keyed by script id and scoped to the
    /// instance that was asked to stop. A later, unrelated exit of the
    /// same id must not trigger them.
    pending_restart: HashMap<ScriptId, u64>,

    /// Monotonic counter distinguishing successive processes that share
    /// a script id.
    next_instance: u64,
}

impl Supervisor {
    pub fn new(
        scripts: BTreeMap<ScriptId, ScriptConfig>,
        store: StoreHandle,
        broadcaster: Broadcaster,
        events_rx: mpsc::Receiver<SupervisorEvent>,
        events_tx: mpsc::Sender<SupervisorEvent>,
    ) -> Self {
        Self {
            scripts,
            registry: ProcessRegistry::new(),
            broadcaster,
            store,
            events_rx,
            events_tx,
            pending_restart: HashMap::new(),
            next_instance: 0,
        }
    }

    /// Main event loop. Runs until `Shutdown` or until every sender is
    /// gone.
    pub async fn run(mut self) -> Result<()> {
        info!("supervisor started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "supervisor received event");

            let keep_running = match event {
                SupervisorEvent::Command(cmd) => {
                    self.handle_command(cmd);
                    true
                }
                SupervisorEvent::ProcessExited { id, instance, code } => {
                    self.handle_process_exited(&id, instance, code);
                    true
                }
                SupervisorEvent::Shutdown => {
                    info!("shutdown requested, stopping supervisor");
                    false
                }
            };

            if !keep_running {
                break;
            }
        }

        info!("supervisor exiting");
        Ok(())
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { id } => self.handle_start(&id),
            Command::Stop { id } => self.handle_stop(&id),
            Command::Restart { id } => self.handle_restart(&id),
        }
    }

    /// Start the script, if it has a descriptor and is not already
    /// running. All failure modes surface as log events on the
    /// script's stream; only a successful spawn changes state.
    fn handle_start(&mut self, id: &str) {
        let Some(cfg) = self.scripts.get(id).cloned() else {
            let err = StartError::ConfigurationMissing(id.to_string());
            self.broadcaster.publish_log(id, &format!("[ERROR] {err}\n"));
            return;
        };

        if self.registry.contains(id) {
            self.broadcaster
                .publish_log(id, "[INFO] script is already running\n");
            return;
        }

        let interpreter = cfg.interpreter_path();
        if !interpreter.exists() {
            let err = StartError::EnvironmentMissing(interpreter);
            self.report(id, &format!("[ERROR] {err}\n"));
            return;
        }

        let mut child = match spawn::spawn_script(&cfg) {
            Ok(child) => child,
            Err(err) => {
                let err = StartError::SpawnFailure(err);
                self.report(id, &format!("[FATAL] {err}\n"));
                self.broadcaster.publish_status(id, ScriptStatus::Stopped);
                return;
            }
        };

        let pid = child.id().unwrap_or_default();
        let instance = self.next_instance;
        self.next_instance += 1;

        let entry = ProcessEntry {
            pid,
            instance,
            state: LifecycleState::Running,
        };
        if let Err(err) = self.registry.insert(id, entry) {
            // Cannot happen while commands are serialized through this
            // loop; if it ever does, kill the duplicate immediately.
            warn!(script = %id, error = %err, "registry insert raced; killing duplicate process");
            if let Err(err) = child.start_kill() {
                warn!(script = %id, error = %err, "failed to kill duplicate process");
            }
            return;
        }

        self.report(id, &format!("[INFO] script started (PID: {pid})\n"));
        self.broadcaster.publish_status(id, ScriptStatus::Running);

        // Wire output capture only after the start log and status are
        // out, so no chunk can be observed before them.
        spawn::wire_process(
            id,
            instance,
            child,
            self.store.clone(),
            self.broadcaster.clone(),
            self.events_tx.clone(),
        );
    }

    /// Request graceful termination. Completion is observed via the
    /// exit event; no forced-kill escalation is attempted.
    fn handle_stop(&mut self, id: &str) {
        let pid = match self.registry.get_mut(id) {
            Some(entry) => {
                entry.state = LifecycleState::Stopping;
                entry.pid
            }
            None => {
                self.broadcaster
                    .publish_log(id, "[INFO] script is already stopped\n");
                return;
            }
        };

        self.report(id, "[INFO] stopping script...\n");
        if let Err(err) = spawn::send_interrupt(pid) {
            warn!(script = %id, pid, error = %err, "failed to signal process");
        }
    }

    /// Stop, then start again only once *that* process's exit has been
    /// observed. Starting earlier would allow two live processes for
    /// one id. Not running is equivalent to a plain start.
    fn handle_restart(&mut self, id: &str) {
        match self.registry.get(id) {
            Some(entry) => {
                self.pending_restart.insert(id.to_string(), entry.instance);
                self.handle_stop(id);
            }
            None => self.handle_start(id),
        }
    }

    /// The single authoritative point where "running" becomes
    /// "stopped": report the exit, drop the registry entry, and fire a
    /// matching restart continuation if one is pending.
    fn handle_process_exited(&mut self, id: &str, instance: u64, code: Option<i32>) {
        let current = self.registry.get(id).is_some_and(|e| e.instance == instance);
        if !current {
            debug!(script = %id, instance, "exit event for a process no longer registered; ignoring");
            return;
        }

        let message = match code {
            Some(code) => format!("[INFO] script exited with code {code}\n"),
            None => "[INFO] script terminated by signal\n".to_string(),
        };
        self.report(id, &message);

        self.registry.remove(id);
        self.broadcaster.publish_status(id, ScriptStatus::Stopped);

        if self.pending_restart.get(id) == Some(&instance) {
            self.pending_restart.remove(id);
            info!(script = %id, "restarting after observed exit");
            self.handle_start(id);
        }
    }

    /// Persist a supervisor-generated line on the script's stream, then
    /// broadcast it. Persistence is fire-and-forget.
    fn report(&self, id: &str, message: &str) {
        self.store.append(id, message);
        self.broadcaster.publish_log(id, message);
    }
}
