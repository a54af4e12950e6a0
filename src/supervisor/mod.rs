// src/supervisor/mod.rs

//! Process supervision for scriptherd.
//!
//! This module ties together:
//! - the process registry (at-most-one live process per script id)
//! - child-process spawning and output capture (`spawn.rs`)
//! - the main supervisor event loop that reacts to:
//!   - lifecycle commands (start / stop / restart)
//!   - per-instance process exit events
//!   - shutdown signals

pub mod runtime;
pub mod spawn;

pub use runtime::{Command, ScriptId, Supervisor, SupervisorEvent};
