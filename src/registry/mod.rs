// src/registry/mod.rs

//! In-memory registry of live script processes.
//!
//! Single source of truth for "is this script running". All mutation
//! funnels through [`ProcessRegistry::insert`] and
//! [`ProcessRegistry::remove`], which is what makes the
//! at-most-one-process-per-id invariant enforceable in one place.
//!
//! The registry does no I/O and takes no locks; it is owned by the
//! supervisor loop, which serializes all lifecycle commands.

use std::collections::HashMap;

use crate::errors::AlreadyRunning;

/// Lifecycle state of a managed script.
///
/// Only `Running` and `Stopped` are visible to observers via status
/// events; `Starting` and `Stopping` are in-flight markers used by the
/// restart protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// A live process tracked by the registry.
///
/// `instance` increases monotonically across every spawn the supervisor
/// performs, so exit events can be matched to the exact process they
/// belong to even when successive processes share a script id.
#[derive(Debug, Clone)]
pub struct ProcessEntry {
    pub pid: u32,
    pub instance: u64,
    pub state: LifecycleState,
}

/// Mapping from script identifier to its live process, if any.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    entries: HashMap<String, ProcessEntry>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&ProcessEntry> {
        self.entries.get(id)
    }

    /// Mutable access, used by `stop` to mark an entry `Stopping`.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ProcessEntry> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Record a live process for `id`.
    ///
    /// Fails with [`AlreadyRunning`] if `id` already has an entry; the
    /// caller must not have spawned a second process in that case.
    pub fn insert(&mut self, id: &str, entry: ProcessEntry) -> Result<(), AlreadyRunning> {
        if self.entries.contains_key(id) {
            return Err(AlreadyRunning(id.to_string()));
        }
        self.entries.insert(id.to_string(), entry);
        Ok(())
    }

    /// Remove the entry for `id`, returning it if present.
    ///
    /// Idempotent: removing an absent id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<ProcessEntry> {
        self.entries.remove(id)
    }

    /// Snapshot of all ids with a live entry.
    pub fn running_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
