// src/store/mod.rs

//! Durable log storage.
//!
//! The supervisor treats the store as an append/query sink keyed by
//! script identifier: [`LogStore`] is the seam, `sqlite.rs` the real
//! backend, and `task.rs` the async writer task that keeps blocking
//! store calls off the runtime. `query_recent` returns newest-first;
//! callers that need chronological order reverse it themselves.

pub mod sqlite;
pub mod task;

use std::collections::HashMap;

use anyhow::Result;

pub use sqlite::SqliteLogStore;
pub use task::{StoreHandle, spawn_store};

/// Append-only log sink keyed by script identifier.
pub trait LogStore {
    /// Append one raw text chunk to the script's log.
    fn append(&mut self, script_id: &str, text: &str) -> Result<()>;

    /// Return up to `limit` of the most recent chunks for the script,
    /// **newest first**.
    fn query_recent(&mut self, script_id: &str, limit: usize) -> Result<Vec<String>>;
}

/// In-memory store used by tests and `--db`-less experimentation.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    chunks: HashMap<String, Vec<String>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogStore for MemoryLogStore {
    fn append(&mut self, script_id: &str, text: &str) -> Result<()> {
        self.chunks
            .entry(script_id.to_string())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    fn query_recent(&mut self, script_id: &str, limit: usize) -> Result<Vec<String>> {
        let chunks = match self.chunks.get(script_id) {
            Some(chunks) => chunks,
            None => return Ok(Vec::new()),
        };
        Ok(chunks.iter().rev().take(limit).cloned().collect())
    }
}
