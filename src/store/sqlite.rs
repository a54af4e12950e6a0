// src/store/sqlite.rs

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::store::LogStore;

/// SQLite-backed log store.
///
/// One table, insertion-ordered by the rowid, which is what
/// `query_recent` orders by (a timestamp column is kept for operators
/// poking at the file directly, but rowids don't tie within a second).
pub struct SqliteLogStore {
    conn: Connection,
}

impl SqliteLogStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening log database at {:?}", path))?;
        Self::from_connection(conn)
    }

    /// In-memory database; handy for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory log database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                script_id TEXT NOT NULL,
                message TEXT NOT NULL,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .context("creating logs table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_logs_script_id ON logs (script_id, id)",
            [],
        )
        .context("creating logs index")?;

        Ok(Self { conn })
    }
}

impl LogStore for SqliteLogStore {
    fn append(&mut self, script_id: &str, text: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO logs (script_id, message) VALUES (?1, ?2)",
                params![script_id, text],
            )
            .with_context(|| format!("appending log chunk for script '{}'", script_id))?;
        Ok(())
    }

    fn query_recent(&mut self, script_id: &str, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT message FROM logs
                 WHERE script_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .context("preparing history query")?;

        let rows = stmt
            .query_map(params![script_id, limit as i64], |row| {
                row.get::<_, String>(0)
            })
            .with_context(|| format!("querying log history for script '{}'", script_id))?;

        let mut chunks = Vec::new();
        for row in rows {
            chunks.push(row.context("reading history row")?);
        }
        Ok(chunks)
    }
}
