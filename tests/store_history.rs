use std::error::Error;
use std::time::Duration;

use scriptherd::broadcast::{Broadcaster, Event};
use scriptherd::store::{LogStore, MemoryLogStore, SqliteLogStore, spawn_store};
use tokio::sync::mpsc;
use tokio::time::timeout;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn memory_store_returns_newest_first() -> TestResult {
    let mut store = MemoryLogStore::new();
    store.append("s", "A")?;
    store.append("s", "B")?;
    store.append("s", "C")?;

    assert_eq!(store.query_recent("s", 200)?, vec!["C", "B", "A"]);
    assert_eq!(store.query_recent("s", 2)?, vec!["C", "B"]);
    assert!(store.query_recent("other", 200)?.is_empty());

    Ok(())
}

#[test]
fn sqlite_store_returns_newest_first_and_scopes_by_script() -> TestResult {
    let mut store = SqliteLogStore::open_in_memory()?;
    store.append("s", "A")?;
    store.append("other", "X")?;
    store.append("s", "B")?;
    store.append("s", "C")?;

    assert_eq!(store.query_recent("s", 200)?, vec!["C", "B", "A"]);
    assert_eq!(store.query_recent("s", 1)?, vec!["C"]);
    assert_eq!(store.query_recent("other", 200)?, vec!["X"]);

    Ok(())
}

#[test]
fn sqlite_store_survives_reopen() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("logs.db");

    {
        let mut store = SqliteLogStore::open(&path)?;
        store.append("s", "A")?;
        store.append("s", "B")?;
    }

    let mut store = SqliteLogStore::open(&path)?;
    assert_eq!(store.query_recent("s", 200)?, vec!["B", "A"]);

    Ok(())
}

#[tokio::test]
async fn store_task_serves_appends_then_queries_in_order() -> TestResult {
    let handle = spawn_store(MemoryLogStore::new());

    handle.append("s", "A");
    handle.append("s", "B");
    handle.append("s", "C");

    // Requests share one queue, so the query observes all three appends.
    let recent = handle.query_recent("s", 200).await?;
    assert_eq!(recent, vec!["C", "B", "A"]);

    Ok(())
}

#[tokio::test]
async fn history_replay_is_chronological_and_private() -> TestResult {
    let handle = spawn_store(MemoryLogStore::new());
    handle.append("s", "A");
    handle.append("s", "B");
    handle.append("s", "C");

    let broadcaster = Broadcaster::new(handle, 200);

    let (tx_a, mut rx_a) = mpsc::unbounded_channel::<Event>();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel::<Event>();
    let observer_a = broadcaster.attach(tx_a);
    let _observer_b = broadcaster.attach(tx_b);

    broadcaster.replay_history(observer_a, "s");

    // Store returns [C, B, A]; delivery must be oldest-first.
    let event = timeout(Duration::from_secs(5), rx_a.recv())
        .await?
        .ok_or("observer channel closed")?;
    assert_eq!(
        event,
        Event::History {
            id: "s".to_string(),
            message: "ABC".to_string(),
        }
    );

    // Only the requesting observer gets the reply.
    assert!(timeout(Duration::from_millis(200), rx_b.recv()).await.is_err());

    Ok(())
}

#[tokio::test]
async fn history_replay_respects_limit() -> TestResult {
    let handle = spawn_store(MemoryLogStore::new());
    for chunk in ["A", "B", "C", "D"] {
        handle.append("s", chunk);
    }

    let broadcaster = Broadcaster::new(handle, 2);

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let observer = broadcaster.attach(tx);
    broadcaster.replay_history(observer, "s");

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await?
        .ok_or("observer channel closed")?;
    // The two most recent chunks, still oldest-first.
    assert_eq!(
        event,
        Event::History {
            id: "s".to_string(),
            message: "CD".to_string(),
        }
    );

    Ok(())
}
