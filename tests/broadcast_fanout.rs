use std::error::Error;
use std::time::Duration;

use scriptherd::broadcast::{Broadcaster, Event, ScriptStatus};
use scriptherd::store::{MemoryLogStore, spawn_store};
use tokio::sync::mpsc;
use tokio::time::timeout;

type TestResult = Result<(), Box<dyn Error>>;

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Result<Event, Box<dyn Error>> {
    Ok(timeout(Duration::from_secs(5), rx.recv())
        .await?
        .ok_or("observer channel closed")?)
}

#[tokio::test]
async fn log_events_reach_all_observers_in_order() -> TestResult {
    let broadcaster = Broadcaster::new(spawn_store(MemoryLogStore::new()), 200);

    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    broadcaster.attach(tx_a);
    broadcaster.attach(tx_b);

    broadcaster.publish_log("s", "X");
    broadcaster.publish_log("s", "Y");

    for rx in [&mut rx_a, &mut rx_b] {
        let first = next_event(rx).await?;
        let second = next_event(rx).await?;
        assert_eq!(
            first,
            Event::Log {
                id: "s".to_string(),
                message: "X".to_string()
            }
        );
        assert_eq!(
            second,
            Event::Log {
                id: "s".to_string(),
                message: "Y".to_string()
            }
        );
    }

    Ok(())
}

#[tokio::test]
async fn disconnected_observer_does_not_break_delivery() -> TestResult {
    let broadcaster = Broadcaster::new(spawn_store(MemoryLogStore::new()), 200);

    let (tx_gone, rx_gone) = mpsc::unbounded_channel();
    let (tx_live, mut rx_live) = mpsc::unbounded_channel();
    broadcaster.attach(tx_gone);
    broadcaster.attach(tx_live);
    assert_eq!(broadcaster.observer_count(), 2);

    drop(rx_gone);
    broadcaster.publish_log("s", "still here");

    let event = next_event(&mut rx_live).await?;
    assert_eq!(
        event,
        Event::Log {
            id: "s".to_string(),
            message: "still here".to_string()
        }
    );

    // The dead observer was pruned during fan-out.
    assert_eq!(broadcaster.observer_count(), 1);

    Ok(())
}

#[tokio::test]
async fn late_joiner_learns_running_scripts_on_attach() -> TestResult {
    let broadcaster = Broadcaster::new(spawn_store(MemoryLogStore::new()), 200);

    let (tx_first, _rx_first) = mpsc::unbounded_channel();
    broadcaster.attach(tx_first);

    broadcaster.publish_status("a", ScriptStatus::Running);
    broadcaster.publish_status("b", ScriptStatus::Running);
    broadcaster.publish_status("b", ScriptStatus::Stopped);

    let (tx_late, mut rx_late) = mpsc::unbounded_channel();
    broadcaster.attach(tx_late);

    // Exactly the still-running scripts are reported, nothing else.
    let event = next_event(&mut rx_late).await?;
    assert_eq!(
        event,
        Event::Status {
            id: "a".to_string(),
            status: ScriptStatus::Running
        }
    );
    assert!(timeout(Duration::from_millis(200), rx_late.recv()).await.is_err());

    Ok(())
}

#[tokio::test]
async fn detach_stops_delivery() -> TestResult {
    let broadcaster = Broadcaster::new(spawn_store(MemoryLogStore::new()), 200);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let observer = broadcaster.attach(tx);
    broadcaster.detach(observer);

    broadcaster.publish_log("s", "X");
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    assert_eq!(broadcaster.observer_count(), 0);

    Ok(())
}
