// src/store/task.rs

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::store::LogStore;

/// Requests served by the store writer task.
#[derive(Debug)]
enum StoreRequest {
    Append {
        script_id: String,
        text: String,
    },
    QueryRecent {
        script_id: String,
        limit: usize,
        reply: oneshot::Sender<anyhow::Result<Vec<String>>>,
    },
}

/// Cloneable handle to the store writer task.
///
/// Appends are fire-and-forget: a storage failure is logged by the
/// writer task and never reaches the caller, so persistence problems
/// cannot block or fail live log delivery.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreRequest>,
}

impl StoreHandle {
    /// Queue one chunk for persistence.
    pub fn append(&self, script_id: &str, text: &str) {
        let sent = self.tx.send(StoreRequest::Append {
            script_id: script_id.to_string(),
            text: text.to_string(),
        });
        if sent.is_err() {
            warn!(script = %script_id, "store task gone; dropping log chunk");
        }
    }

    /// Fetch up to `limit` most recent chunks for `script_id`,
    /// newest first.
    pub async fn query_recent(
        &self,
        script_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreRequest::QueryRecent {
                script_id: script_id.to_string(),
                limit,
                reply,
            })
            .map_err(|_| anyhow::anyhow!("store task gone"))?;
        rx.await.map_err(|_| anyhow::anyhow!("store task dropped the query"))?
    }
}

/// Spawn the background store task and return its handle.
///
/// The store runs on a blocking thread because backends like SQLite do
/// synchronous I/O; requests arrive over an unbounded channel, which
/// preserves per-script append order.
pub fn spawn_store<S>(mut store: S) -> StoreHandle
where
    S: LogStore + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<StoreRequest>();

    tokio::task::spawn_blocking(move || {
        debug!("store task started");
        while let Some(request) = rx.blocking_recv() {
            match request {
                StoreRequest::Append { script_id, text } => {
                    if let Err(err) = store.append(&script_id, &text) {
                        warn!(script = %script_id, error = %err, "log append failed");
                    }
                }
                StoreRequest::QueryRecent {
                    script_id,
                    limit,
                    reply,
                } => {
                    let result = store.query_recent(&script_id, limit);
                    // Requester may have gone away; nothing to do then.
                    let _ = reply.send(result);
                }
            }
        }
        debug!("store task finished (channel closed)");
    });

    StoreHandle { tx }
}
