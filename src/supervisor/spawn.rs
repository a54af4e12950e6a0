// src/supervisor/spawn.rs

use std::io;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::broadcast::Broadcaster;
use crate::config::ScriptConfig;
use crate::store::StoreHandle;
use crate::supervisor::runtime::SupervisorEvent;

/// Read buffer size for child output streams. Chunks are forwarded as
/// they arrive, not re-split into lines.
const CHUNK_SIZE: usize = 8192;

/// Spawn the script's process: `<venv>/bin/<runtime> -u <script>` with
/// the working directory as cwd.
///
/// `-u` keeps the interpreter's output unbuffered so observers see it
/// as it is produced. Stdout and stderr are piped; the caller wires
/// them up via [`wire_process`].
pub fn spawn_script(cfg: &ScriptConfig) -> io::Result<Child> {
    let mut cmd = Command::new(cfg.interpreter_path());
    cmd.arg("-u")
        .arg(&cfg.script)
        .current_dir(&cfg.working_directory)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd.spawn()
}

/// Attach output capture and the exit waiter to a freshly spawned
/// process.
///
/// Fire-and-forget: three background tasks are spawned. The stdout and
/// stderr readers forward each chunk verbatim (stderr tagged
/// `[STDERR] `) to the store and then the broadcaster, preserving
/// per-stream order. The waiter owns the child, waits for it to exit
/// *and* for both readers to drain, then reports exactly one
/// `ProcessExited` event carrying the instance number so the supervisor
/// can tell which process it was. Draining first means the termination
/// log can never precede the script's own final output.
pub fn wire_process(
    id: &str,
    instance: u64,
    mut child: Child,
    store: StoreHandle,
    broadcaster: Broadcaster,
    events_tx: mpsc::Sender<SupervisorEvent>,
) {
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_chunk_reader(
            id.to_string(),
            stdout,
            None,
            store.clone(),
            broadcaster.clone(),
        ));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_chunk_reader(
            id.to_string(),
            stderr,
            Some("[STDERR] "),
            store.clone(),
            broadcaster.clone(),
        ));
    }

    let id = id.to_string();
    tokio::spawn(async move {
        let code = match child.wait().await {
            Ok(status) => status.code(),
            Err(err) => {
                warn!(script = %id, error = %err, "waiting on child process failed");
                None
            }
        };

        // Readers end at pipe EOF, shortly after the exit.
        for reader in readers {
            let _ = reader.await;
        }

        let sent = events_tx
            .send(SupervisorEvent::ProcessExited { id: id.clone(), instance, code })
            .await;
        if sent.is_err() {
            debug!(script = %id, "supervisor gone; dropping exit event");
        }
    });
}

fn spawn_chunk_reader<R>(
    id: String,
    mut stream: R,
    prefix: Option<&'static str>,
    store: StoreHandle,
    broadcaster: Broadcaster,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = String::from_utf8_lossy(&buf[..n]);
                    let message = match prefix {
                        Some(prefix) => format!("{prefix}{chunk}"),
                        None => chunk.into_owned(),
                    };
                    // Persist first, then broadcast; the store handle
                    // never blocks this task.
                    store.append(&id, &message);
                    broadcaster.publish_log(&id, &message);
                }
                Err(err) => {
                    warn!(script = %id, error = %err, "reading child output failed");
                    break;
                }
            }
        }
        debug!(script = %id, "output reader ended");
    })
}

/// Ask the process to shut itself down (SIGINT), as opposed to a
/// forced kill. Termination is observed asynchronously via the exit
/// waiter; there is no escalation if the process ignores the signal.
#[cfg(unix)]
pub fn send_interrupt(pid: u32) -> io::Result<()> {
    // tokio's Child only exposes SIGKILL, so go through libc.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn send_interrupt(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "graceful interrupt is only supported on unix",
    ))
}
