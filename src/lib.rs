// src/lib.rs

pub mod broadcast;
pub mod cli;
pub mod config;
pub mod control;
pub mod errors;
pub mod logging;
pub mod registry;
pub mod store;
pub mod supervisor;

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::broadcast::{Broadcaster, Event};
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::store::SqliteLogStore;
use crate::supervisor::{Command, Supervisor, SupervisorEvent};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the log store and its writer task
/// - the broadcaster with a console observer
/// - the stdin control listener
/// - Ctrl-C handling
/// - the supervisor event loop
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    // Durable log store behind its writer task.
    let store = store::spawn_store(SqliteLogStore::open(&args.db)?);

    let broadcaster = Broadcaster::new(store.clone(), cfg.config.history_limit);

    // Supervisor event channel.
    let (events_tx, events_rx) = mpsc::channel::<SupervisorEvent>(64);

    // Console observer: prints every outbound event.
    let (observer_tx, mut observer_rx) = mpsc::unbounded_channel::<Event>();
    let console_observer = broadcaster.attach(observer_tx);
    tokio::spawn(async move {
        while let Some(event) = observer_rx.recv().await {
            print_event(&event);
        }
    });

    // Stdin control surface: start/stop/restart/history <id>.
    control::spawn_stdin_listener(events_tx.clone(), broadcaster.clone(), console_observer);

    // Ctrl-C → graceful shutdown.
    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(SupervisorEvent::Shutdown).await;
        });
    }

    // Optionally seed a start for every configured script.
    if args.autostart {
        let ids: Vec<String> = cfg.script.keys().cloned().collect();
        info!(?ids, "autostarting configured scripts");
        for id in ids {
            events_tx
                .send(SupervisorEvent::Command(Command::Start { id }))
                .await?;
        }
    }

    let supervisor = Supervisor::new(
        cfg.script.clone(),
        store,
        broadcaster,
        events_rx,
        events_tx,
    );
    supervisor.run().await
}

/// Render one outbound event on the console.
///
/// Log and history chunks are printed verbatim; they carry their own
/// newlines (or lack thereof).
fn print_event(event: &Event) {
    match event {
        Event::Log { id, message } => print!("[{id}] {message}"),
        Event::Status { id, status } => println!("[{id}] status: {status}"),
        Event::History { id, message } => {
            println!("[{id}] --- history start ---");
            print!("{message}");
            println!("[{id}] --- history end ---");
        }
    }
}

/// Simple dry-run output: print the script table.
fn print_dry_run(cfg: &ConfigFile) {
    println!("scriptherd dry-run");
    println!("  config.history_limit = {}", cfg.config.history_limit);
    println!();

    println!("scripts ({}):", cfg.script.len());
    for (id, script) in cfg.script.iter() {
        println!("  - {id}");
        if !script.name.is_empty() {
            println!("      name: {}", script.name);
        }
        println!("      working_directory: {}", script.working_directory);
        println!("      script: {}", script.script);
        println!("      interpreter: {}", script.interpreter_path().display());
    }

    debug!("dry-run complete (no supervision)");
}
