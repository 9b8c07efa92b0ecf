// src/lib.rs

pub mod buffer;
pub mod checks;
pub mod cli;
pub mod discover;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod id;
pub mod jobs;
pub mod logging;
pub mod report;

use std::io::IsTerminal;

use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::engine::{Capacity, Event, Runtime, Scheduler};
use crate::errors::{Result, SweepError};
use crate::exec::RealExecutorBackend;
use crate::report::ConsoleReporter;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - terraform directory discovery
/// - one job per directory, each running the check pipeline
/// - capacity resolution
/// - executor + Ctrl-C handling
/// - the runtime event loop
///
/// Returns `Err(SweepError::JobsFailed)` when any job ends failed.
pub async fn run(args: CliArgs) -> Result<()> {
    let dirs = discover::find_terraform_directories(&args.root)?;
    if dirs.is_empty() {
        info!(root = %args.root.display(), "no terraform directories found");
        return Ok(());
    }

    let specs: Vec<_> = dirs
        .iter()
        .map(|dir| checks::terraform_job(dir, args.tflint_config.as_deref()))
        .collect();

    let capacity = resolve_capacity(args.max_in_parallel);

    // Runtime event channel.
    let (event_tx, event_rx) = mpsc::channel::<Event>(64);

    // Body executor (real implementation in production).
    let executor = RealExecutorBackend::new(event_tx.clone());

    // Ctrl-C terminates the run without waiting for in-flight checks.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(Event::Shutdown).await;
        });
    }

    let core = Scheduler::new(specs, capacity);
    let mut runtime = Runtime::new(core, event_rx, executor, Box::new(ConsoleReporter));

    let summary = runtime.run().await?;
    if summary.jobs_failed > 0 {
        return Err(SweepError::JobsFailed(summary.jobs_failed));
    }
    Ok(())
}

/// Decide the admission capacity for this invocation.
///
/// An explicit flag wins. Otherwise every directory may run at once when
/// stdout is a terminal; when output goes to a pipe or file, directories run
/// one at a time so the log reads as one sequential report.
fn resolve_capacity(flag: Option<usize>) -> Capacity {
    match flag {
        Some(n) => Capacity::Bounded(n),
        None if std::io::stdout().is_terminal() => Capacity::Unbounded,
        None => Capacity::Bounded(1),
    }
}
