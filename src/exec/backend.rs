// src/exec/backend.rs

//! Pluggable execution seam for task bodies.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning bodies
//! directly. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation here.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::{BodyRun, Event, TaskOutcome};
use crate::errors::Result;

/// Trait abstracting how task bodies are executed.
///
/// The implementation is free to:
/// - spawn the body on its own tokio task (production)
/// - run it inline and emit the completion immediately (tests)
///
/// Either way, completion must come back as a `TaskDone` event on the
/// runtime channel; `run_body` itself must not wait for the body.
pub trait ExecutorBackend: Send {
    fn run_body(&mut self, run: BodyRun) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Each body runs on its own tokio task with its line buffer as the sink;
/// the completion event is posted back onto the runtime channel when the
/// body's future finishes, however long that takes.
pub struct RealExecutorBackend {
    event_tx: mpsc::Sender<Event>,
}

impl RealExecutorBackend {
    /// Create a backend wired to the given runtime event sender.
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self { event_tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn run_body(&mut self, run: BodyRun) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.event_tx.clone();
        Box::pin(async move {
            tokio::spawn(async move {
                let BodyRun {
                    task,
                    job,
                    body,
                    sink,
                } = run;

                let outcome = match body.run(sink).await {
                    Ok(()) => TaskOutcome::Success,
                    Err(err) => {
                        debug!(task, error = %err, "task body failed");
                        TaskOutcome::Failed(format!("{err:#}"))
                    }
                };

                // On shutdown the loop is gone before in-flight bodies
                // finish; their completions have nowhere to go.
                if tx.send(Event::TaskDone { task, job, outcome }).await.is_err() {
                    debug!(task, "event loop closed before completion could be delivered");
                }
            });
            Ok(())
        })
    }
}
