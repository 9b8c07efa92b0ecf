// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::core::Scheduler;
use crate::engine::{CoreCommand, CoreStep, Event};
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::report::Reporter;

/// Final aggregate of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub jobs_done: usize,
    pub jobs_failed: usize,
}

/// Drives the [`Scheduler`] in response to [`Event`]s and delegates body
/// execution to an [`ExecutorBackend`].
///
/// This is a pure IO shell around the reducer: receive an event, step the
/// core, notify the reporter, execute the returned commands. Follow-up events
/// produced by a step are drained from a local queue before the channel is
/// read again, so the loop never blocks on sending to itself.
pub struct Runtime<E: ExecutorBackend> {
    core: Scheduler,
    event_rx: mpsc::Receiver<Event>,
    executor: E,
    reporter: Box<dyn Reporter>,
    queued: VecDeque<Event>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: Scheduler,
        event_rx: mpsc::Receiver<Event>,
        executor: E,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reporter,
            queued: VecDeque::new(),
        }
    }

    /// Read-only view of the scheduler, also valid after the run finishes.
    pub fn core(&self) -> &Scheduler {
        &self.core
    }

    /// Main event loop.
    ///
    /// - Admits the initial batch of jobs.
    /// - Consumes events (queued follow-ups first, then the channel).
    /// - Feeds each event into the reducer, reports it, and executes the
    ///   resulting commands.
    /// - Returns the aggregate once the reducer ends the run.
    pub async fn run(&mut self) -> Result<RunSummary> {
        info!(
            jobs = self.core.jobs().len(),
            capacity = self.core.capacity(),
            "run started"
        );

        let step = self.core.start();
        let mut keep_running = self.apply(step).await?;

        while keep_running {
            let event = match self.next_event().await {
                Some(e) => e,
                None => {
                    info!("event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(&event);
            self.reporter.on_event(&event, &self.core);
            keep_running = self.apply(step).await?;
        }

        let summary = RunSummary {
            jobs_done: self.core.jobs_done(),
            jobs_failed: self.core.jobs_failed(),
        };
        info!(
            done = summary.jobs_done,
            failed = summary.jobs_failed,
            "run finished"
        );
        Ok(summary)
    }

    async fn next_event(&mut self) -> Option<Event> {
        if let Some(event) = self.queued.pop_front() {
            return Some(event);
        }
        self.event_rx.recv().await
    }

    /// Execute a step's commands and queue its follow-up events.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            match command {
                CoreCommand::RunBody(run) => self.executor.run_body(run).await?,
            }
        }
        self.queued.extend(step.feedback);
        Ok(step.keep_running)
    }
}
