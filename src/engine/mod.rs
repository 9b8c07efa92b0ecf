// src/engine/mod.rs

//! Orchestration engine for tfsweep.
//!
//! This module ties together:
//! - the tagged-union [`Event`] vocabulary that drives every state change
//! - the pure [`Scheduler`] reducer in [`core`]
//! - the counting [`AdmissionGate`] in [`gate`]
//! - the async IO shell in [`runtime`]
//!
//! All job and task state is mutated by a single serialized loop. Task bodies
//! run on their own tokio tasks and report back by posting a completion event
//! onto the runtime channel; anything arriving with an identifier the loop no
//! longer knows is dropped as a no-op.

use std::fmt;
use std::sync::Arc;

use crate::buffer::LineBuffer;
use crate::id::EntityId;
use crate::jobs::TaskBody;

/// Outcome of one task body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Body reported a failure. The message is kept for logging; the
    /// interesting detail lives in the task's line buffer.
    Failed(String),
}

impl TaskOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failed(_))
    }
}

/// How many jobs may be running at once. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Bounded(usize),
    /// No limit beyond the number of jobs.
    Unbounded,
}

impl Capacity {
    /// Resolve to a concrete slot count for a run over `jobs` jobs.
    pub fn resolve(self, jobs: usize) -> usize {
        match self {
            Capacity::Bounded(n) => n.max(1),
            Capacity::Unbounded => jobs.max(1),
        }
    }
}

/// Events flowing through the runtime loop.
///
/// Every event carries the identifier of the entity it addresses. Events are
/// broadcast to all jobs (and from there to all tasks); only the entity whose
/// id matches reacts, everything else ignores them.
#[derive(Debug, Clone)]
pub enum Event {
    /// A job was admitted and should start running.
    JobInit { job: EntityId },
    /// A task should start executing its body.
    TaskInit { task: EntityId, job: EntityId },
    /// A task body finished.
    TaskDone {
        task: EntityId,
        job: EntityId,
        outcome: TaskOutcome,
    },
    /// A job exhausted its task list.
    JobDone { job: EntityId, failed: bool },
    /// Interrupt: stop the loop without waiting for in-flight bodies.
    Shutdown,
}

/// Request from the reducer that the IO shell start a task body.
#[derive(Clone)]
pub struct BodyRun {
    pub task: EntityId,
    pub job: EntityId,
    pub body: Arc<dyn TaskBody>,
    pub sink: Arc<LineBuffer>,
}

impl fmt::Debug for BodyRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyRun")
            .field("task", &self.task)
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

/// Command produced by the pure reducer, to be executed by the IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Spawn this task body.
    RunBody(BodyRun),
}

/// Decision returned by the reducer after handling a single [`Event`].
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Follow-up events, to be processed before reading from the channel
    /// again.
    pub feedback: Vec<Event>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn running() -> Self {
        Self {
            commands: Vec::new(),
            feedback: Vec::new(),
            keep_running: true,
        }
    }
}

pub mod core;
pub mod gate;
pub mod runtime;

pub use core::Scheduler;
pub use gate::AdmissionGate;
pub use runtime::{RunSummary, Runtime};
