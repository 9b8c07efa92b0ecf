// src/jobs/task.rs

//! A single unit of work within a job.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::buffer::LineBuffer;
use crate::engine::{BodyRun, CoreCommand, Event, TaskOutcome};
use crate::id::{EntityId, IdAllocator};
use crate::jobs::Status;

/// Future type returned by task bodies.
pub type BodyFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// The work a task performs, opaque to the orchestrator.
///
/// A body receives the task's line buffer as its output sink and reports
/// success or failure through its result. The orchestrator never interprets
/// what the body writes; it only buffers and exposes it.
pub trait TaskBody: Send + Sync {
    fn run(&self, sink: Arc<LineBuffer>) -> BodyFuture;
}

/// Plain closures work as bodies; handy in tests.
impl<F> TaskBody for F
where
    F: Fn(Arc<LineBuffer>) -> BodyFuture + Send + Sync,
{
    fn run(&self, sink: Arc<LineBuffer>) -> BodyFuture {
        self(sink)
    }
}

/// A named body, as consumed from the configuration surface.
pub struct TaskSpec {
    pub name: String,
    pub body: Arc<dyn TaskBody>,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, body: Arc<dyn TaskBody>) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One sequential unit of work within a job.
///
/// State machine: Pending → Running on a matching init event, then
/// Succeeded or Failed on a matching done event. Events addressed to other
/// entities, and duplicates for states already left behind, are no-ops.
pub struct Task {
    id: EntityId,
    job_id: EntityId,
    name: String,
    body: Arc<dyn TaskBody>,
    status: Status,
    buffer: Arc<LineBuffer>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("job_id", &self.job_id)
            .field("name", &self.name)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Task {
    pub(crate) fn new(spec: TaskSpec, job_id: EntityId, ids: &mut IdAllocator) -> Self {
        Self {
            id: ids.next_id(),
            job_id,
            name: spec.name,
            body: spec.body,
            status: Status::Pending,
            buffer: Arc::new(LineBuffer::new()),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn job_id(&self) -> EntityId {
        self.job_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The task's output buffer. Live while the body runs; readers take
    /// snapshots via [`LineBuffer::all_lines`] / [`LineBuffer::tail`].
    pub fn buffer(&self) -> &Arc<LineBuffer> {
        &self.buffer
    }

    /// Event that starts this task.
    pub(crate) fn init_event(&self) -> Event {
        Event::TaskInit {
            task: self.id,
            job: self.job_id,
        }
    }

    /// Apply one event. Returns a command when the event starts this task's
    /// body.
    pub(crate) fn on(&mut self, event: &Event) -> Option<CoreCommand> {
        match event {
            Event::TaskInit { task, .. } if *task == self.id => {
                if self.status != Status::Pending {
                    // Duplicate init for a task that already started.
                    return None;
                }
                self.status = Status::Running;
                Some(CoreCommand::RunBody(BodyRun {
                    task: self.id,
                    job: self.job_id,
                    body: Arc::clone(&self.body),
                    sink: Arc::clone(&self.buffer),
                }))
            }
            Event::TaskDone { task, outcome, .. } if *task == self.id => {
                if self.status == Status::Running {
                    self.status = if outcome.is_failure() {
                        Status::Failed
                    } else {
                        Status::Succeeded
                    };
                }
                None
            }
            _ => None,
        }
    }
}
