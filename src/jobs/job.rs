// src/jobs/job.rs

//! An ordered sequence of tasks scheduled as one unit.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::engine::{CoreCommand, Event};
use crate::id::{EntityId, IdAllocator};
use crate::jobs::task::{Task, TaskSpec};
use crate::jobs::Status;

/// Configuration for one job: a name plus its ordered task bodies.
#[derive(Debug)]
pub struct JobSpec {
    pub name: String,
    pub tasks: Vec<TaskSpec>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, tasks: Vec<TaskSpec>) -> Self {
        Self {
            name: name.into(),
            tasks,
        }
    }
}

/// Result of feeding one event to a job.
#[derive(Debug, Default)]
pub struct JobStep {
    pub commands: Vec<CoreCommand>,
    pub feedback: Vec<Event>,
}

/// An ordered group of tasks executed strictly in sequence.
///
/// Task *k+1* only starts after task *k*'s completion event has been
/// processed. A task failure makes `failed` sticky but does not stop the
/// remaining tasks: every stage always runs and stays visible.
pub struct Job {
    id: EntityId,
    name: String,
    tasks: Vec<Task>,
    /// Index of the task whose completion the job is waiting for. Only ever
    /// increases; tasks before it are all terminal.
    current_task: usize,
    status: Status,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    /// Set on the job's own done event, one tick after `status` turns
    /// terminal, so a final full-state render can happen first.
    done: bool,
    failed: bool,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("current_task", &self.current_task)
            .field("status", &self.status)
            .field("done", &self.done)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl Job {
    pub(crate) fn new(spec: JobSpec, ids: &mut IdAllocator) -> Self {
        let id = ids.next_id();
        let tasks = spec
            .tasks
            .into_iter()
            .map(|t| Task::new(t, id, ids))
            .collect();
        Self {
            id,
            name: spec.name,
            tasks,
            current_task: 0,
            status: Status::Pending,
            started_at: None,
            finished_at: None,
            done: false,
            failed: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Wall-clock time since admission; frozen once the job finishes.
    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn find_task(&self, id: EntityId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// Admission: start the elapsed timer and emit this job's init event.
    /// No task starts until that event comes back through the loop.
    pub(crate) fn init(&mut self) -> Event {
        self.started_at = Some(Instant::now());
        Event::JobInit { job: self.id }
    }

    /// Apply one event.
    pub(crate) fn on(&mut self, event: &Event) -> JobStep {
        let mut step = JobStep::default();
        match event {
            Event::JobInit { job } if *job == self.id => {
                if self.status != Status::Pending {
                    return step;
                }
                self.status = Status::Running;
                debug!(job = %self.name, "job running");
                match self.tasks.first() {
                    Some(task) => step.feedback.push(task.init_event()),
                    // A job without tasks is vacuously successful.
                    None => step.feedback.push(Event::JobDone {
                        job: self.id,
                        failed: false,
                    }),
                }
            }
            Event::JobDone { job, .. } if *job == self.id => {
                if !self.done {
                    self.done = true;
                    self.finished_at = Some(Instant::now());
                    self.status = if self.failed {
                        Status::Failed
                    } else {
                        Status::Succeeded
                    };
                }
            }
            Event::TaskDone { job, task, outcome } if *job == self.id => {
                // Let the matching task record its terminal status first.
                self.forward_to_tasks(event, &mut step);

                let Some(current) = self.tasks.get(self.current_task) else {
                    return step;
                };
                if current.id() != *task {
                    // Stale or duplicate completion; the cursor has moved on.
                    debug!(job = %self.name, task, "ignoring completion for non-current task");
                    return step;
                }
                if outcome.is_failure() {
                    // Sticky: one failed task fails the job, but the
                    // remaining tasks still run.
                    self.failed = true;
                }
                self.current_task += 1;
                match self.tasks.get(self.current_task) {
                    Some(next) => step.feedback.push(next.init_event()),
                    None => step.feedback.push(Event::JobDone {
                        job: self.id,
                        failed: self.failed,
                    }),
                }
            }
            _ => self.forward_to_tasks(event, &mut step),
        }
        step
    }

    fn forward_to_tasks(&mut self, event: &Event, step: &mut JobStep) {
        for task in &mut self.tasks {
            if let Some(cmd) = task.on(event) {
                step.commands.push(cmd);
            }
        }
    }
}
