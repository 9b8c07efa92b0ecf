// src/engine/core.rs

//! Pure scheduling core.
//!
//! This module contains a synchronous, deterministic reducer that consumes
//! [`Event`]s and produces:
//! - an updated scheduler state
//! - commands for the IO shell (spawn a task body)
//! - follow-up events to feed back through the loop
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for
//! reading events from the channel, dispatching bodies to the executor and
//! handling Ctrl-C. The core has no channels, no tokio types, and performs no
//! IO, so it can be unit tested by stepping it by hand.

use tracing::{debug, info};

use crate::engine::gate::AdmissionGate;
use crate::engine::{Capacity, CoreStep, Event};
use crate::id::{EntityId, IdAllocator};
use crate::jobs::{Job, JobSpec, Task};

/// Owns every job in the run, the admission gate, and the aggregate
/// counters.
///
/// Jobs are admitted in input order up to the gate's capacity; each job done
/// event releases exactly one slot and the next not-yet-admitted job takes
/// it. The run terminates once every job has reported done.
#[derive(Debug)]
pub struct Scheduler {
    jobs: Vec<Job>,
    gate: AdmissionGate,
    /// Admission cursor: index of the next job not yet admitted.
    next_pending: usize,
    jobs_done: usize,
    jobs_failed: usize,
}

impl Scheduler {
    /// Build the run from its job specs. Ids are handed out here, in input
    /// order, by an allocator local to this run.
    pub fn new(specs: Vec<JobSpec>, capacity: Capacity) -> Self {
        let mut ids = IdAllocator::new();
        let jobs: Vec<Job> = specs.into_iter().map(|s| Job::new(s, &mut ids)).collect();
        let gate = AdmissionGate::new(capacity.resolve(jobs.len()));
        Self {
            jobs,
            gate,
            next_pending: 0,
            jobs_done: 0,
            jobs_failed: 0,
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn jobs_done(&self) -> usize {
        self.jobs_done
    }

    pub fn jobs_failed(&self) -> usize {
        self.jobs_failed
    }

    pub fn capacity(&self) -> usize {
        self.gate.capacity()
    }

    /// Number of admission slots currently held (for tests and diagnostics).
    pub fn slots_in_use(&self) -> usize {
        self.gate.in_use()
    }

    pub fn job(&self, id: EntityId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id() == id)
    }

    /// Locate a task anywhere in the run.
    pub fn find_task(&self, id: EntityId) -> Option<&Task> {
        self.jobs.iter().find_map(|j| j.find_task(id))
    }

    /// Admit jobs in input order until the gate is full, emitting their init
    /// events as feedback.
    pub fn start(&mut self) -> CoreStep {
        let mut step = CoreStep::running();
        if self.jobs.is_empty() {
            info!("no jobs to run");
            step.keep_running = false;
            return step;
        }
        self.admit_while_free(&mut step);
        step
    }

    /// Apply one event.
    pub fn step(&mut self, event: &Event) -> CoreStep {
        let mut step = CoreStep::running();

        match event {
            Event::JobDone { job, failed } => {
                match self.job(*job) {
                    None => {
                        debug!(job, "done event for unknown job; ignoring");
                        return step;
                    }
                    Some(j) if j.done() => {
                        debug!(job = %j.name(), "duplicate job done event; ignoring");
                        return step;
                    }
                    Some(_) => {}
                }

                // The slot acquired at admission is returned exactly once,
                // on this event.
                self.gate.release();
                self.jobs_done += 1;
                if *failed {
                    self.jobs_failed += 1;
                }
                self.forward_to_jobs(event, &mut step);

                debug!(
                    done = self.jobs_done,
                    failed = self.jobs_failed,
                    total = self.jobs.len(),
                    "job finished"
                );

                if self.jobs_done >= self.jobs.len() {
                    info!(failed = self.jobs_failed, "all jobs finished");
                    step.keep_running = false;
                } else {
                    self.admit_while_free(&mut step);
                }
            }
            Event::Shutdown => {
                info!("shutdown requested; abandoning in-flight tasks");
                step.keep_running = false;
            }
            _ => self.forward_to_jobs(event, &mut step),
        }

        step
    }

    fn forward_to_jobs(&mut self, event: &Event, step: &mut CoreStep) {
        for job in &mut self.jobs {
            let mut job_step = job.on(event);
            step.commands.append(&mut job_step.commands);
            step.feedback.append(&mut job_step.feedback);
        }
    }

    fn admit_while_free(&mut self, step: &mut CoreStep) {
        while self.next_pending < self.jobs.len() && self.gate.try_acquire() {
            let job = &mut self.jobs[self.next_pending];
            info!(job = %job.name(), "admitting job");
            step.feedback.push(job.init());
            self.next_pending += 1;
        }
    }
}
