// src/report.rs

//! Run progress reporting.
//!
//! The runtime notifies a [`Reporter`] for every event it processes, after
//! the scheduler state has been updated. This is the seam where a renderer
//! attaches; the built-in [`ConsoleReporter`] prints the line-per-event
//! output used in a plain terminal or a CI pipeline.

use crate::engine::core::Scheduler;
use crate::engine::Event;
use crate::jobs::{Status, Task};

/// Subscription point receiving every processed event together with a
/// read-only view of the run.
pub trait Reporter: Send {
    fn on_event(&mut self, event: &Event, run: &Scheduler);
}

/// Ignores everything.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn on_event(&mut self, _event: &Event, _run: &Scheduler) {}
}

/// One line per job start and per task completion, plus a summary line with
/// elapsed time per job completion, written to stdout.
///
/// Output is produced inside the serialized event loop, so lines from
/// concurrently running jobs never interleave mid-line.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn on_event(&mut self, event: &Event, run: &Scheduler) {
        match event {
            Event::JobInit { job } => {
                if let Some(job) = run.job(*job) {
                    println!("{}", job.name());
                }
            }
            Event::TaskDone { task, .. } => {
                if let Some(task) = run.find_task(*task) {
                    print!("{}", task_view(task));
                }
            }
            Event::JobDone { job, .. } => {
                if let Some(job) = run.job(*job) {
                    println!(
                        "{} {} ({:.1?})",
                        status_mark(job.status()),
                        job.name(),
                        job.elapsed()
                    );
                }
            }
            _ => {}
        }
    }
}

/// Glyph shown in front of finished task and job names.
pub fn status_mark(status: Status) -> &'static str {
    match status {
        Status::Pending | Status::Running => " ",
        Status::Succeeded => "✓",
        Status::Failed => "✗",
    }
}

/// Rendered line(s) for a finished task: status mark and name, plus the full
/// buffered output when the task failed. While a task is still running, the
/// live view is [`LineBuffer::tail`](crate::buffer::LineBuffer::tail) on its
/// buffer instead.
pub fn task_view(task: &Task) -> String {
    let mut s = format!("  {} {}\n", status_mark(task.status()), task.name());
    if task.status() == Status::Failed {
        for line in task.buffer().all_lines() {
            s.push_str("    ");
            s.push_str(&line);
        }
        if !s.ends_with('\n') {
            s.push('\n');
        }
    }
    s
}
