use std::sync::{Arc, Mutex};

use tfsweep::engine::core::Scheduler;
use tfsweep::engine::Event;
use tfsweep::report::Reporter;

/// Records one line per processed event, resolving entity names through the
/// scheduler view. Tests assert on the relative order of these lines.
pub struct RecordingReporter {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
        Self { log }
    }
}

impl Reporter for RecordingReporter {
    fn on_event(&mut self, event: &Event, run: &Scheduler) {
        let line = match event {
            Event::JobInit { job } => run.job(*job).map(|j| format!("job-start {}", j.name())),
            Event::TaskInit { task, .. } => run.find_task(*task).map(|t| {
                let job = run.job(t.job_id()).map(|j| j.name()).unwrap_or("?");
                format!("task-start {job}/{}", t.name())
            }),
            Event::TaskDone { task, outcome, .. } => run.find_task(*task).map(|t| {
                let job = run.job(t.job_id()).map(|j| j.name()).unwrap_or("?");
                let state = if outcome.is_failure() { "failed" } else { "ok" };
                format!("task-done {job}/{} {state}", t.name())
            }),
            Event::JobDone { job, failed } => run.job(*job).map(|j| {
                let state = if *failed { "failed" } else { "ok" };
                format!("job-done {} {state}", j.name())
            }),
            Event::Shutdown => Some("shutdown".to_string()),
        };

        if let Some(line) = line {
            self.log.lock().unwrap().push(line);
        }
    }
}
