// tests/runtime_scenarios.rs

//! End-to-end scenarios through the runtime loop with a fake executor.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use tfsweep::engine::{Capacity, Event, RunSummary, Runtime, Scheduler};
use tfsweep::id::EntityId;
use tfsweep::jobs::{JobSpec, Status};
use tfsweep_test_utils::builders::JobSpecBuilder;
use tfsweep_test_utils::fake_executor::FakeExecutor;
use tfsweep_test_utils::init_tracing;
use tfsweep_test_utils::reporters::RecordingReporter;

/// Run the given jobs to completion and return the runtime (for state
/// inspection), the recorded event log, and the summary.
async fn run_jobs(
    specs: Vec<JobSpec>,
    capacity: Capacity,
) -> (Runtime<FakeExecutor>, Vec<String>, RunSummary) {
    init_tracing();

    let (event_tx, event_rx) = mpsc::channel::<Event>(64);

    let executed: Arc<Mutex<Vec<EntityId>>> = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(event_tx.clone(), executed);

    let log = Arc::new(Mutex::new(Vec::new()));
    let reporter = RecordingReporter::new(Arc::clone(&log));

    let core = Scheduler::new(specs, capacity);
    let mut runtime = Runtime::new(core, event_rx, executor, Box::new(reporter));

    let summary = timeout(Duration::from_secs(3), runtime.run())
        .await
        .expect("runtime did not finish within 3 seconds")
        .expect("runtime returned an error");

    let log = log.lock().unwrap().clone();
    (runtime, log, summary)
}

fn index_of(log: &[String], needle: &str) -> usize {
    log.iter()
        .position(|l| l == needle)
        .unwrap_or_else(|| panic!("event {needle:?} not found in log: {log:#?}"))
}

#[tokio::test]
async fn capacity_one_runs_jobs_strictly_in_input_order() {
    let specs = vec![
        JobSpecBuilder::new("j1").ok_task("t").build(),
        JobSpecBuilder::new("j2").ok_task("t").build(),
        JobSpecBuilder::new("j3").ok_task("t").build(),
    ];

    let (runtime, log, summary) = run_jobs(specs, Capacity::Bounded(1)).await;

    assert_eq!(summary, RunSummary { jobs_done: 3, jobs_failed: 0 });

    // With one slot, job n+1 is only admitted once job n has fully finished.
    assert!(index_of(&log, "job-done j1 ok") < index_of(&log, "job-start j2"));
    assert!(index_of(&log, "job-done j2 ok") < index_of(&log, "job-start j3"));

    for job in runtime.core().jobs() {
        assert_eq!(job.status(), Status::Succeeded);
        assert!(job.done());
    }
}

#[tokio::test]
async fn failed_job_is_counted_once_and_does_not_infect_others() {
    let specs = vec![
        JobSpecBuilder::new("j1").ok_task("t").build(),
        JobSpecBuilder::new("j2").failing_task("t").build(),
        JobSpecBuilder::new("j3").ok_task("t").build(),
    ];

    let (runtime, log, summary) = run_jobs(specs, Capacity::Bounded(2)).await;

    assert_eq!(summary, RunSummary { jobs_done: 3, jobs_failed: 1 });
    assert!(log.contains(&"job-done j2 failed".to_string()));

    let statuses: Vec<Status> = runtime.core().jobs().iter().map(|j| j.status()).collect();
    assert_eq!(statuses, [Status::Succeeded, Status::Failed, Status::Succeeded]);
}

#[tokio::test]
async fn failure_is_sticky_but_remaining_tasks_still_run() {
    let specs = vec![
        JobSpecBuilder::new("job")
            .ok_task("a")
            .failing_task("b")
            .ok_task("c")
            .build(),
    ];

    let (runtime, log, summary) = run_jobs(specs, Capacity::Unbounded).await;

    assert_eq!(summary, RunSummary { jobs_done: 1, jobs_failed: 1 });

    // c still ran, after b's failure was recorded.
    assert!(index_of(&log, "task-done job/b failed") < index_of(&log, "task-start job/c"));
    assert!(log.contains(&"task-done job/c ok".to_string()));

    let job = &runtime.core().jobs()[0];
    assert_eq!(job.status(), Status::Failed);
    assert!(job.failed());

    let task_statuses: Vec<Status> = job.tasks().iter().map(|t| t.status()).collect();
    assert_eq!(task_statuses, [Status::Succeeded, Status::Failed, Status::Succeeded]);
}

#[tokio::test]
async fn tasks_within_a_job_run_strictly_in_sequence() {
    let specs = vec![
        JobSpecBuilder::new("job")
            .ok_task("a")
            .ok_task("b")
            .ok_task("c")
            .build(),
    ];

    let (_runtime, log, _summary) = run_jobs(specs, Capacity::Unbounded).await;

    // Task k+1 never starts before task k's completion was processed.
    assert!(index_of(&log, "task-done job/a ok") < index_of(&log, "task-start job/b"));
    assert!(index_of(&log, "task-done job/b ok") < index_of(&log, "task-start job/c"));
}

#[tokio::test]
async fn freed_capacity_goes_to_the_next_pending_job() {
    let specs = vec![
        JobSpecBuilder::new("j1").ok_task("t").build(),
        JobSpecBuilder::new("j2").ok_task("t").build(),
        JobSpecBuilder::new("j3").ok_task("t").build(),
    ];

    let (_runtime, log, summary) = run_jobs(specs, Capacity::Bounded(2)).await;

    assert_eq!(summary, RunSummary { jobs_done: 3, jobs_failed: 0 });

    // j3 was not admitted at the start; it only starts after some job
    // finished and returned its slot.
    let first_done = log
        .iter()
        .position(|l| l.starts_with("job-done"))
        .expect("no job finished");
    assert!(first_done < index_of(&log, "job-start j3"));
}

#[tokio::test]
async fn job_without_tasks_succeeds_immediately() {
    let specs = vec![JobSpecBuilder::new("empty").build()];

    let (runtime, log, summary) = run_jobs(specs, Capacity::Unbounded).await;

    assert_eq!(summary, RunSummary { jobs_done: 1, jobs_failed: 0 });
    assert!(log.contains(&"job-done empty ok".to_string()));
    assert_eq!(runtime.core().jobs()[0].status(), Status::Succeeded);
}

#[tokio::test]
async fn run_with_no_jobs_terminates_at_once() {
    let (_runtime, log, summary) = run_jobs(Vec::new(), Capacity::Unbounded).await;

    assert_eq!(summary, RunSummary { jobs_done: 0, jobs_failed: 0 });
    assert!(log.is_empty());
}

#[tokio::test]
async fn task_output_is_buffered_and_tailable() {
    let body = tfsweep_test_utils::builders::writing_body(&["one\n", "two\n", "thr", "ee\n"]);
    let specs = vec![JobSpecBuilder::new("job").task("t", body).build()];

    let (runtime, _log, summary) = run_jobs(specs, Capacity::Unbounded).await;

    assert_eq!(summary.jobs_failed, 0);

    let task = &runtime.core().jobs()[0].tasks()[0];
    assert_eq!(task.buffer().all_lines(), ["one\n", "two\n", "three\n"]);
    assert_eq!(task.buffer().tail(2), ["two\n", "three\n"]);
}
