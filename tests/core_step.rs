// tests/core_step.rs

//! Stepping the pure reducer by hand: no tokio, no channels. Pins the
//! identifier-routing and monotonicity guarantees.

use tfsweep::engine::{Capacity, CoreCommand, Event, Scheduler, TaskOutcome};
use tfsweep::jobs::Status;
use tfsweep_test_utils::builders::JobSpecBuilder;

#[test]
fn single_job_walkthrough() {
    let specs = vec![JobSpecBuilder::new("job").ok_task("only").build()];
    let mut core = Scheduler::new(specs, Capacity::Bounded(1));

    let job_id = core.jobs()[0].id();
    let task_id = core.jobs()[0].tasks()[0].id();

    // Admission takes a slot and emits the job's init event.
    let step = core.start();
    assert_eq!(core.slots_in_use(), 1);
    assert!(matches!(step.feedback.as_slice(), [Event::JobInit { job }] if *job == job_id));

    // Job init: job Running, first task asked to start.
    let step = core.step(&Event::JobInit { job: job_id });
    assert_eq!(core.jobs()[0].status(), Status::Running);
    assert_eq!(core.jobs()[0].tasks()[0].status(), Status::Pending);
    assert!(matches!(step.feedback.as_slice(), [Event::TaskInit { task, .. }] if *task == task_id));

    // Task init: task Running, body handed to the shell.
    let step = core.step(&Event::TaskInit {
        task: task_id,
        job: job_id,
    });
    assert_eq!(core.jobs()[0].tasks()[0].status(), Status::Running);
    assert!(matches!(step.commands.as_slice(), [CoreCommand::RunBody(_)]));

    // A duplicate init must not start the body twice.
    let step = core.step(&Event::TaskInit {
        task: task_id,
        job: job_id,
    });
    assert!(step.commands.is_empty());

    // A completion for an id this job does not currently wait on is a no-op.
    let step = core.step(&Event::TaskDone {
        task: 999,
        job: job_id,
        outcome: TaskOutcome::Success,
    });
    assert!(step.feedback.is_empty());
    assert_eq!(core.jobs()[0].tasks()[0].status(), Status::Running);

    // The real completion finishes the task and exhausts the job.
    let step = core.step(&Event::TaskDone {
        task: task_id,
        job: job_id,
        outcome: TaskOutcome::Success,
    });
    assert_eq!(core.jobs()[0].tasks()[0].status(), Status::Succeeded);
    assert!(matches!(step.feedback.as_slice(), [Event::JobDone { job, failed: false }] if *job == job_id));

    // A late duplicate completion cannot move the task backward.
    let step = core.step(&Event::TaskDone {
        task: task_id,
        job: job_id,
        outcome: TaskOutcome::Failed("late".to_string()),
    });
    assert!(step.feedback.is_empty());
    assert_eq!(core.jobs()[0].tasks()[0].status(), Status::Succeeded);

    // Job done: slot released, counters updated, run over.
    let step = core.step(&Event::JobDone {
        job: job_id,
        failed: false,
    });
    assert!(!step.keep_running);
    assert_eq!(core.slots_in_use(), 0);
    assert_eq!(core.jobs_done(), 1);
    assert_eq!(core.jobs_failed(), 0);
    assert!(core.jobs()[0].done());
    assert_eq!(core.jobs()[0].status(), Status::Succeeded);

    // A duplicate done event must not release the gate twice or recount.
    core.step(&Event::JobDone {
        job: job_id,
        failed: false,
    });
    assert_eq!(core.jobs_done(), 1);
    assert_eq!(core.slots_in_use(), 0);
}

#[test]
fn freed_slot_admits_the_next_job_in_input_order() {
    let specs = vec![
        JobSpecBuilder::new("first").ok_task("t").build(),
        JobSpecBuilder::new("second").ok_task("t").build(),
    ];
    let mut core = Scheduler::new(specs, Capacity::Bounded(1));

    let first = core.jobs()[0].id();
    let second = core.jobs()[1].id();

    let step = core.start();
    assert!(matches!(step.feedback.as_slice(), [Event::JobInit { job }] if *job == first));
    assert_eq!(core.slots_in_use(), 1);

    // Drive the first job to completion.
    core.step(&Event::JobInit { job: first });
    let t1 = core.jobs()[0].tasks()[0].id();
    core.step(&Event::TaskInit { task: t1, job: first });
    core.step(&Event::TaskDone {
        task: t1,
        job: first,
        outcome: TaskOutcome::Success,
    });

    let step = core.step(&Event::JobDone {
        job: first,
        failed: false,
    });

    // The slot moved straight to the second job.
    assert!(step.keep_running);
    assert_eq!(core.slots_in_use(), 1);
    assert!(step
        .feedback
        .iter()
        .any(|e| matches!(e, Event::JobInit { job } if *job == second)));
}

#[test]
fn failed_task_marks_job_failed_but_run_continues() {
    let specs = vec![JobSpecBuilder::new("job")
        .failing_task("bad")
        .ok_task("good")
        .build()];
    let mut core = Scheduler::new(specs, Capacity::Bounded(1));

    let job_id = core.jobs()[0].id();
    let bad = core.jobs()[0].tasks()[0].id();
    let good = core.jobs()[0].tasks()[1].id();

    core.start();
    core.step(&Event::JobInit { job: job_id });
    core.step(&Event::TaskInit { task: bad, job: job_id });

    // Failure advances to the next task instead of aborting the job.
    let step = core.step(&Event::TaskDone {
        task: bad,
        job: job_id,
        outcome: TaskOutcome::Failed("boom".to_string()),
    });
    assert!(matches!(step.feedback.as_slice(), [Event::TaskInit { task, .. }] if *task == good));
    assert!(core.jobs()[0].failed());
    assert_eq!(core.jobs()[0].status(), Status::Running);

    core.step(&Event::TaskInit { task: good, job: job_id });
    let step = core.step(&Event::TaskDone {
        task: good,
        job: job_id,
        outcome: TaskOutcome::Success,
    });

    // The job ends failed even though its last task succeeded.
    assert!(matches!(step.feedback.as_slice(), [Event::JobDone { failed: true, .. }]));
    core.step(&Event::JobDone {
        job: job_id,
        failed: true,
    });
    assert_eq!(core.jobs()[0].status(), Status::Failed);
    assert_eq!(core.jobs_failed(), 1);
}
