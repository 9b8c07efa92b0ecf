use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use tfsweep::engine::{BodyRun, Event, TaskOutcome};
use tfsweep::errors::Result;
use tfsweep::exec::ExecutorBackend;
use tfsweep::id::EntityId;

/// A fake executor that:
/// - records the ids of the tasks it was asked to run, in order
/// - runs each body inline and immediately reports its completion.
pub struct FakeExecutor {
    event_tx: mpsc::Sender<Event>,
    executed: Arc<Mutex<Vec<EntityId>>>,
}

impl FakeExecutor {
    pub fn new(event_tx: mpsc::Sender<Event>, executed: Arc<Mutex<Vec<EntityId>>>) -> Self {
        Self { event_tx, executed }
    }
}

impl ExecutorBackend for FakeExecutor {
    fn run_body(&mut self, run: BodyRun) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.event_tx.clone();
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.push(run.task);
            }

            let outcome = match run.body.run(run.sink).await {
                Ok(()) => TaskOutcome::Success,
                Err(err) => TaskOutcome::Failed(format!("{err:#}")),
            };

            tx.send(Event::TaskDone {
                task: run.task,
                job: run.job,
                outcome,
            })
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}
