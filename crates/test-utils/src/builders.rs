#![allow(dead_code)]

use std::sync::Arc;

use tfsweep::buffer::LineBuffer;
use tfsweep::jobs::{BodyFuture, JobSpec, TaskBody, TaskSpec};

/// Body that succeeds immediately without writing anything.
pub fn ok_body() -> Arc<dyn TaskBody> {
    Arc::new(|_sink: Arc<LineBuffer>| -> BodyFuture { Box::pin(async { Ok(()) }) })
}

/// Body that fails immediately with the given message.
pub fn failing_body(message: &str) -> Arc<dyn TaskBody> {
    let message = message.to_string();
    Arc::new(move |_sink: Arc<LineBuffer>| -> BodyFuture {
        let message = message.clone();
        Box::pin(async move { anyhow::bail!("{message}") })
    })
}

/// Body that writes the given chunks to its sink, then succeeds.
pub fn writing_body(chunks: &[&str]) -> Arc<dyn TaskBody> {
    let chunks: Vec<String> = chunks.iter().map(|s| s.to_string()).collect();
    Arc::new(move |sink: Arc<LineBuffer>| -> BodyFuture {
        let chunks = chunks.clone();
        Box::pin(async move {
            for chunk in &chunks {
                sink.write(chunk.as_bytes());
            }
            Ok(())
        })
    })
}

/// Builder for `JobSpec` to simplify test setup.
pub struct JobSpecBuilder {
    name: String,
    tasks: Vec<TaskSpec>,
}

impl JobSpecBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tasks: Vec::new(),
        }
    }

    pub fn task(mut self, name: &str, body: Arc<dyn TaskBody>) -> Self {
        self.tasks.push(TaskSpec::new(name, body));
        self
    }

    pub fn ok_task(self, name: &str) -> Self {
        self.task(name, ok_body())
    }

    pub fn failing_task(self, name: &str) -> Self {
        let body = failing_body(&format!("{name} failed"));
        self.task(name, body)
    }

    pub fn build(self) -> JobSpec {
        JobSpec::new(self.name, self.tasks)
    }
}
