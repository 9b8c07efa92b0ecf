// src/exec/command_body.rs

//! Task body that runs external commands.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::buffer::LineBuffer;
use crate::jobs::{BodyFuture, TaskBody};

/// One external command invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Task body that runs a sequence of commands in a working directory.
///
/// stdout and stderr are both streamed into the sink as they arrive; the
/// line buffer does the line splitting. The first non-zero exit fails the
/// body and skips the remaining commands of this body (the *job* still
/// continues with its next task).
///
/// `require_output` handles tools that exit 0 while still reporting
/// problems: after every command has succeeded, the buffered output must
/// contain the given substring.
#[derive(Debug, Clone)]
pub struct CommandBody {
    dir: PathBuf,
    commands: Vec<CommandSpec>,
    require_output: Option<String>,
}

impl CommandBody {
    pub fn new(dir: impl Into<PathBuf>, commands: Vec<CommandSpec>) -> Self {
        Self {
            dir: dir.into(),
            commands,
            require_output: None,
        }
    }

    /// Require `needle` to appear in the captured output for the body to
    /// count as successful.
    pub fn require_output(mut self, needle: impl Into<String>) -> Self {
        self.require_output = Some(needle.into());
        self
    }

    async fn run_all(self, sink: Arc<LineBuffer>) -> anyhow::Result<()> {
        for spec in &self.commands {
            run_command(&self.dir, spec, &sink).await?;
        }
        if let Some(needle) = &self.require_output {
            if !sink.to_string().contains(needle) {
                bail!("expected {needle:?} in command output");
            }
        }
        Ok(())
    }
}

impl TaskBody for CommandBody {
    fn run(&self, sink: Arc<LineBuffer>) -> BodyFuture {
        let body = self.clone();
        Box::pin(body.run_all(sink))
    }
}

async fn run_command(dir: &Path, spec: &CommandSpec, sink: &Arc<LineBuffer>) -> anyhow::Result<()> {
    debug!(program = %spec.program, dir = %dir.display(), "running command");

    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning '{}'", spec.program))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Drain both pipes while waiting, so the child can never block on a
    // full pipe buffer.
    let (status, (), ()) = tokio::join!(
        child.wait(),
        pump(stdout, Arc::clone(sink)),
        pump(stderr, Arc::clone(sink)),
    );

    let status = status.with_context(|| format!("waiting for '{}'", spec.program))?;
    if !status.success() {
        bail!("'{}' exited with {}", spec.program, status);
    }
    Ok(())
}

/// Copy a child stream into the sink chunk by chunk.
async fn pump<R>(stream: Option<R>, sink: Arc<LineBuffer>)
where
    R: AsyncRead + Unpin,
{
    let Some(mut stream) = stream else { return };
    let mut chunk = [0u8; 4096];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink.write(&chunk[..n]),
        }
    }
}
