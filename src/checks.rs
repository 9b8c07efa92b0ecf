// src/checks.rs

//! The terraform check pipeline run in every discovered directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::exec::{CommandBody, CommandSpec};
use crate::jobs::{JobSpec, TaskSpec};

/// Build the job for one terraform directory.
///
/// Checks always run in this order: fmt, init, validate, then tflint when
/// the binary is installed. A failing check does not stop the checks after
/// it; the directory's job just ends failed.
pub fn terraform_job(dir: &Path, tflint_config: Option<&Path>) -> JobSpec {
    let mut tasks = vec![
        TaskSpec::new(
            "terraform:fmt",
            Arc::new(CommandBody::new(
                dir,
                vec![CommandSpec::new(
                    "terraform",
                    &["fmt", "-list=true", "-check=true", "-recursive=false"],
                )],
            )),
        ),
        TaskSpec::new(
            "terraform:init",
            Arc::new(CommandBody::new(
                dir,
                vec![CommandSpec::new(
                    "terraform",
                    &["init", "-backend=false", "-input=false", "-get=true", "-no-color"],
                )],
            )),
        ),
        // validate exits 0 even with findings; the success marker in the
        // output is authoritative.
        TaskSpec::new(
            "terraform:validate",
            Arc::new(
                CommandBody::new(dir, vec![CommandSpec::new("terraform", &["validate"])])
                    .require_output("The configuration is valid."),
            ),
        ),
    ];

    if let Some(tflint) = find_in_path("tflint") {
        debug!(tflint = %tflint.display(), "tflint found; adding lint task");
        let mut lint_args = vec!["--recursive".to_string()];
        if let Some(cfg) = tflint_config {
            lint_args.push("--config".to_string());
            lint_args.push(cfg.display().to_string());
        }
        tasks.push(TaskSpec::new(
            "terraform:tflint",
            Arc::new(CommandBody::new(
                dir,
                vec![
                    CommandSpec::new("tflint", &["--init"]),
                    CommandSpec {
                        program: "tflint".to_string(),
                        args: lint_args,
                    },
                ],
            )),
        ));
    }

    JobSpec::new(dir.display().to_string(), tasks)
}

/// Minimal PATH lookup for an executable.
fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
