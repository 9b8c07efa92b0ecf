// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    /// Run-level aggregate failure: some jobs ended failed. The causes stay
    /// inspectable in each task's buffered output, not here.
    #[error("{0} job(s) failed")]
    JobsFailed(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;
