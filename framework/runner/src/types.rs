use std::path::PathBuf;
use std::process::ExitStatus;

use itertools::Itertools;
use openabl_bench_core::prelude::ResultStoreError;

/// Recommended error type for the `main` function of a benchmark binary. Every fatal error of the
/// driver converts into it so that `?` can be used all the way up.
pub type BenchmarkResult<T> = anyhow::Result<T>;

/// Errors that stop the whole benchmark run.
///
/// Apart from [BenchError::Store], which is raised if results cannot be written, these are all
/// detected before the first invocation of OpenABL.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("OpenABL binary not found. Tried: {}", .tried.iter().map(|p| p.display()).join(", "))]
    ExecutableNotFound { tried: Vec<PathBuf> },
    #[error("{0}")]
    Configuration(String),
    #[error("Failed to store results: {0}")]
    Store(#[from] ResultStoreError),
}

impl BenchError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        BenchError::Configuration(msg.into())
    }
}

/// Errors from a single OpenABL invocation.
///
/// These only end the sweep that the invocation belonged to, the rest of the run continues.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("Invocation of command\n{command}\nexited with {status} and the following output:\n{output}")]
    InvocationFailed {
        command: String,
        status: ExitStatus,
        output: String,
    },
    #[error("Failed to start command\n{command}\n{source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("Failed to extract execution time from the output of command\n{command}\nOutput:\n{output}")]
    MetricParseFailed { command: String, output: String },
}

impl InvocationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InvocationError::InvocationFailed { .. } | InvocationError::Spawn { .. } => {
                FailureKind::InvocationFailed
            }
            InvocationError::MetricParseFailed { .. } => FailureKind::MetricParseFailed,
        }
    }
}

/// Why a sweep was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum FailureKind {
    #[display("invocation failed")]
    InvocationFailed,
    #[display("no execution time")]
    MetricParseFailed,
}
