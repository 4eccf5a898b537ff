//! Fetch driver: hands the fetch set to SteamCMD as one batch job and
//! verifies afterwards what actually landed on disk.
//!
//! The external tool is never trusted on its own exit code. After it
//! returns, installed state and on-disk presence are re-derived and every
//! requested id is classified as succeeded or failed ([`verify`]). There is
//! no retry; failures are written out for the operator.

mod runscript;
mod steamcmd;
mod verify;

pub use runscript::{Runscript, RUNSCRIPT_FILE};
pub use steamcmd::{Credentials, SteamCmd};
pub use verify::{verify, write_failures, Verification, FAILED_IDS_FILE};

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from driving the external fetch tool.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The tool executable does not exist.
    #[error("SteamCMD not found at path: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// Failed to spawn or wait on the tool.
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a job or result file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a list file.
    #[error(transparent)]
    Output(#[from] crate::catalog::CatalogError),
}

impl FetchError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// How the external tool exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchRun {
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
}

impl FetchRun {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// An external tool that downloads every item listed in a runscript.
#[async_trait]
pub trait FetchTool: Send + Sync {
    /// Tool name for logging.
    fn name(&self) -> &str;

    /// Confirm the tool can be started at all. Called before any other
    /// work so a misconfigured tool aborts the run early.
    async fn check(&self) -> Result<(), FetchError>;

    /// Execute the job already written to `script_path`. Returns once the
    /// tool has exited; a non-zero exit is not an error here.
    async fn run(&self, script: &Runscript, script_path: &Path) -> Result<FetchRun, FetchError>;
}
