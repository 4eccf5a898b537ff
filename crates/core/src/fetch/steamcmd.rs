//! SteamCMD subprocess driver.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use super::{FetchError, FetchRun, FetchTool, Runscript};

/// Login used for the SteamCMD session.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Anonymous,
    User {
        username: String,
        password: Option<String>,
    },
}

impl Credentials {
    /// Anonymous unless a non-blank username is given.
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Self {
        match username.map(|u| u.trim().to_string()) {
            Some(username) if !username.is_empty() => Self::User {
                username,
                password: password.filter(|p| !p.is_empty()),
            },
            _ => Self::Anonymous,
        }
    }

    fn login_args(&self) -> Vec<String> {
        let mut args = vec!["+login".to_string()];
        match self {
            Self::Anonymous => args.push("anonymous".to_string()),
            Self::User { username, password } => {
                args.push(username.clone());
                if let Some(password) = password {
                    args.push(password.clone());
                }
            }
        }
        args
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::User { username, password } => f
                .debug_struct("User")
                .field("username", username)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Runs `steamcmd +login ... +runscript <path>` as a single blocking job.
#[derive(Debug, Clone)]
pub struct SteamCmd {
    executable: PathBuf,
    credentials: Credentials,
}

impl SteamCmd {
    pub fn new(executable: impl Into<PathBuf>, credentials: Credentials) -> Self {
        Self {
            executable: executable.into(),
            credentials,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn build_args(&self, script_path: &Path) -> Vec<String> {
        let mut args = self.credentials.login_args();
        args.push("+runscript".to_string());
        args.push(script_path.display().to_string());
        args
    }
}

#[async_trait]
impl FetchTool for SteamCmd {
    fn name(&self) -> &str {
        "steamcmd"
    }

    async fn check(&self) -> Result<(), FetchError> {
        if self.executable.is_file() {
            Ok(())
        } else {
            Err(FetchError::ExecutableNotFound {
                path: self.executable.clone(),
            })
        }
    }

    async fn run(&self, script: &Runscript, script_path: &Path) -> Result<FetchRun, FetchError> {
        self.check().await?;

        info!(
            executable = %self.executable.display(),
            app_id = script.app_id(),
            items = script.ids().len(),
            "Starting SteamCMD"
        );

        // SteamCMD prints its own progress; let it through to the terminal.
        let status = Command::new(&self.executable)
            .args(self.build_args(script_path))
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::ExecutableNotFound {
                        path: self.executable.clone(),
                    }
                } else {
                    FetchError::Spawn {
                        tool: self.name().to_string(),
                        source: e,
                    }
                }
            })?;

        let run = FetchRun {
            exit_code: status.code(),
        };
        if !run.success() {
            warn!(exit_code = ?run.exit_code, "SteamCMD exited unsuccessfully");
        }
        Ok(run)
    }
}
