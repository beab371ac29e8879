use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use ytrelay_api::api::DownloadResponse;

use crate::error::RelayError;

/// The external command line tool that every submission is handed to.
///
/// Invoked as `<program> <args...> <argument>`.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    pub program: OsString,
    /// Fixed leading arguments, e.g. the script path for an interpreter.
    pub args: Vec<OsString>,
    /// Working directory of the tool, inherited from the server if `None`.
    pub current_dir: Option<PathBuf>,
}

/// What the tool left behind once it exited.
#[derive(Debug)]
pub struct ToolOutput {
    /// Exit code of the tool or `None` if terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub time_taken: Duration,
}

impl ExternalTool {
    fn command(&self, argument: &OsStr) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        // Passed as its own argv entry, no shell involved. The content is still untrusted.
        command.arg(argument);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command.stdin(Stdio::null());
        command
    }

    /// Runs the tool to completion, buffering both output streams.
    ///
    /// Dropping this future closes the output pipes, so the tool likely dies on its next write.
    /// Run it in a spawned task if it has to outlive the request.
    pub async fn run(&self, id: u64, argument: &OsStr) -> Result<ToolOutput, RelayError> {
        let mut command = self.command(argument);
        log::debug!(id; "invoking {command:?}");

        let start = Instant::now();
        let result = command.output().await;
        let time_taken = start.elapsed();

        let out = result.map_err(|e| {
            log::error!(id; "failed to start tool: {e}");
            RelayError::Spawn(e)
        })?;

        log::info!(id, status:display = out.status, time_taken:debug; "tool exited");
        log::debug!(id; "stdout: {}", String::from_utf8_lossy(&out.stdout).trim());
        log::debug!(id; "stderr: {}", String::from_utf8_lossy(&out.stderr).trim());

        Ok(ToolOutput {
            exit_code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            time_taken,
        })
    }
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<ToolOutput> for DownloadResponse {
    fn from(output: ToolOutput) -> Self {
        if output.success() {
            DownloadResponse::Success {
                output: output.stdout,
            }
        } else if output.stderr.is_empty() {
            DownloadResponse::Error {
                error: output.stdout,
            }
        } else {
            DownloadResponse::Error {
                error: output.stderr,
            }
        }
    }
}
