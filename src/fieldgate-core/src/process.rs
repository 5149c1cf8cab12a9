//! Captured-output subprocess execution.
//!
//! Every external program the core drives goes through here. The timeout
//! variant sets `kill_on_drop` so an expired or abandoned invocation never
//! leaves an orphaned child behind.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Captured result of one finished subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a program to completion, capturing stdout and stderr.
pub async fn run<I, S>(program: &str, args: I) -> Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| Error::ProcessLaunch {
            program: program.to_string(),
            source,
        })?;
    Ok(collect(output))
}

/// Runs a program under a hard kill-timeout.
pub async fn run_with_timeout<I, S>(program: &str, args: I, limit: Duration) -> Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);
    match timeout(limit, command.output()).await {
        Ok(result) => result.map(collect).map_err(|source| Error::ProcessLaunch {
            program: program.to_string(),
            source,
        }),
        Err(_) => Err(Error::Timeout {
            program: program.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}

fn collect(output: std::process::Output) -> ProcessOutput {
    ProcessOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
