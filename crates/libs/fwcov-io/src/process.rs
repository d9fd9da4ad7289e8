//! Low-level async process management utilities.

use std::{
    ffi::OsStr,
    io,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::process::{Child, Command};

/// Errors that can occur during process operations.
#[derive(Debug)]
pub enum ProcessError {
    /// Failed to wait for child process.
    WaitChildFail,
    /// Failed to spawn the process.
    SpawnProcessFail(io::Error),
}

/// Current status of a running process.
pub enum ProcessStatus {
    /// Process has completed with exit status.
    Done(ExitStatus),
    /// Process is still running.
    Running,
}

/// Spawn a new async process with piped stdout and stderr.
///
/// The overlay entries are added on top of the inherited environment; the
/// parent's own variables stay untouched.
///
/// # Arguments
///
/// * `cmd` - Command to execute
/// * `args` - Command line arguments
/// * `current_dir` - Optional working directory for the child
/// * `envs` - Extra environment entries for the child
pub fn spawn_process(
    cmd: &str,
    args: &[String],
    current_dir: Option<&Path>,
    envs: &[(String, String)],
) -> Result<Child, io::Error> {
    let mut command = Command::new(OsStr::new(cmd));
    command
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = current_dir {
        command.current_dir(dir);
    }
    for (key, value) in envs {
        command.env(key, value);
    }
    command.spawn()
}

/// Asynchronously check process status without blocking.
///
/// Polls the process status and includes a small async sleep to prevent
/// excessive CPU usage when called in a loop.
pub async fn get_process_status(child: &mut Child) -> Result<ProcessStatus, ProcessError> {
    match child.try_wait() {
        Ok(status) => match status {
            Some(exit_status) => Ok(ProcessStatus::Done(exit_status)),
            None => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(ProcessStatus::Running)
            }
        },
        Err(_) => Err(ProcessError::WaitChildFail),
    }
}

/// Asynchronously terminate a child process.
pub async fn stop_child(child: &mut Child) -> Result<(), io::Error> {
    child.kill().await
}

/// Asynchronously capture the exit status of a child process.
///
/// Waits for the child process to complete and returns its exit status.
/// This will close the stdin pipe, which can unblock processes waiting for
/// input.
pub async fn capture_exit_status(child: &mut Child) -> Result<ExitStatus, io::Error> {
    child.wait().await
}
