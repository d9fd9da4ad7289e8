//! High-level process runner with event handling and a wall-clock budget.

use std::{path::PathBuf, process::ExitStatus, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::mpsc::Sender,
    task::JoinHandle,
    time::Instant,
};
use tracing::debug;

use crate::process::{
    ProcessStatus, capture_exit_status, get_process_status, spawn_process, stop_child,
};

/// Events emitted during process execution.
#[derive(Debug, PartialEq, Eq)]
pub enum RunEvent {
    /// Process creation failed with error message.
    ProcessCreationFailed(String),
    /// Process was successfully created.
    ProcessCreated,
    /// Process ended (true = success, false = failure or timeout).
    ProcessEnd(bool),
    /// New output data from the process (combined stdout/stderr).
    ProcessNewOutputLine(String),
}

/// How a run came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    /// The process exited on its own.
    Completed(ExitStatus),
    /// The budget elapsed and the process was killed. Output captured up to
    /// this point is still valid.
    TimedOut,
}

impl RunVerdict {
    /// Whether the process exited on its own with a zero status.
    pub fn success(&self) -> bool {
        matches!(self, Self::Completed(status) if status.success())
    }
}

/// How long to keep draining the output pipes after a kill. Orphaned
/// grandchildren may hold the write ends open past the child's death.
const READER_DRAIN_BUDGET: Duration = Duration::from_secs(2);

async fn join_reader(task: Option<JoinHandle<()>>, drain_budget: Option<Duration>) {
    let Some(mut task) = task else { return };
    match drain_budget {
        Some(limit) => {
            if tokio::time::timeout(limit, &mut task).await.is_err() {
                task.abort();
            }
        }
        None => {
            let _ = task.await;
        }
    }
}

/// High-level process runner with event-driven output handling.
pub struct Runner {
    /// Command to execute.
    command: String,
    /// Command line arguments.
    args: Vec<String>,
    /// Working directory for the child, if any.
    current_dir: Option<PathBuf>,
    /// Extra environment entries for the child.
    envs: Vec<(String, String)>,
}

impl Runner {
    /// Create a new runner with command and arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fwcov_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la", "/tmp"]);
    /// ```
    pub fn new(command: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(|a| a.into()).collect(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    /// Create a new runner with just a command (no arguments).
    pub fn new_without_args(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    /// Set the working directory for the child process.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Add environment entries for the child process.
    pub fn envs(mut self, envs: Vec<(String, String)>) -> Self {
        self.envs = envs;
        self
    }

    /// Get the full command string with arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fwcov_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la"]);
    /// assert_eq!(runner.get_full_command(), "ls -la");
    /// ```
    pub fn get_full_command(&self) -> String {
        format!("{} {}", &self.command, &self.args.join(" "))
    }

    async fn read_stream<T: AsyncRead + Unpin>(tx: Sender<RunEvent>, mut stream: T) {
        let mut buffer = [0; 1024];
        loop {
            match stream.read(&mut buffer).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    let data = String::from_utf8_lossy(&buffer[..n]);
                    if tx
                        .send(RunEvent::ProcessNewOutputLine(data.to_string()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }

    fn launch_stream_reader<T>(tx: Sender<RunEvent>, stream: T) -> JoinHandle<()>
    where
        T: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(Self::read_stream(tx, stream))
    }

    /// Run the process with event monitoring.
    ///
    /// Starts the process and monitors its execution, sending events via the
    /// provided channel. Reads stdout and stderr until the process finishes
    /// or the budget elapses; in the latter case the child is killed and
    /// [`RunVerdict::TimedOut`] is returned, with all output captured so far
    /// already delivered through the channel.
    ///
    /// # Arguments
    ///
    /// * `tx` - Channel sender for RunEvent notifications
    /// * `budget` - Optional wall-clock limit for the whole run
    ///
    /// Returns `None` if the process could not be created or monitored.
    pub async fn run(&self, tx: Sender<RunEvent>, budget: Option<Duration>) -> Option<RunVerdict> {
        let mut process = match spawn_process(
            &self.command,
            &self.args,
            self.current_dir.as_deref(),
            &self.envs,
        ) {
            Ok(process) => process,
            Err(err) => {
                let _ = tx
                    .send(RunEvent::ProcessCreationFailed(format!("{:?}", err)))
                    .await;
                return None;
            }
        };

        let _ = tx.send(RunEvent::ProcessCreated).await;

        // Take stdout and stderr and launch a stream reader for each
        let stdout_task = process
            .stdout
            .take()
            .map(|stdout| Self::launch_stream_reader(tx.clone(), stdout));
        let stderr_task = process
            .stderr
            .take()
            .map(|stderr| Self::launch_stream_reader(tx.clone(), stderr));

        // Loop until the process ends or its budget runs out
        let started = Instant::now();
        let verdict = loop {
            if let Some(budget) = budget {
                if started.elapsed() >= budget {
                    debug!("budget of {:?} elapsed, stopping {}", budget, self.command);
                    if stop_child(&mut process).await.is_err() {
                        break None;
                    }
                    let _ = capture_exit_status(&mut process).await;
                    break Some(RunVerdict::TimedOut);
                }
            }
            match get_process_status(&mut process).await {
                Err(_) => break None,
                Ok(ProcessStatus::Done(status)) => break Some(RunVerdict::Completed(status)),
                Ok(ProcessStatus::Running) => {}
            };
        };

        // Join stdout and stderr readers so trailing output is delivered.
        // After a timeout kill the drain is bounded instead.
        let drain_budget = match verdict {
            Some(RunVerdict::TimedOut) => Some(READER_DRAIN_BUDGET),
            _ => None,
        };
        join_reader(stdout_task, drain_budget).await;
        join_reader(stderr_task, drain_budget).await;

        let success = verdict.as_ref().is_some_and(RunVerdict::success);
        let _ = tx.send(RunEvent::ProcessEnd(success)).await;
        verdict
    }
}
