//! Shared process execution helpers for the pipeline stages.

use std::time::Duration;

use fwcov_dump::CapturedOutput;
use fwcov_io::runner::{RunEvent, Runner, RunVerdict};
use tokio::sync::mpsc::channel;
use tracing::{debug, error, info};

use crate::prelude::*;

/// Run one pipeline process to completion (or until its budget elapses),
/// collecting its combined output.
///
/// With `echo` set, output chunks are forwarded to the terminal as they
/// arrive, for stages whose progress the operator wants to watch live.
pub async fn run_stage(
    runner: Runner,
    budget: Option<Duration>,
    echo: bool,
) -> Result<(RunVerdict, CapturedOutput)> {
    let full_command = runner.get_full_command();
    info!("Running: {}", full_command);

    let (tx, mut rx) = channel(32);
    let handle = tokio::spawn(async move { runner.run(tx, budget).await });

    let mut output = CapturedOutput::new();
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::ProcessCreationFailed(err) => {
                error!("Failed to create process for `{}` - {}", full_command, err);
            }
            RunEvent::ProcessCreated => debug!("`{}` started", full_command),
            RunEvent::ProcessNewOutputLine(chunk) => {
                if echo {
                    print!("{}", chunk);
                }
                output.push_chunk(&chunk);
            }
            RunEvent::ProcessEnd(success) => debug!("`{}` ended, success={}", full_command, success),
        }
    }

    let verdict = handle
        .await
        .map_err(|_| Error::ProcessFailed(full_command.clone()))?
        .ok_or(Error::ProcessFailed(full_command))?;
    Ok((verdict, output))
}
