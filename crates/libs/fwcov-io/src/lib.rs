//! Process execution and I/O management for the fwcov pipeline.
//!
//! Provides utilities for spawning, monitoring, and reclaiming external
//! processes with real-time output capture. The pipeline's simulator target
//! has no guaranteed exit condition, so the runner supports a wall-clock
//! budget: when it elapses, the child is killed and whatever output was
//! captured up to that point is kept.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fwcov_io::runner::{RunEvent, Runner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new("echo", vec!["Hello, World!"]);
//!     let (tx, mut rx) = tokio::sync::mpsc::channel(32);
//!
//!     let handle = tokio::spawn(async move { runner.run(tx, None).await });
//!     while let Some(event) = rx.recv().await {
//!         if let RunEvent::ProcessNewOutputLine(chunk) = event {
//!             print!("{}", chunk);
//!         }
//!     }
//!     let verdict = handle.await.unwrap();
//!     println!("{:?}", verdict);
//! }
//! ```

pub mod process;
pub mod runner;
