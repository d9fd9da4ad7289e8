//! Coverage dump extraction for simulated firmware runs.
//!
//! Firmware running inside a simulator cannot write files to the host, so
//! it serializes its gcov counters into the console between two marker
//! lines. This crate scans the captured console text for that region,
//! reconstructs one binary artifact per announced source file, and persists
//! the project-owned ones as `.gcda` files.
//!
//! # Usage
//!
//! ```rust
//! use fwcov_dump::{CapturedOutput, DumpParser};
//!
//! let output = CapturedOutput::from_text(
//!     "boot banner\n\
//!      === GCOV DUMP START ===\n\
//!      FILE: /main/test_common.cpp\n\
//!      DATA: 61646367\n\
//!      === GCOV DUMP END ===\n",
//! );
//! let scan = DumpParser::parse(output).unwrap();
//! assert_eq!(scan.artifacts[0].source, "/main/test_common.cpp");
//! assert_eq!(scan.artifacts[0].data, b"adcg");
//! ```

pub mod artifact;
pub mod capture;
pub mod error;
pub mod parser;
pub mod prelude;
pub mod writer;

pub use artifact::Artifact;
pub use capture::CapturedOutput;
pub use parser::{DumpParser, DumpScan};
pub use writer::ArtifactWriter;
