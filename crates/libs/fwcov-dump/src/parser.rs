//! Line-oriented scanner for the console coverage dump protocol.
//!
//! The firmware prints its gcov counters between two marker lines:
//!
//! ```text
//! === GCOV DUMP START ===
//! FILE: /main/test_common.cpp
//! DATA: 61646367
//! DATA: 01000000
//! === GCOV DUMP END ===
//! ```
//!
//! Consecutive `DATA:` lines concatenate into one hex payload for the
//! current `FILE:`. Anything before the start marker, after the end marker,
//! or not carrying a known prefix (the firmware also prints a `VERSION:`
//! line and Unity test chatter) is ignored.

use tracing::{debug, error};

use crate::artifact::Artifact;
use crate::capture::CapturedOutput;
use crate::prelude::*;

/// Line opening the dump region.
pub const DUMP_START_MARKER: &str = "=== GCOV DUMP START ===";
/// Line closing the dump region.
pub const DUMP_END_MARKER: &str = "=== GCOV DUMP END ===";

const FILE_PREFIX: &str = "FILE: ";
const DATA_PREFIX: &str = "DATA: ";

/// Scanner state.
///
/// Finalization is an explicit transition: it fires on a `FILE:` line while
/// accumulating, on the end marker, and at end of stream.
#[derive(Debug)]
enum ParserState {
    /// Before the start marker (or after the end marker).
    OutsideRegion,
    /// Inside the region with no payload data yet. `source` is the pending
    /// identifier, if one was announced; a fresh `FILE:` line simply
    /// replaces it (a declared-but-empty file loses nothing).
    AwaitingPayload { source: Option<String> },
    /// Inside the region, accumulating hex data for `source`.
    Accumulating { source: String, hex: String },
}

/// Result of scanning one captured output stream.
#[derive(Debug, Default)]
pub struct DumpScan {
    /// Reconstructed artifacts, in the order their payloads first
    /// completed. A re-dumped identifier overwrites its payload in place.
    pub artifacts: Vec<Artifact>,
    /// Identifiers whose payload failed to decode.
    pub corrupt: Vec<String>,
}

/// Reconstructs artifacts from captured simulator output.
#[derive(Debug)]
pub struct DumpParser {
    state: ParserState,
    scan: DumpScan,
    region_seen: bool,
}

impl Default for DumpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpParser {
    /// Create a parser in its initial state.
    pub fn new() -> Self {
        Self {
            state: ParserState::OutsideRegion,
            scan: DumpScan::default(),
            region_seen: false,
        }
    }

    /// Scan a whole capture.
    ///
    /// Fails with [`Error::RegionMissing`] when the start marker never
    /// appears; a region that is present but empty yields an empty scan.
    /// Corrupt payloads are recorded per identifier and do not fail the
    /// scan.
    pub fn parse(output: CapturedOutput) -> Result<DumpScan> {
        let mut parser = Self::new();
        for line in output.lines() {
            parser.feed(line);
        }
        parser.finish()
    }

    /// Consume one captured line.
    pub fn feed(&mut self, line: &str) {
        let line = line.trim();
        if line == DUMP_START_MARKER {
            self.region_seen = true;
            // A second start marker inside the region is left alone, like
            // any other unrecognized line.
            if matches!(self.state, ParserState::OutsideRegion) {
                self.state = ParserState::AwaitingPayload { source: None };
            }
            return;
        }
        if line == DUMP_END_MARKER {
            self.leave_region();
            return;
        }

        match std::mem::replace(&mut self.state, ParserState::OutsideRegion) {
            ParserState::OutsideRegion => {
                self.state = ParserState::OutsideRegion;
            }
            ParserState::AwaitingPayload { source } => {
                if let Some(announced) = strip_prefix(line, FILE_PREFIX) {
                    self.state = ParserState::AwaitingPayload {
                        source: Some(announced),
                    };
                } else if let Some(chunk) = strip_prefix(line, DATA_PREFIX) {
                    match source {
                        // Data before any FILE: line has no home; drop it.
                        None => self.state = ParserState::AwaitingPayload { source: None },
                        Some(source) if chunk.is_empty() => {
                            self.state = ParserState::AwaitingPayload {
                                source: Some(source),
                            };
                        }
                        Some(source) => {
                            self.state = ParserState::Accumulating { source, hex: chunk };
                        }
                    }
                } else {
                    self.state = ParserState::AwaitingPayload { source };
                }
            }
            ParserState::Accumulating { source, mut hex } => {
                if let Some(announced) = strip_prefix(line, FILE_PREFIX) {
                    self.finalize(source, hex);
                    self.state = ParserState::AwaitingPayload {
                        source: Some(announced),
                    };
                } else if let Some(chunk) = strip_prefix(line, DATA_PREFIX) {
                    hex.push_str(&chunk);
                    self.state = ParserState::Accumulating { source, hex };
                } else {
                    self.state = ParserState::Accumulating { source, hex };
                }
            }
        }
    }

    /// Finish the scan, flushing any still-pending payload.
    pub fn finish(mut self) -> Result<DumpScan> {
        self.leave_region();
        if !self.region_seen {
            return Err(Error::RegionMissing);
        }
        Ok(self.scan)
    }

    fn leave_region(&mut self) {
        if let ParserState::Accumulating { source, hex } =
            std::mem::replace(&mut self.state, ParserState::OutsideRegion)
        {
            self.finalize(source, hex);
        }
    }

    /// The flush transition: decode the accumulator and record the result.
    fn finalize(&mut self, source: String, hex: String) {
        match Artifact::from_hex(source.as_str(), &hex) {
            Ok(artifact) => {
                debug!(
                    "reconstructed {} ({} bytes)",
                    artifact.source,
                    artifact.data.len()
                );
                match self
                    .scan
                    .artifacts
                    .iter_mut()
                    .find(|existing| existing.source == artifact.source)
                {
                    // Cumulative re-dumps are legitimate: last write wins,
                    // first-finalized position is kept.
                    Some(existing) => existing.data = artifact.data,
                    None => self.scan.artifacts.push(artifact),
                }
            }
            Err(err) => {
                error!("corrupt coverage payload for {}: {}", source, err);
                self.scan.corrupt.push(source);
            }
        }
    }
}

fn strip_prefix(line: &str, prefix: &str) -> Option<String> {
    line.strip_prefix(prefix).map(|rest| rest.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_lines(lines: &[&str]) -> Result<DumpScan> {
        DumpParser::parse(CapturedOutput::from_text(lines.join("\n")))
    }

    #[test]
    fn no_start_marker_is_a_hard_failure() {
        let result = parse_lines(&["boot banner", "FILE: a.cpp", "DATA: 48"]);
        assert!(matches!(result, Err(Error::RegionMissing)));
    }

    #[test]
    fn empty_region_is_distinct_from_no_region() -> Result<()> {
        let scan = parse_lines(&[DUMP_START_MARKER, DUMP_END_MARKER])?;
        assert!(scan.artifacts.is_empty());
        assert!(scan.corrupt.is_empty());
        Ok(())
    }

    #[test]
    fn reconstructs_multiple_files() -> Result<()> {
        let scan = parse_lines(&[
            DUMP_START_MARKER,
            "FILE: a.cpp",
            "DATA: 48",
            "DATA: 65",
            "FILE: b.cpp",
            "DATA: 00",
            DUMP_END_MARKER,
        ])?;
        assert_eq!(scan.artifacts.len(), 2);
        assert_eq!(scan.artifacts[0].source, "a.cpp");
        assert_eq!(scan.artifacts[0].data, vec![0x48, 0x65]);
        assert_eq!(scan.artifacts[1].source, "b.cpp");
        assert_eq!(scan.artifacts[1].data, vec![0x00]);
        Ok(())
    }

    #[test]
    fn data_lines_concatenate_in_order() -> Result<()> {
        let scan = parse_lines(&[
            DUMP_START_MARKER,
            "FILE: a.cpp",
            "DATA: 0102",
            "DATA: 0304",
            DUMP_END_MARKER,
        ])?;
        assert_eq!(scan.artifacts[0].data, vec![0x01, 0x02, 0x03, 0x04]);
        Ok(())
    }

    #[test]
    fn redeclared_file_without_data_keeps_the_prior_payload() -> Result<()> {
        let scan = parse_lines(&[
            DUMP_START_MARKER,
            "FILE: a.cpp",
            "DATA: 48",
            "FILE: a.cpp",
            DUMP_END_MARKER,
        ])?;
        assert_eq!(scan.artifacts.len(), 1);
        assert_eq!(scan.artifacts[0].data, vec![0x48]);
        Ok(())
    }

    #[test]
    fn declared_but_empty_file_is_replaced_silently() -> Result<()> {
        let scan = parse_lines(&[
            DUMP_START_MARKER,
            "FILE: a.cpp",
            "FILE: b.cpp",
            "DATA: 00",
            DUMP_END_MARKER,
        ])?;
        assert_eq!(scan.artifacts.len(), 1);
        assert_eq!(scan.artifacts[0].source, "b.cpp");
        Ok(())
    }

    #[test]
    fn corrupt_payload_is_local_to_its_identifier() -> Result<()> {
        let scan = parse_lines(&[
            DUMP_START_MARKER,
            "FILE: a.cpp",
            "DATA: 4",
            "FILE: b.cpp",
            "DATA: 00",
            DUMP_END_MARKER,
        ])?;
        assert_eq!(scan.corrupt, vec!["a.cpp"]);
        assert_eq!(scan.artifacts.len(), 1);
        assert_eq!(scan.artifacts[0].source, "b.cpp");
        Ok(())
    }

    #[test]
    fn duplicate_identifier_last_write_wins_in_place() -> Result<()> {
        let scan = parse_lines(&[
            DUMP_START_MARKER,
            "FILE: a.cpp",
            "DATA: 48",
            "FILE: b.cpp",
            "DATA: 00",
            "FILE: a.cpp",
            "DATA: ff",
            DUMP_END_MARKER,
        ])?;
        assert_eq!(scan.artifacts.len(), 2);
        assert_eq!(scan.artifacts[0].source, "a.cpp");
        assert_eq!(scan.artifacts[0].data, vec![0xff]);
        assert_eq!(scan.artifacts[1].source, "b.cpp");
        Ok(())
    }

    #[test]
    fn missing_end_marker_flushes_at_end_of_stream() -> Result<()> {
        let scan = parse_lines(&[DUMP_START_MARKER, "FILE: a.cpp", "DATA: 48"])?;
        assert_eq!(scan.artifacts.len(), 1);
        assert_eq!(scan.artifacts[0].data, vec![0x48]);
        Ok(())
    }

    #[test]
    fn lines_outside_the_region_are_ignored() -> Result<()> {
        let scan = parse_lines(&[
            "FILE: ignored.cpp",
            "DATA: aa",
            DUMP_START_MARKER,
            "VERSION: 42411c28",
            "FILE: a.cpp",
            "DATA: 48",
            DUMP_END_MARKER,
            "FILE: late.cpp",
            "DATA: bb",
        ])?;
        assert_eq!(scan.artifacts.len(), 1);
        assert_eq!(scan.artifacts[0].source, "a.cpp");
        Ok(())
    }

    #[test]
    fn lines_are_trimmed_before_matching() -> Result<()> {
        let start = format!("  {DUMP_START_MARKER}  ");
        let end = format!("\t{DUMP_END_MARKER}");
        let scan = parse_lines(&[start.as_str(), "  FILE: a.cpp  ", "  DATA: 48  ", end.as_str()])?;
        assert_eq!(scan.artifacts.len(), 1);
        assert_eq!(scan.artifacts[0].data, vec![0x48]);
        Ok(())
    }

    #[test]
    fn data_before_any_file_line_is_dropped() -> Result<()> {
        let scan = parse_lines(&[
            DUMP_START_MARKER,
            "DATA: aa",
            "FILE: a.cpp",
            "DATA: 48",
            DUMP_END_MARKER,
        ])?;
        assert_eq!(scan.artifacts.len(), 1);
        assert_eq!(scan.artifacts[0].data, vec![0x48]);
        Ok(())
    }
}
