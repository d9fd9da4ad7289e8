//! Captured simulator output.

/// Combined console output captured from one simulator run.
///
/// Built chunk by chunk while the simulator runs, then handed to the parser
/// as a whole. The chunks are raw pipe reads, so line boundaries may fall
/// anywhere inside them; [`CapturedOutput::lines`] restores them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    text: String,
}

impl CapturedOutput {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a capture from already-collected text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Append a raw chunk of console output.
    pub fn push_chunk(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Iterate over the captured lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// The last `count` lines, for operator diagnosis when no dump region
    /// was found.
    pub fn tail(&self, count: usize) -> Vec<&str> {
        let lines: Vec<&str> = self.text.lines().collect();
        let start = lines.len().saturating_sub(count);
        lines[start..].to_vec()
    }
}
