//! Reconstructed coverage artifacts.

use crate::prelude::*;

/// A reconstructed binary coverage counter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Source identifier as announced by the firmware (path-like).
    pub source: String,
    /// Decoded counter data.
    pub data: Vec<u8>,
}

impl Artifact {
    /// Decode a finalized hex payload into an artifact.
    ///
    /// Fails on an odd-length accumulator or a non-hex digit.
    pub fn from_hex(source: impl Into<String>, hex_data: &str) -> Result<Self> {
        Ok(Self {
            source: source.into(),
            data: hex::decode(hex_data)?,
        })
    }

    /// Flatten the path-like identifier into a single-level file name.
    ///
    /// Separators become underscores and a leading underscore is dropped, so
    /// `/main/test_common.cpp` becomes `main_test_common.cpp`. Returns
    /// `None` when nothing remains.
    pub fn flat_name(&self) -> Option<String> {
        let flat = self.source.replace(['/', '\\'], "_");
        let flat = flat.strip_prefix('_').unwrap_or(&flat);
        if flat.is_empty() {
            None
        } else {
            Some(flat.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_payloads() -> Result<()> {
        let artifact = Artifact::from_hex("a.cpp", "4865")?;
        assert_eq!(artifact.data, vec![0x48, 0x65]);
        Ok(())
    }

    #[test]
    fn rejects_odd_length_payloads() {
        assert!(Artifact::from_hex("a.cpp", "4").is_err());
    }

    #[test]
    fn rejects_non_hex_digits() {
        assert!(Artifact::from_hex("a.cpp", "zz").is_err());
    }

    #[test]
    fn flattens_path_separators() {
        let artifact = Artifact {
            source: String::from("/main/test_common.cpp"),
            data: Vec::new(),
        };
        assert_eq!(
            artifact.flat_name(),
            Some(String::from("main_test_common.cpp"))
        );
    }

    #[test]
    fn flattens_backslash_separators() {
        let artifact = Artifact {
            source: String::from("main\\test_common.cpp"),
            data: Vec::new(),
        };
        assert_eq!(
            artifact.flat_name(),
            Some(String::from("main_test_common.cpp"))
        );
    }

    #[test]
    fn separator_only_identifiers_have_no_name() {
        let artifact = Artifact {
            source: String::from("/"),
            data: Vec::new(),
        };
        assert_eq!(artifact.flat_name(), None);
    }
}
