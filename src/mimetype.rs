//! The OCF `mimetype` file.
//!
//! A plain-text entry at the archive root whose content must be exactly
//! `application/epub+zip`, encoded as UTF-8 without a byte-order mark.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use encoding_rs::{Encoding, UTF_8};

use crate::diagnostics::LogCollection;

/// Archive path of the mimetype file.
pub const MIMETYPE_PATH: &str = "mimetype";

/// Required content of the mimetype file.
pub const EXPECTED_MIMETYPE: &str = "application/epub+zip";

/// Number of characters in [`EXPECTED_MIMETYPE`].
pub const EXPECTED_CONTENT_LENGTH: usize = EXPECTED_MIMETYPE.len();

/// Parsed mimetype file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MimetypeFile {
    mimetype: String,
}

impl Default for MimetypeFile {
    /// Mimetype file holding [`EXPECTED_MIMETYPE`].
    fn default() -> Self {
        Self::new(EXPECTED_MIMETYPE)
    }
}

impl MimetypeFile {
    /// Create a mimetype file with the given content.
    pub fn new(mimetype: impl Into<String>) -> Self {
        Self {
            mimetype: mimetype.into(),
        }
    }

    /// The declared mimetype.
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// `true` when the content equals [`EXPECTED_MIMETYPE`].
    pub fn is_valid(&self) -> bool {
        self.mimetype == EXPECTED_MIMETYPE
    }
}

/// Decode raw mimetype entry bytes, recording deviations in `logs`.
///
/// Always yields a value; validity is reported through
/// [`MimetypeFile::is_valid`] and the diagnostics.
pub fn parse_mimetype(bytes: &[u8], logs: &mut LogCollection) -> MimetypeFile {
    // Only UTF-8 and UTF-16 BOMs are recognised. A UTF-32LE BOM reads as
    // UTF-16LE and the content is then reported as invalid.
    let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((UTF_8, 0));
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);

    let mut chars = text.chars();
    let content: String = chars.by_ref().take(EXPECTED_CONTENT_LENGTH).collect();
    let read = content.chars().count();

    if read != EXPECTED_CONTENT_LENGTH {
        logs.error(format!(
            "Expected {} characters in the mimetype file, but only found {}.",
            EXPECTED_CONTENT_LENGTH, read
        ));
    }
    // With surplus text the whole content is kept; it can never be valid.
    let surplus = chars.next().is_some();
    if surplus {
        logs.error(format!(
            "Expected {} characters in the mimetype file, but found more.",
            EXPECTED_CONTENT_LENGTH
        ));
    }
    if encoding != UTF_8 || bom_len > 0 {
        logs.warning(format!(
            "Expected mimetype file to have encoding '{}', but detected encoding was '{}'.",
            UTF_8.name(),
            readable_encoding(encoding, bom_len)
        ));
    }
    if had_errors {
        logs.warning(format!(
            "The mimetype file is not valid {} text.",
            encoding.name()
        ));
    }

    let mimetype = if surplus {
        MimetypeFile::new(text.into_owned())
    } else {
        MimetypeFile::new(content)
    };
    if !mimetype.is_valid() {
        logs.error(format!(
            "The mimetype file contains invalid content: '{}'.",
            mimetype.mimetype()
        ));
    }
    mimetype
}

fn readable_encoding(encoding: &'static Encoding, bom_len: usize) -> String {
    if bom_len > 0 {
        format!("{} (BOM)", encoding.name())
    } else {
        String::from(encoding.name())
    }
}
