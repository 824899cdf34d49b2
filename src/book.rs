//! Parsed EPUB model and high-level entry points.
//!
//! [`EpubBook`] holds whatever the pipeline stages managed to read. The
//! `parse_epub_*` functions run [`ParsingPipeline::full`] for the common
//! "open file, inspect diagnostics, read the book" flow.

#[cfg(feature = "std")]
use std::fs::File;
#[cfg(feature = "std")]
use std::io::{Read, Seek};
#[cfg(feature = "std")]
use std::path::Path;

use crate::container::ContainerFile;
use crate::mimetype::MimetypeFile;
use crate::package::PackageDocument;

#[cfg(feature = "std")]
use crate::error::EpubError;
#[cfg(feature = "std")]
use crate::pipeline::{ParseOptions, ParsingPipeline};
#[cfg(feature = "std")]
use crate::result::ParsingResult;

/// Components read from an EPUB archive.
///
/// Fields stay `None` for stages that did not run or did not produce data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpubBook {
    /// The `mimetype` file.
    pub mimetype: Option<MimetypeFile>,
    /// `META-INF/container.xml`.
    pub container: Option<ContainerFile>,
    /// Root attributes of the primary package document.
    pub package: Option<PackageDocument>,
}

impl EpubBook {
    /// Archive path of the primary package document, as named by the container.
    pub fn package_document_path(&self) -> Option<&str> {
        self.container
            .as_ref()?
            .primary_root()
            .map(|root| root.full_path())
    }
}

/// Parse an EPUB from any `Read + Seek` source.
#[cfg(feature = "std")]
pub fn parse_epub_reader<R: Read + Seek>(reader: R) -> Result<ParsingResult<EpubBook>, EpubError> {
    parse_epub_reader_with_options(reader, ParseOptions::default())
}

/// Parse an EPUB from any `Read + Seek` source with explicit options.
#[cfg(feature = "std")]
pub fn parse_epub_reader_with_options<R: Read + Seek>(
    reader: R,
    options: ParseOptions,
) -> Result<ParsingResult<EpubBook>, EpubError> {
    ParsingPipeline::full().parse_with_options(reader, options)
}

/// Parse an EPUB from a file path.
#[cfg(feature = "std")]
pub fn parse_epub_file<P: AsRef<Path>>(path: P) -> Result<ParsingResult<EpubBook>, EpubError> {
    parse_epub_file_with_options(path, ParseOptions::default())
}

/// Parse an EPUB from a file path with explicit options.
#[cfg(feature = "std")]
pub fn parse_epub_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<ParsingResult<EpubBook>, EpubError> {
    let file = File::open(path)?;
    parse_epub_reader_with_options(file, options)
}
