//! Component parsers run by the [`ParsingPipeline`](crate::pipeline::ParsingPipeline).
//!
//! Each parser reads one OCF component out of the archive, records what it
//! finds wrong in the stage's [`LogCollection`], and hands its result to
//! [`ComponentParser::add_to_book`].

extern crate alloc;

use alloc::format;
use alloc::vec::Vec;

use crate::book::EpubBook;
use crate::container::{parse_container_xml, ContainerFile, CONTAINER_PATH};
use crate::diagnostics::LogCollection;
use crate::error::EpubError;
use crate::mimetype::{parse_mimetype, MimetypeFile, MIMETYPE_PATH};
use crate::package::{parse_package_document, PackageDocument};
use crate::zip::{EpubArchive, METHOD_STORED};

/// Outcome of [`ComponentParser::try_parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentParse<T> {
    /// The stage succeeded, optionally producing data for the book.
    Parsed(Option<T>),
    /// The stage cannot continue; the pipeline stops after it.
    Failed,
}

impl<T> ComponentParse<T> {
    /// `true` for [`ComponentParse::Parsed`].
    pub fn is_success(&self) -> bool {
        matches!(self, ComponentParse::Parsed(_))
    }
}

/// One stage of EPUB parsing.
///
/// `try_parse` records conformance problems in `logs` and only returns `Err` when
/// the archive itself cannot be read. `book` holds what earlier stages added.
pub trait ComponentParser: Send + Sync {
    /// Component this parser produces.
    type Component;

    /// Label used in pipeline diagnostics.
    fn name(&self) -> &str;

    /// Read this component from `archive`.
    fn try_parse(
        &self,
        archive: &mut EpubArchive<'_>,
        book: &EpubBook,
        logs: &mut LogCollection,
    ) -> Result<ComponentParse<Self::Component>, EpubError>;

    /// Store parsed data in `book`; `None` leaves the book untouched.
    fn add_to_book(&self, book: &mut EpubBook, data: Option<Self::Component>);
}

/// Read a whole entry located through the entry-name resolver.
///
/// `Ok(None)` when no candidate name matches an entry.
fn read_component(
    archive: &mut EpubArchive<'_>,
    path: &str,
) -> Result<Option<Vec<u8>>, EpubError> {
    let Some(entry) = archive.find_entry(path).cloned() else {
        return Ok(None);
    };
    Ok(Some(archive.read_entry(&entry)?))
}

/// Parses the `mimetype` file.
///
/// A missing or malformed mimetype file is an error but never stops the
/// pipeline; the book then holds [`MimetypeFile::default`] or the text found.
#[derive(Clone, Copy, Debug, Default)]
pub struct MimetypeParser;

impl ComponentParser for MimetypeParser {
    type Component = MimetypeFile;

    fn name(&self) -> &str {
        "MimetypeParser"
    }

    fn try_parse(
        &self,
        archive: &mut EpubArchive<'_>,
        _book: &EpubBook,
        logs: &mut LogCollection,
    ) -> Result<ComponentParse<MimetypeFile>, EpubError> {
        let Some(entry) = archive.find_entry(MIMETYPE_PATH).cloned() else {
            logs.error(format!(
                "Could not find the mimetype file '{}' in the archive.",
                MIMETYPE_PATH
            ));
            return Ok(ComponentParse::Parsed(Some(MimetypeFile::default())));
        };

        if archive.index_of(&entry) != Some(0) {
            logs.warning("The mimetype file should be the first entry in the archive.");
        }
        if entry.method != METHOD_STORED {
            logs.warning("The mimetype file should be stored without compression.");
        }

        let max_size = archive.limits().map(|limits| limits.max_mimetype_size);
        let bytes = match max_size {
            Some(max) if entry.uncompressed_size as usize > max => {
                logs.error(format!(
                    "The mimetype file is {} bytes, larger than the {} bytes allowed.",
                    entry.uncompressed_size, max
                ));
                Vec::new()
            }
            _ => archive.read_entry(&entry)?,
        };

        Ok(ComponentParse::Parsed(Some(parse_mimetype(&bytes, logs))))
    }

    fn add_to_book(&self, book: &mut EpubBook, data: Option<MimetypeFile>) {
        if let Some(mimetype) = data {
            book.mimetype = Some(mimetype);
        }
    }
}

/// Parses `META-INF/container.xml`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContainerParser;

impl ComponentParser for ContainerParser {
    type Component = ContainerFile;

    fn name(&self) -> &str {
        "ContainerParser"
    }

    fn try_parse(
        &self,
        archive: &mut EpubArchive<'_>,
        _book: &EpubBook,
        logs: &mut LogCollection,
    ) -> Result<ComponentParse<ContainerFile>, EpubError> {
        let Some(content) = read_component(archive, CONTAINER_PATH)? else {
            logs.fatal(format!(
                "Could not find the container file '{}' in the archive.",
                CONTAINER_PATH
            ));
            return Ok(ComponentParse::Failed);
        };

        Ok(match parse_container_xml(&content, logs) {
            Some(container) => ComponentParse::Parsed(Some(container)),
            None => ComponentParse::Failed,
        })
    }

    fn add_to_book(&self, book: &mut EpubBook, data: Option<ContainerFile>) {
        if let Some(container) = data {
            book.container = Some(container);
        }
    }
}

/// Parses the root attributes of the package document named by the
/// container's primary rootfile. Must run after [`ContainerParser`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PackageDocumentParser;

impl ComponentParser for PackageDocumentParser {
    type Component = PackageDocument;

    fn name(&self) -> &str {
        "PackageDocumentParser"
    }

    fn try_parse(
        &self,
        archive: &mut EpubArchive<'_>,
        book: &EpubBook,
        logs: &mut LogCollection,
    ) -> Result<ComponentParse<PackageDocument>, EpubError> {
        let Some(container) = book.container.as_ref() else {
            logs.fatal("Cannot locate the package document without a container file.");
            return Ok(ComponentParse::Failed);
        };
        let Some(root) = container.primary_root() else {
            logs.fatal("The container file does not name a package document.");
            return Ok(ComponentParse::Failed);
        };
        let path = root.full_path();

        let Some(content) = read_component(archive, path)? else {
            logs.fatal(format!(
                "Could not find the package document '{}' in the archive.",
                path
            ));
            return Ok(ComponentParse::Failed);
        };

        Ok(match parse_package_document(&content, path, logs) {
            Some(package) => ComponentParse::Parsed(Some(package)),
            None => ComponentParse::Failed,
        })
    }

    fn add_to_book(&self, book: &mut EpubBook, data: Option<PackageDocument>) {
        if let Some(package) = data {
            book.package = Some(package);
        }
    }
}
