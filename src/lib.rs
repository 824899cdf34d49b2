//! epub_ocf -- Fault-tolerant EPUB container parser with graded diagnostics
//!
//! Reads the Open Container Format layer of an EPUB (the `mimetype` file,
//! `META-INF/container.xml` and the package document root) through a staged
//! pipeline. Conformance problems never abort parsing: each one is recorded as an
//! [`EpubLog`] with a [`Severity`], and the run only stops early on a fatal
//! problem, returning the partially filled [`EpubBook`].
//!
//! # Features
//!
//! - `std` (default) -- enables the streaming ZIP reader, component parsers,
//!   the parsing pipeline and file I/O
//!
//! Without `std`, the diagnostic model, [`ParsingResult`] and the component
//! models with their XML mapping remain available.
//!
//! # Example
//!
//! ```no_run
//! use epub_ocf::{parse_epub_file, Severity};
//!
//! let result = parse_epub_file("book.epub")?;
//! if result.max_log_level() >= Severity::Error {
//!     for log in result.logs() {
//!         eprintln!("{}", log);
//!     }
//! }
//! if let Some(book) = result.try_get_value() {
//!     println!("package document: {:?}", book.package_document_path());
//! }
//! # Ok::<(), epub_ocf::EpubError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(clippy::large_enum_variant, clippy::large_stack_arrays, clippy::redundant_clone)]
#![warn(
    clippy::box_collection,
    clippy::needless_collect,
    clippy::map_clone,
    clippy::implicit_clone,
    clippy::inefficient_to_string
)]

extern crate alloc;

pub mod book;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod mimetype;
pub mod package;
pub mod result;

mod xml;

#[cfg(feature = "std")]
pub mod parser;

#[cfg(feature = "std")]
pub mod pipeline;

#[cfg(feature = "std")]
pub mod resolve;

#[cfg(feature = "std")]
pub mod zip;

// Re-export key types for convenience
pub use book::EpubBook;
#[cfg(feature = "std")]
pub use book::{
    parse_epub_file, parse_epub_file_with_options, parse_epub_reader,
    parse_epub_reader_with_options,
};
pub use container::{ContainerFile, RootFileInformation};
pub use diagnostics::{EpubLog, LogCollection, Severity};
pub use error::{EpubError, ZipError, ZipErrorKind};
pub use mimetype::MimetypeFile;
pub use package::{BaseTextDirection, EpubVersion, PackageDocument};
#[cfg(feature = "std")]
pub use parser::{
    ComponentParse, ComponentParser, ContainerParser, MimetypeParser, PackageDocumentParser,
};
#[cfg(feature = "std")]
pub use pipeline::{ParseOptions, ParsingPipeline};
pub use result::ParsingResult;
#[cfg(feature = "std")]
pub use zip::{EpubArchive, ZipLimits};
