//! Staged, fault-tolerant EPUB parsing.
//!
//! A [`ParsingPipeline`] is an immutable, ordered list of component parsers.
//! Running it opens the archive once, feeds every stage the archive plus the
//! book built so far, and stops at the first stage that fails or records a
//! fatal diagnostic. The partially filled book is returned either way.
//!
//! ```no_run
//! use epub_ocf::{ParsingPipeline, PackageDocumentParser};
//!
//! let pipeline = ParsingPipeline::default().then_with(PackageDocumentParser);
//! let file = std::fs::File::open("book.epub")?;
//! let result = pipeline.parse(file)?;
//! for log in result.logs() {
//!     println!("{}", log);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

extern crate alloc;

use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use std::io::{Read, Seek};

use crate::book::EpubBook;
use crate::diagnostics::{LogCollection, Severity};
use crate::error::EpubError;
use crate::parser::{
    ComponentParse, ComponentParser, ContainerParser, MimetypeParser, PackageDocumentParser,
};
use crate::result::ParsingResult;
use crate::zip::{EpubArchive, ReadSeek, StreamingZip, ZipLimits};

/// Configuration for a pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Diagnostics below this level are not recorded.
    pub minimum_level: Severity,
    /// Optional ZIP safety limits used while reading archive entries.
    ///
    /// When `None`, no explicit file-size caps are enforced by this crate.
    pub zip_limits: Option<ZipLimits>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            minimum_level: Severity::Informational,
            zip_limits: None,
        }
    }
}

impl ParseOptions {
    /// Set the minimum recorded diagnostic level.
    pub fn with_minimum_level(mut self, minimum_level: Severity) -> Self {
        self.minimum_level = minimum_level;
        self
    }

    /// Set explicit ZIP limits.
    pub fn with_zip_limits(mut self, limits: ZipLimits) -> Self {
        self.zip_limits = Some(limits);
        self
    }
}

/// Object-safe view of a [`ComponentParser`] as a pipeline stage.
trait PipelineStep: Send + Sync {
    fn name(&self) -> &str;

    /// Run the stage; `Ok(false)` means the pipeline must stop.
    fn run(
        &self,
        archive: &mut EpubArchive<'_>,
        book: &mut EpubBook,
        logs: &mut LogCollection,
    ) -> Result<bool, EpubError>;
}

struct ParserStep<P>(P);

impl<P: ComponentParser> PipelineStep for ParserStep<P> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn run(
        &self,
        archive: &mut EpubArchive<'_>,
        book: &mut EpubBook,
        logs: &mut LogCollection,
    ) -> Result<bool, EpubError> {
        match self.0.try_parse(archive, book, logs)? {
            ComponentParse::Parsed(data) => {
                self.0.add_to_book(book, data);
                Ok(true)
            }
            ComponentParse::Failed => {
                // At most one fatal per failed stage.
                if !logs.has_fatal_error() {
                    logs.fatal(format!(
                        "Unknown fatal error encountered while running {}.",
                        self.0.name()
                    ));
                }
                Ok(false)
            }
        }
    }
}

/// Ordered, immutable sequence of component parsers.
///
/// Appending returns a new pipeline; the original is never modified, so one
/// pipeline can be shared and run from several threads.
#[derive(Clone)]
pub struct ParsingPipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
}

impl Default for ParsingPipeline {
    /// Mimetype stage followed by the container stage.
    fn default() -> Self {
        Self::start_with(MimetypeParser).then_with(ContainerParser)
    }
}

impl fmt::Debug for ParsingPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsingPipeline")
            .field("steps", &self.stage_names())
            .finish()
    }
}

impl ParsingPipeline {
    /// Pipeline without any stage.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Pipeline with `parser` as its only stage.
    pub fn start_with<P>(parser: P) -> Self
    where
        P: ComponentParser + 'static,
    {
        Self::empty().then_with(parser)
    }

    /// [`Default`](ParsingPipeline::default) stages followed by the package
    /// document stage.
    pub fn full() -> Self {
        Self::default().then_with(PackageDocumentParser)
    }

    /// New pipeline with `parser` appended.
    pub fn then_with<P>(&self, parser: P) -> Self
    where
        P: ComponentParser + 'static,
    {
        let mut steps = self.steps.clone();
        steps.push(Arc::new(ParserStep(parser)));
        Self { steps }
    }

    /// New pipeline with every stage of `other` appended.
    pub fn then_with_pipeline(&self, other: &ParsingPipeline) -> Self {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        Self { steps }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` when the pipeline has no stage.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Parse an EPUB from any `Read + Seek` source with default options.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<ParsingResult<EpubBook>, EpubError> {
        self.parse_with_options(reader, ParseOptions::default())
    }

    /// Parse an EPUB from any `Read + Seek` source with explicit options.
    ///
    /// Conformance problems are reported in the result's logs. `Err` is returned
    /// only when the archive cannot be opened or an entry cannot be read.
    pub fn parse_with_options<R: Read + Seek>(
        &self,
        mut reader: R,
        options: ParseOptions,
    ) -> Result<ParsingResult<EpubBook>, EpubError> {
        let mut logs = LogCollection::new(options.minimum_level);
        logs.debug(format!(
            "Starting EPUB parsing pipeline using {} parsers.",
            self.steps.len()
        ));
        log::debug!("[PIPELINE] Running {} parsers", self.steps.len());

        let mut book = EpubBook::default();
        let mut archive: EpubArchive<'_> =
            StreamingZip::new_with_limits(&mut reader as &mut dyn ReadSeek, options.zip_limits)?;

        for step in &self.steps {
            logs.debug(format!("Running parser {}.", step.name()));

            let mut stage_logs = LogCollection::new(options.minimum_level);
            let succeeded = step.run(&mut archive, &mut book, &mut stage_logs)?;
            stage_logs.merge_into(&mut logs);

            if !succeeded || stage_logs.has_fatal_error() {
                logs.debug(format!(
                    "Encountered fatal error while executing parser {}, stopping early.",
                    step.name()
                ));
                log::warn!("[PIPELINE] Parser {} failed, stopping early", step.name());
                return Ok(ParsingResult::completed(book, logs));
            }
        }

        logs.debug("Parsing completed successfully.");
        log::debug!(
            "[PIPELINE] Completed with highest severity {}",
            logs.highest_severity()
        );
        Ok(ParsingResult::completed(book, logs))
    }
}
