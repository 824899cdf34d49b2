//! Severity-graded diagnostics collected while reading an EPUB.
//!
//! Parsers never fail on OCF conformance problems. They record an [`EpubLog`] in a
//! [`LogCollection`] and carry on; the collection keeps a running
//! highest-severity watermark that callers use as the go/no-go gate.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Severity of a diagnostic, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    /// Internal trace output (e.g. which parser is running).
    #[default]
    Debug,
    /// Benign note about the book.
    Informational,
    /// Conformance problem; the book is likely still renderable.
    Warning,
    /// Significant defect; the book is likely broken but checking continues.
    Error,
    /// Checking cannot continue at all.
    Fatal,
}

impl Severity {
    /// Human-readable name of this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "Debug",
            Severity::Informational => "Informational",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic recorded while reading an EPUB.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpubLog {
    severity: Severity,
    message: String,
}

impl EpubLog {
    /// Create a log entry with an explicit severity.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// Developer-only trace entry.
    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, message)
    }

    /// Purely informational entry.
    pub fn informational(message: impl Into<String>) -> Self {
        Self::new(Severity::Informational, message)
    }

    /// Entry warning about a possible problem.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Entry describing a significant defect.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Entry describing a condition that stops parsing.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, message)
    }

    /// Severity of this entry.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Message describing this entry.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EpubLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Ordered, filtered accumulator of [`EpubLog`] entries.
///
/// Entries below [`minimum_level`](Self::minimum_level) are dropped on add and
/// never influence [`highest_severity`](Self::highest_severity). The watermark
/// starts at [`Severity::Debug`] and never decreases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogCollection {
    minimum_level: Severity,
    entries: Vec<EpubLog>,
    highest_severity: Severity,
}

impl Default for LogCollection {
    fn default() -> Self {
        Self::new(Severity::Informational)
    }
}

impl LogCollection {
    /// Create an empty collection that retains entries at or above `minimum_level`.
    pub fn new(minimum_level: Severity) -> Self {
        Self {
            minimum_level,
            entries: Vec::new(),
            highest_severity: Severity::Debug,
        }
    }

    /// Create a collection seeded with a single entry.
    pub fn with_log(log: EpubLog, minimum_level: Severity) -> Self {
        let mut logs = Self::new(minimum_level);
        logs.add(log);
        logs
    }

    /// Create a collection seeded with `logs`, filtered by `minimum_level`.
    pub fn from_logs<I>(logs: I, minimum_level: Severity) -> Self
    where
        I: IntoIterator<Item = EpubLog>,
    {
        let mut collection = Self::new(minimum_level);
        collection.add_all(logs);
        collection
    }

    /// Lowest severity this collection retains.
    pub fn minimum_level(&self) -> Severity {
        self.minimum_level
    }

    /// Highest severity over all accepted entries.
    pub fn highest_severity(&self) -> Severity {
        self.highest_severity
    }

    /// `true` once a [`Severity::Fatal`] entry has been accepted.
    pub fn has_fatal_error(&self) -> bool {
        self.highest_severity >= Severity::Fatal
    }

    /// Accepted entries in insertion order.
    pub fn entries(&self) -> &[EpubLog] {
        &self.entries
    }

    /// Iterate over accepted entries in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, EpubLog> {
        self.entries.iter()
    }

    /// Number of accepted entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no entry has been accepted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of accepted entries with severity `>= severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|log| log.severity >= severity)
            .count()
    }

    fn raise_watermark(&mut self, severity: Severity) {
        if severity > self.highest_severity {
            self.highest_severity = severity;
        }
    }

    /// Append `log` if it meets the minimum level.
    pub fn add(&mut self, log: EpubLog) {
        if log.severity < self.minimum_level {
            return;
        }
        self.raise_watermark(log.severity);
        self.entries.push(log);
    }

    /// Append every entry of `logs` that meets the minimum level.
    ///
    /// The watermark is raised by the maximum of the accepted subset only.
    pub fn add_all<I>(&mut self, logs: I)
    where
        I: IntoIterator<Item = EpubLog>,
    {
        let minimum_level = self.minimum_level;
        let accepted: Vec<EpubLog> = logs
            .into_iter()
            .filter(|log| log.severity >= minimum_level)
            .collect();
        let Some(max) = accepted.iter().map(|log| log.severity).max() else {
            return;
        };
        self.raise_watermark(max);
        self.entries.extend(accepted);
    }

    /// Copy this collection's entries into `other`, applying `other`'s filter.
    pub fn merge_into(&self, other: &mut LogCollection) {
        other.add_all(self.entries.iter().cloned());
    }

    /// Record a [`Severity::Debug`] entry.
    pub fn debug(&mut self, message: impl Into<String>) {
        self.add(EpubLog::debug(message));
    }

    /// Record a [`Severity::Informational`] entry.
    pub fn info(&mut self, message: impl Into<String>) {
        self.add(EpubLog::informational(message));
    }

    /// Record a [`Severity::Warning`] entry.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.add(EpubLog::warning(message));
    }

    /// Record a [`Severity::Error`] entry.
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(EpubLog::error(message));
    }

    /// Record a [`Severity::Fatal`] entry.
    pub fn fatal(&mut self, message: impl Into<String>) {
        self.add(EpubLog::fatal(message));
    }
}

impl<'a> IntoIterator for &'a LogCollection {
    type Item = &'a EpubLog;
    type IntoIter = core::slice::Iter<'a, EpubLog>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for LogCollection {
    type Item = EpubLog;
    type IntoIter = alloc::vec::IntoIter<EpubLog>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Extend<EpubLog> for LogCollection {
    fn extend<I: IntoIterator<Item = EpubLog>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Informational,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    #[test]
    fn test_severity_total_order() {
        for pair in ALL.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should rank below {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_log_display() {
        let log = EpubLog::warning("container.xml has no version");
        assert_eq!(log.to_string(), "[Warning] container.xml has no version");
    }

    #[test]
    fn test_empty_collection_watermark_is_debug() {
        let logs = LogCollection::default();
        assert_eq!(logs.highest_severity(), Severity::Debug);
        assert_eq!(logs.minimum_level(), Severity::Informational);
        assert!(logs.is_empty());
        assert!(!logs.has_fatal_error());
    }

    #[test]
    fn test_add_drops_entries_below_minimum() {
        for minimum in ALL {
            let mut logs = LogCollection::new(minimum);
            for severity in ALL.iter().copied().filter(|s| *s < minimum) {
                logs.add(EpubLog::new(severity, "filtered"));
            }
            assert!(logs.is_empty());
            assert_eq!(logs.highest_severity(), Severity::Debug);
        }
    }

    #[test]
    fn test_add_keeps_order_and_raises_watermark() {
        let mut logs = LogCollection::new(Severity::Debug);
        logs.error("first");
        logs.info("second");
        logs.warning("third");

        let messages: Vec<&str> = logs.iter().map(|l| l.message()).collect();
        assert_eq!(messages, ["first", "second", "third"]);
        assert_eq!(logs.highest_severity(), Severity::Error);
    }

    #[test]
    fn test_watermark_is_monotonic() {
        let mut logs = LogCollection::new(Severity::Debug);
        let sequence = [
            Severity::Warning,
            Severity::Debug,
            Severity::Fatal,
            Severity::Informational,
            Severity::Error,
        ];
        let mut previous = logs.highest_severity();
        for severity in sequence {
            logs.add(EpubLog::new(severity, "entry"));
            assert!(logs.highest_severity() >= previous);
            previous = logs.highest_severity();
        }
        assert_eq!(previous, Severity::Fatal);
    }

    #[test]
    fn test_add_all_watermark_ignores_rejected_entries() {
        let mut logs = LogCollection::new(Severity::Error);
        logs.add_all([
            EpubLog::warning("dropped"),
            EpubLog::debug("dropped"),
        ]);
        assert!(logs.is_empty());
        assert_eq!(logs.highest_severity(), Severity::Debug);

        logs.add_all([EpubLog::warning("dropped"), EpubLog::error("kept")]);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs.highest_severity(), Severity::Error);
    }

    #[test]
    fn test_merge_into_applies_target_filter() {
        let mut stage = LogCollection::new(Severity::Debug);
        stage.debug("running");
        stage.warning("odd version");

        let mut run = LogCollection::new(Severity::Warning);
        stage.merge_into(&mut run);

        assert_eq!(run.len(), 1);
        assert_eq!(run.entries()[0].message(), "odd version");
        assert_eq!(run.highest_severity(), Severity::Warning);
        // The source collection is untouched.
        assert_eq!(stage.len(), 2);
    }

    #[test]
    fn test_count_at_least() {
        let logs = LogCollection::from_logs(
            [
                EpubLog::informational("a"),
                EpubLog::warning("b"),
                EpubLog::error("c"),
            ],
            Severity::Debug,
        );
        assert_eq!(logs.count_at_least(Severity::Warning), 2);
        assert_eq!(logs.count_at_least(Severity::Fatal), 0);
    }

    #[test]
    fn test_with_log_fatal_sets_gate() {
        let logs = LogCollection::with_log(EpubLog::fatal("broken"), Severity::Fatal);
        assert!(logs.has_fatal_error());
        assert_eq!(logs.len(), 1);
    }
}
