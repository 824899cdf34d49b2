//! Value/diagnostics pair returned by every parse operation.

extern crate alloc;

use alloc::string::String;

use crate::diagnostics::{EpubLog, LogCollection, Severity};

/// Outcome of a parse: an optional value plus the diagnostics gathered
/// producing it.
///
/// [`try_get_value`](Self::try_get_value) and [`into_value`](Self::into_value)
/// withhold the value once the logs contain a [`Severity::Fatal`] entry.
/// [`partial_value`](Self::partial_value) and
/// [`into_partial`](Self::into_partial) return it regardless, for callers that
/// want whatever was parsed before the run stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsingResult<T> {
    value: Option<T>,
    logs: LogCollection,
}

impl<T> ParsingResult<T> {
    /// Create a result; `None` logs become an empty collection.
    pub fn new(value: Option<T>, logs: Option<LogCollection>) -> Self {
        Self {
            value,
            logs: logs.unwrap_or_default(),
        }
    }

    /// Result holding `value`, gated by `logs`.
    pub fn completed(value: T, logs: LogCollection) -> Self {
        Self::new(Some(value), Some(logs))
    }

    /// Result without a value, carrying `logs`.
    pub fn fatal_for(logs: LogCollection) -> Self {
        Self::new(None, Some(logs))
    }

    /// Result without a value whose only diagnostic is a fatal `message`.
    pub fn fatal_with_message(message: impl Into<String>, minimum_level: Severity) -> Self {
        Self::fatal_for(LogCollection::with_log(EpubLog::fatal(message), minimum_level))
    }

    /// Highest severity recorded in the logs.
    pub fn max_log_level(&self) -> Severity {
        self.logs.highest_severity()
    }

    /// `true` when the logs reached [`Severity::Fatal`].
    pub fn has_fatal_error(&self) -> bool {
        self.logs.has_fatal_error()
    }

    /// Diagnostics gathered while producing this result.
    pub fn logs(&self) -> &LogCollection {
        &self.logs
    }

    /// The value, unless the result carries a fatal error.
    ///
    /// Returns `None` when [`has_fatal_error`](Self::has_fatal_error) is set,
    /// even if a value was stored.
    pub fn try_get_value(&self) -> Option<&T> {
        if self.has_fatal_error() {
            return None;
        }
        self.value.as_ref()
    }

    /// Owned variant of [`try_get_value`](Self::try_get_value).
    pub fn into_value(self) -> Option<T> {
        if self.has_fatal_error() {
            return None;
        }
        self.value
    }

    /// Split into the gated value and the logs.
    pub fn into_parts(self) -> (Option<T>, LogCollection) {
        let fatal = self.has_fatal_error();
        let value = if fatal { None } else { self.value };
        (value, self.logs)
    }

    /// The stored value, ignoring the fatal gate.
    ///
    /// After an early stop this is the partially filled value: whatever the
    /// stages before the failing one produced.
    pub fn partial_value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Owned variant of [`partial_value`](Self::partial_value); also ignores
    /// the fatal gate.
    pub fn into_partial(self) -> Option<T> {
        self.value
    }

    /// Forward this result's logs into `target` (filtered by `target`).
    pub fn copy_logs_to(&self, target: &mut LogCollection) -> &Self {
        self.logs.merge_into(target);
        self
    }

    /// Re-type this result without a value, keeping its logs.
    pub fn as_result_for<U>(self) -> ParsingResult<U> {
        ParsingResult::fatal_for(self.logs)
    }
}
