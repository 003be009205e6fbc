//! Observable events
//!
//! Events are explicit and typed; each carries its default severity.

use std::fmt;

use super::logger::Severity;

/// Observable events in the query layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Execution
    /// First page of a query is about to be fetched
    QueryStart,
    /// A page came back from a backend
    PageFetched,
    /// A pager reached its terminal state
    QueryExhausted,
    /// Compile, transport or conversion failure ended a query
    QueryFailed,
    /// Single-result query matched several entities
    AmbiguousResult,

    // Setup
    /// A page source was registered on a session
    SourceRegistered,
    /// Settings were resolved
    SettingsLoaded,

    // Key-value map
    /// An entry passed its TTL and was dropped on read
    EntryExpired,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QueryStart => "QUERY_START",
            Event::PageFetched => "PAGE_FETCHED",
            Event::QueryExhausted => "QUERY_EXHAUSTED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::AmbiguousResult => "AMBIGUOUS_RESULT",
            Event::SourceRegistered => "SOURCE_REGISTERED",
            Event::SettingsLoaded => "SETTINGS_LOADED",
            Event::EntryExpired => "ENTRY_EXPIRED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryStart | Event::PageFetched | Event::QueryExhausted => Severity::Trace,
            Event::EntryExpired => Severity::Trace,
            Event::SourceRegistered | Event::SettingsLoaded => Severity::Info,
            Event::AmbiguousResult => Severity::Warn,
            Event::QueryFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
