//! Observability
//!
//! Structured JSON logging with typed events. Observability is read-only
//! and never fails the operation being observed.
//!
//! ```ignore
//! use polyquery::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::PageFetched, &[("collection", "person"), ("rows", "10")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity, LOG_LEVEL_ENV};

/// Log an event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
