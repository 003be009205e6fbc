//! Document backend (search DSL)
//!
//! Stateless: every request carries a fresh `from`/`size`, and a short page
//! ends the result stream.

mod client;
mod compiler;
mod config;
mod converter;

pub use client::{parse_hits, DocumentIndex, SearchClient, SearchTransport};
pub use compiler::{DocumentCompiler, SearchRequest};
pub use self::config::DocumentSettings;
pub use converter::{DocumentConverter, SearchHit, ENTITY_FIELD, ID_FIELD};

/// Backend name used in profiles and errors
pub const BACKEND: &str = "document";
