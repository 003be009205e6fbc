//! Query error types
//!
//! Every failure the query layer can report. Errors are surfaced at the
//! point of detection and are never retried by the engine.

use thiserror::Error;

use crate::value::ValueKind;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query layer errors
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed condition, query or entity (caller bug)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Valid query the target backend cannot express
    #[error("Unsupported query for {backend}: {reason}")]
    UnsupportedQuery {
        backend: &'static str,
        reason: String,
    },

    /// Value could not be converted without loss
    #[error(
        "Conversion failed for attribute '{}': {reason}",
        .attribute.as_deref().unwrap_or("<value>")
    )]
    Conversion {
        attribute: Option<String>,
        reason: String,
    },

    /// Value tag has no encoding on the target backend
    #[error("Unsupported type {kind} for attribute '{attribute}' on {backend}")]
    UnsupportedType {
        attribute: String,
        kind: ValueKind,
        backend: &'static str,
    },

    /// Single-result query matched more than one row
    #[error("Ambiguous result: more than one entity in '{collection}' matched")]
    AmbiguousResult { collection: String },

    /// Backend or network failure, propagated unchanged
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl QueryError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an unsupported query error
    pub fn unsupported_query(backend: &'static str, reason: impl Into<String>) -> Self {
        Self::UnsupportedQuery {
            backend,
            reason: reason.into(),
        }
    }

    /// Create a conversion error not yet tied to an attribute
    pub fn conversion(reason: impl Into<String>) -> Self {
        Self::Conversion {
            attribute: None,
            reason: reason.into(),
        }
    }

    /// Create an unsupported type error
    pub fn unsupported_type(
        backend: &'static str,
        attribute: impl Into<String>,
        kind: ValueKind,
    ) -> Self {
        Self::UnsupportedType {
            attribute: attribute.into(),
            kind,
            backend,
        }
    }

    /// Attaches the offending attribute name to a conversion error.
    ///
    /// Errors that already name an attribute, and other variants, pass through.
    pub fn for_attribute(self, name: &str) -> Self {
        match self {
            Self::Conversion {
                attribute: None,
                reason,
            } => Self::Conversion {
                attribute: Some(name.to_string()),
                reason,
            },
            other => other,
        }
    }

    /// Stable error code for callers and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "QUERY_INVALID_ARGUMENT",
            Self::UnsupportedQuery { .. } => "QUERY_UNSUPPORTED",
            Self::Conversion { .. } => "QUERY_CONVERSION_FAILED",
            Self::UnsupportedType { .. } => "QUERY_UNSUPPORTED_TYPE",
            Self::AmbiguousResult { .. } => "QUERY_AMBIGUOUS_RESULT",
            Self::Transport(_) => "QUERY_TRANSPORT_FAILED",
        }
    }

    /// Attribute name carried by the error, if any
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Conversion { attribute, .. } => attribute.as_deref(),
            Self::UnsupportedType { attribute, .. } => Some(attribute),
            _ => None,
        }
    }
}

/// Failure reported by a backend transport
#[derive(Debug, Error)]
#[error("Transport error: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Create a transport error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error wrapping the underlying cause
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}
