//! Backend capability declarations
//!
//! Every compiler declares one `BackendProfile`. The engine reads it once,
//! when the pager is created, and never inspects backend types at run time.

use std::fmt;

/// How cursor state travels between page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// A backend-issued token is attached to each request and replaced from
    /// each response
    StatefulCursor,
    /// Offset and size are recomputed and sent fresh on every request
    Stateless,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::StatefulCursor => "stateful_cursor",
            ExecutionStrategy::Stateless => "stateless",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "stateful_cursor" => Some(ExecutionStrategy::StatefulCursor),
            "stateless" => Some(ExecutionStrategy::Stateless),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where `skip` and `limit` are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Windowing {
    /// Backend executes both skip and limit
    Native,
    /// Backend executes `skip + limit` as its limit; skip is discarded by
    /// the engine
    NativeLimitOnly,
    /// Engine discards skipped rows and truncates at limit
    ClientSide,
}

impl Windowing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Windowing::Native => "native",
            Windowing::NativeLimitOnly => "native_limit_only",
            Windowing::ClientSide => "client_side",
        }
    }
}

/// Multi-key sort handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSupport {
    /// Every sort key is applied natively
    MultiKey,
    /// Only the first key is native; the engine stable-sorts each fetched
    /// page by the full key list
    SingleKeyWithPageSort,
    /// Only one key; more are rejected
    SingleKey,
}

/// Declared capabilities of one backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendProfile {
    /// Backend name used in errors and logs
    pub backend: &'static str,
    pub strategy: ExecutionStrategy,
    pub windowing: Windowing,
    pub sort: SortSupport,
}

impl BackendProfile {
    /// Largest number of sort keys accepted, `None` for unlimited
    pub fn max_sort_keys(&self) -> Option<usize> {
        match self.sort {
            SortSupport::SingleKey => Some(1),
            _ => None,
        }
    }

    /// Returns true if the engine must discard `skip` rows itself
    pub fn skips_client_side(&self) -> bool {
        !matches!(self.windowing, Windowing::Native)
    }
}
