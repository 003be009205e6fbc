//! Pagination cursor state
//!
//! The cursor belongs to exactly one in-flight execution. It is deliberately
//! not `Clone`: two executions of the same logical query each start from a
//! fresh cursor.

/// Opaque continuation token plus exhaustion flag
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    token: Option<Vec<u8>>,
    exhausted: bool,
}

impl Cursor {
    /// Fresh cursor: no token, not exhausted
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend token to resume from, if any
    pub fn token(&self) -> Option<&[u8]> {
        self.token.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns true before the first page has been fetched
    pub fn is_fresh(&self) -> bool {
        self.token.is_none() && !self.exhausted
    }

    /// Stores the token returned with the latest page
    pub(crate) fn advance(&mut self, token: Option<Vec<u8>>) {
        self.token = token;
    }

    /// Marks the cursor as terminal and drops the token
    pub(crate) fn exhaust(&mut self) {
        self.token = None;
        self.exhausted = true;
    }
}
