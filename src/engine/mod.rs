//! Execution engine
//!
//! Backend profiles, the pagination state machine, page-local sorting and
//! the session that routes queries to page sources.

mod pager;
mod profile;
mod session;
mod sorter;

pub use pager::{EntityStream, Pager, PagerState};
pub use profile::{BackendProfile, ExecutionStrategy, SortSupport, Windowing};
pub use session::Session;
pub use sorter::PageSorter;
