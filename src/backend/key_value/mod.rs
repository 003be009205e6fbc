//! Key-value backend (distributed map)
//!
//! Stateful cursor over a position token. Skip and limit run client-side;
//! the map sorts by the first key and the engine sorts each page by the
//! rest. Nested entities cannot be stored.

mod bucket;
mod compiler;
mod config;
mod converter;
mod memory;
mod predicate;
mod record;

pub use bucket::{KeyValueBucket, MapTransport};
pub use compiler::{position_token, KeyValueCompiler, MapQuery};
pub use self::config::KeyValueSettings;
pub use converter::{KeyValueConverter, DEFAULT_KEY_ATTRIBUTE};
pub use memory::{MapProxy, MemoryMap};
pub use predicate::{CompareOp, MapPredicate};
pub use record::{MapRecord, MapValue};

/// Backend name used in profiles and errors
pub const BACKEND: &str = "key_value";
