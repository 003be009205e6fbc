//! Typed values
//!
//! `Value` is the tagged union carried by every attribute and condition
//! operand. Coercions to Rust types go through `FromValue` and never lose
//! information silently.

mod convert;
mod value;

pub use convert::FromValue;
pub use value::{Value, ValueKind};
