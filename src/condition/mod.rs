//! Backend-agnostic condition language
//!
//! Leaves: EQUAL, GREATER, GREATER_EQUAL, LESSER, LESSER_EQUAL, BETWEEN, IN,
//! LIKE. Composites: AND, OR, NOT.
//!
//! Operands are never coerced against the attribute's runtime type here;
//! mismatches surface from the backend.

mod ast;

pub use ast::{Condition, Connective, Operator, Predicate};
