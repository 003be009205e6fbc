//! Attributes and entities
//!
//! An entity is the generic record every backend converter maps to and from
//! its native row, document or map entry.

mod attribute;
mod entity;

pub use attribute::Attribute;
pub use entity::Entity;
