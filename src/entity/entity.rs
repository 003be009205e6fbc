//! Named, ordered attribute set

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

use super::attribute::Attribute;

/// A named ordered sequence of attributes.
///
/// Storage is a sequence so iteration follows insertion order, while names
/// stay unique: adding an attribute whose name already exists replaces the
/// old one in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    name: String,
    attributes: Vec<Attribute>,
}

impl Entity {
    /// Creates an empty entity for a collection
    pub fn new(name: impl Into<String>) -> QueryResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(QueryError::invalid_argument(
                "entity collection name must not be empty",
            ));
        }
        Ok(Self {
            name,
            attributes: Vec::new(),
        })
    }

    /// Creates an entity from attributes (later duplicates win)
    pub fn of(
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> QueryResult<Self> {
        let mut entity = Self::new(name)?;
        for attribute in attributes {
            entity.add(attribute);
        }
        Ok(entity)
    }

    /// Builder-style `set`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> QueryResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds an attribute, replacing any attribute with the same name
    pub fn add(&mut self, attribute: Attribute) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name() == attribute.name())
        {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Sets a named value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> QueryResult<()> {
        self.add(Attribute::new(name, value)?);
        Ok(())
    }

    /// Removes an attribute by name
    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        let pos = self.attributes.iter().position(|a| a.name() == name)?;
        Some(self.attributes.remove(pos))
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.find(name).map(Attribute::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn into_attributes(self) -> Vec<Attribute> {
        self.attributes
    }

    /// Compares two entities ignoring attribute order.
    ///
    /// Nested entities are compared the same way; sequences stay
    /// order-sensitive.
    pub fn attribute_set_eq(&self, other: &Entity) -> bool {
        self.name == other.name
            && self.attributes.len() == other.attributes.len()
            && self.attributes.iter().all(|a| {
                other
                    .get(a.name())
                    .is_some_and(|v| value_set_eq(a.value(), v))
            })
    }
}

fn value_set_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Entity(x), Value::Entity(y)) => x.attribute_set_eq(y),
        (Value::Sequence(xs), Value::Sequence(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| value_set_eq(x, y))
        }
        _ => a == b,
    }
}
