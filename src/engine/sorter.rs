//! Client-side page sorting
//!
//! Used when a backend sorts natively by its first key only. The sort is
//! stable, so rows the backend already ordered keep that order on ties.

use std::cmp::Ordering;

use crate::entity::Entity;
use crate::query::{Sort, SortDirection};
use crate::value::{Value, ValueKind};

/// Sorts entities by a list of sort keys
pub struct PageSorter;

impl PageSorter {
    /// Sorts in place, first key highest priority
    pub fn sort(entities: &mut [Entity], sorts: &[Sort]) {
        if sorts.is_empty() {
            return;
        }
        entities.sort_by(|a, b| Self::compare(a, b, sorts));
    }

    fn compare(a: &Entity, b: &Entity, sorts: &[Sort]) -> Ordering {
        for sort in sorts {
            let ordering =
                Self::compare_values(a.get(&sort.attribute), b.get(&sort.attribute));
            let ordering = match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Ordering rules:
    /// - missing < present
    /// - comparable tags by natural order
    /// - otherwise by tag rank
    pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => a_val
                .compare(b_val)
                .unwrap_or_else(|| Self::rank(a_val.kind()).cmp(&Self::rank(b_val.kind()))),
        }
    }

    fn rank(kind: ValueKind) -> u8 {
        match kind {
            ValueKind::Boolean => 0,
            ValueKind::Integer | ValueKind::Float => 1,
            ValueKind::String => 2,
            ValueKind::Temporal => 3,
            ValueKind::Bytes => 4,
            ValueKind::Sequence => 5,
            ValueKind::Entity => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, age: i64, name: &str) -> Entity {
        Entity::new("person")
            .unwrap()
            .with("id", id)
            .unwrap()
            .with("age", age)
            .unwrap()
            .with("name", name)
            .unwrap()
    }

    fn ids(entities: &[Entity]) -> Vec<i64> {
        entities
            .iter()
            .map(|e| e.get("id").unwrap().to::<i64>().unwrap())
            .collect()
    }

    #[test]
    fn test_secondary_key() {
        let mut page = vec![
            person(1, 30, "Cy"),
            person(2, 30, "Ana"),
            person(3, 20, "Bo"),
        ];
        PageSorter::sort(&mut page, &[Sort::asc("age"), Sort::asc("name")]);
        assert_eq!(ids(&page), vec![3, 2, 1]);
    }

    #[test]
    fn test_descending() {
        let mut page = vec![person(1, 10, "a"), person(2, 30, "b"), person(3, 20, "c")];
        PageSorter::sort(&mut page, &[Sort::desc("age")]);
        assert_eq!(ids(&page), vec![2, 3, 1]);
    }

    #[test]
    fn test_stable_on_ties() {
        let mut page = vec![person(1, 5, "x"), person(2, 5, "x"), person(3, 5, "x")];
        PageSorter::sort(&mut page, &[Sort::asc("age"), Sort::asc("name")]);
        assert_eq!(ids(&page), vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_sorts_first() {
        let mut missing = Entity::new("person").unwrap().with("id", 9).unwrap();
        missing.set("name", "z").unwrap();
        let mut page = vec![person(1, 5, "a"), missing];
        PageSorter::sort(&mut page, &[Sort::asc("age")]);
        assert_eq!(ids(&page), vec![9, 1]);
    }
}
