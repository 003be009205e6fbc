//! CQL statements
//!
//! Statements keep their bound values next to the rendered text; operands
//! never appear in the CQL string itself.

use std::fmt::Write;

use crate::query::{Sort, SortDirection};

/// Native column value
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    Text(String),
    BigInt(i64),
    Double(f64),
    Boolean(bool),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
    Blob(Vec<u8>),
    List(Vec<CqlValue>),
    /// User-defined type, fields in declaration order
    Udt(Vec<(String, CqlValue)>),
}

/// Relation operators CQL accepts in a `WHERE` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Like,
}

impl RelationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationOp::Eq => "=",
            RelationOp::Gt => ">",
            RelationOp::Gte => ">=",
            RelationOp::Lt => "<",
            RelationOp::Lte => "<=",
            RelationOp::In => "IN",
            RelationOp::Like => "LIKE",
        }
    }
}

/// Per-request consistency level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl Consistency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Consistency::Any => "ANY",
            Consistency::One => "ONE",
            Consistency::Two => "TWO",
            Consistency::Three => "THREE",
            Consistency::Quorum => "QUORUM",
            Consistency::All => "ALL",
            Consistency::LocalQuorum => "LOCAL_QUORUM",
            Consistency::EachQuorum => "EACH_QUORUM",
            Consistency::Serial => "SERIAL",
            Consistency::LocalSerial => "LOCAL_SERIAL",
            Consistency::LocalOne => "LOCAL_ONE",
        }
    }

    /// Parses a level name, case-insensitively (`local_quorum`, `QUORUM`)
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        [
            Consistency::Any,
            Consistency::One,
            Consistency::Two,
            Consistency::Three,
            Consistency::Quorum,
            Consistency::All,
            Consistency::LocalQuorum,
            Consistency::EachQuorum,
            Consistency::Serial,
            Consistency::LocalSerial,
            Consistency::LocalOne,
        ]
        .into_iter()
        .find(|level| level.as_str() == upper)
    }
}

/// `column op ?` with its bound value
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub column: String,
    pub op: RelationOp,
    pub value: CqlValue,
}

impl Relation {
    pub fn new(column: impl Into<String>, op: RelationOp, value: CqlValue) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }
}

/// Quotes an identifier, doubling embedded quotes
pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn table_ref(keyspace: &str, table: &str) -> String {
    if keyspace.is_empty() {
        quote(table)
    } else {
        format!("{}.{}", quote(keyspace), quote(table))
    }
}

fn render_where(out: &mut String, relations: &[Relation]) {
    for (i, relation) in relations.iter().enumerate() {
        out.push_str(if i == 0 { " WHERE " } else { " AND " });
        let _ = write!(out, "{} {} ?", quote(&relation.column), relation.op.as_str());
    }
}

/// Paged `SELECT`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub keyspace: String,
    pub table: String,
    pub relations: Vec<Relation>,
    pub orderings: Vec<Sort>,
    /// Total row cap, `None` for unbounded
    pub limit: Option<u64>,
    /// Rows per page; `None` asks for every row in one response
    pub page_size: Option<u64>,
    /// Driver paging state from the previous page
    pub paging_state: Option<Vec<u8>>,
    pub allow_filtering: bool,
    /// `None` leaves the session default
    pub consistency: Option<Consistency>,
}

impl SelectStatement {
    pub fn cql(&self) -> String {
        let mut out = format!("SELECT * FROM {}", table_ref(&self.keyspace, &self.table));
        render_where(&mut out, &self.relations);

        for (i, sort) in self.orderings.iter().enumerate() {
            out.push_str(if i == 0 { " ORDER BY " } else { ", " });
            let direction = match sort.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            let _ = write!(out, "{} {}", quote(&sort.attribute), direction);
        }

        if let Some(limit) = self.limit {
            let _ = write!(out, " LIMIT {}", limit);
        }
        if self.allow_filtering {
            out.push_str(" ALLOW FILTERING");
        }
        out
    }

    /// Bound values in placeholder order
    pub fn values(&self) -> Vec<&CqlValue> {
        self.relations.iter().map(|r| &r.value).collect()
    }
}

/// `INSERT`, `UPDATE` or `DELETE` with bound values
#[derive(Debug, Clone, PartialEq)]
pub struct WriteStatement {
    pub cql: String,
    pub values: Vec<CqlValue>,
}

impl WriteStatement {
    pub(super) fn insert(
        keyspace: &str,
        table: &str,
        columns: Vec<(String, CqlValue)>,
        ttl_seconds: Option<u64>,
    ) -> Self {
        let names: Vec<String> = columns.iter().map(|(name, _)| quote(name)).collect();
        let markers = vec!["?"; columns.len()].join(", ");

        let mut cql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table_ref(keyspace, table),
            names.join(", "),
            markers
        );
        if let Some(ttl) = ttl_seconds {
            let _ = write!(cql, " USING TTL {}", ttl);
        }

        Self {
            cql,
            values: columns.into_iter().map(|(_, value)| value).collect(),
        }
    }

    pub(super) fn update(
        keyspace: &str,
        table: &str,
        assignments: Vec<(String, CqlValue)>,
        key: Relation,
    ) -> Self {
        let sets: Vec<String> = assignments
            .iter()
            .map(|(name, _)| format!("{} = ?", quote(name)))
            .collect();

        let mut cql = format!("UPDATE {} SET {}", table_ref(keyspace, table), sets.join(", "));
        let mut values: Vec<CqlValue> = assignments.into_iter().map(|(_, v)| v).collect();

        render_where(&mut cql, std::slice::from_ref(&key));
        values.push(key.value);

        Self { cql, values }
    }

    pub(super) fn delete(
        keyspace: &str,
        table: &str,
        columns: &[String],
        relations: Vec<Relation>,
    ) -> Self {
        let mut cql = String::from("DELETE");
        if !columns.is_empty() {
            let names: Vec<String> = columns.iter().map(|c| quote(c)).collect();
            let _ = write!(cql, " {}", names.join(", "));
        }
        let _ = write!(cql, " FROM {}", table_ref(keyspace, table));
        render_where(&mut cql, &relations);

        Self {
            cql,
            values: relations.into_iter().map(|r| r.value).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_doubles_quotes() {
        assert_eq!(quote("name"), "\"name\"");
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_select_rendering() {
        let statement = SelectStatement {
            keyspace: "app".to_string(),
            table: "person".to_string(),
            relations: vec![
                Relation::new("name", RelationOp::Eq, CqlValue::Text("Ana".to_string())),
                Relation::new("age", RelationOp::Gte, CqlValue::BigInt(18)),
            ],
            orderings: vec![Sort::desc("age")],
            limit: Some(10),
            page_size: Some(5),
            paging_state: None,
            allow_filtering: true,
            consistency: Some(Consistency::LocalQuorum),
        };
        assert_eq!(
            statement.cql(),
            "SELECT * FROM \"app\".\"person\" WHERE \"name\" = ? AND \"age\" >= ? \
             ORDER BY \"age\" DESC LIMIT 10 ALLOW FILTERING"
        );
        assert_eq!(statement.values().len(), 2);
    }

    #[test]
    fn test_insert_with_ttl() {
        let statement = WriteStatement::insert(
            "app",
            "person",
            vec![
                ("id".to_string(), CqlValue::Text("1".to_string())),
                ("age".to_string(), CqlValue::BigInt(3)),
            ],
            Some(60),
        );
        assert_eq!(
            statement.cql,
            "INSERT INTO \"app\".\"person\" (\"id\", \"age\") VALUES (?, ?) USING TTL 60"
        );
        assert_eq!(statement.values.len(), 2);
    }

    #[test]
    fn test_delete_columns() {
        let statement = WriteStatement::delete(
            "",
            "person",
            &["age".to_string()],
            vec![Relation::new("id", RelationOp::Eq, CqlValue::Text("1".to_string()))],
        );
        assert_eq!(statement.cql, "DELETE \"age\" FROM \"person\" WHERE \"id\" = ?");
    }

    #[test]
    fn test_consistency_names() {
        assert_eq!(Consistency::parse("local_quorum"), Some(Consistency::LocalQuorum));
        assert_eq!(Consistency::parse(" One "), Some(Consistency::One));
        assert_eq!(Consistency::parse("most"), None);
        assert_eq!(Consistency::EachQuorum.as_str(), "EACH_QUORUM");
    }
}
