//! Table references and joins shared by the clause assemblers.

use crate::args::Args;
use crate::cond::{compile_all, Cond};
use crate::dialect::Dialect;
use crate::error::SqlResult;
use crate::ident::ColumnRef;
use crate::value::Value;

/// A table name with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// A table without alias.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// A table with an alias.
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Parse `"users"`, `"users u"` or `"users AS u"`.
    pub fn parse(s: &str) -> Self {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            [name, alias] => Self::aliased(*name, *alias),
            [name, kw, alias] if kw.eq_ignore_ascii_case("as") => Self::aliased(*name, *alias),
            _ => Self::new(s.trim()),
        }
    }

    /// The name other clauses use to qualify this table's columns.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Append `name [AS alias]` to `out`.
    pub fn write_sql(&self, out: &mut String, dialect: &dyn Dialect) {
        ColumnRef::parse(&self.name).write_sql(out, dialect);
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            dialect.write_quoted(out, alias);
        }
    }
}

impl From<&str> for TableRef {
    fn from(s: &str) -> Self {
        TableRef::parse(s)
    }
}

impl From<String> for TableRef {
    fn from(s: String) -> Self {
        TableRef::parse(&s)
    }
}

impl From<(&str, &str)> for TableRef {
    fn from((name, alias): (&str, &str)) -> Self {
        TableRef::aliased(name, alias)
    }
}

/// Ordered, name-deduplicated table list.
///
/// Adding a table that is already present keeps its first position; a newly
/// supplied alias replaces the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    items: Vec<TableRef>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, merging with an existing entry of the same name.
    pub fn add(&mut self, table: TableRef) {
        match self.items.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => {
                if table.alias.is_some() {
                    existing.alias = table.alias;
                }
            }
            None => self.items.push(table),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn first(&self) -> Option<&TableRef> {
        self.items.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableRef> {
        self.items.iter()
    }

    /// Append the comma separated list to `out`.
    pub fn write_sql(&self, out: &mut String, dialect: &dyn Dialect) {
        for (i, table) in self.items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            table.write_sql(out, dialect);
        }
    }
}

/// Kind of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    LeftOuter,
    Right,
    RightOuter,
    Full,
    FullOuter,
    /// Bare `JOIN`.
    Plain,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
            JoinKind::Plain => "JOIN",
        }
    }
}

/// One join: kind, table and AND-ed ON predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Vec<Cond>,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<TableRef>) -> Self {
        Self {
            kind,
            table: table.into(),
            on: Vec::new(),
        }
    }

    /// `ON left = right` between two columns.
    pub fn on(mut self, left: impl Into<ColumnRef>, right: impl Into<ColumnRef>) -> Self {
        self.on.push(Cond::key_eq(left, right));
        self
    }

    /// `ON column = ?` against a bound literal.
    pub fn on_value(mut self, column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        self.on.push(Cond::eq(column, value));
        self
    }

    /// Arbitrary ON predicate.
    pub fn on_cond(mut self, cond: Cond) -> Self {
        self.on.push(cond);
        self
    }

    /// Check the ON predicates; see [`Cond::check`].
    pub fn check(&self) -> SqlResult<()> {
        self.on.iter().try_for_each(Cond::check)
    }

    /// Append ` <KIND> JOIN table [ON ...]` to `out`.
    pub fn write_sql(&self, out: &mut String, args: &mut Args) {
        out.push(' ');
        out.push_str(self.kind.keyword());
        out.push(' ');
        self.table.write_sql(out, args.dialect());
        let on = compile_all(&self.on, args);
        if !on.is_empty() {
            out.push_str(" ON ");
            out.push_str(&on);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};
    use std::sync::Arc;

    #[test]
    fn test_parse_alias_forms() {
        assert_eq!(TableRef::parse("users"), TableRef::new("users"));
        assert_eq!(TableRef::parse("users u"), TableRef::aliased("users", "u"));
        assert_eq!(TableRef::parse("users AS u"), TableRef::aliased("users", "u"));
    }

    #[test]
    fn test_dedup_keeps_position_and_last_alias() {
        let mut tables = Tables::new();
        tables.add(TableRef::aliased("a", "x"));
        tables.add(TableRef::new("b"));
        tables.add(TableRef::aliased("a", "y"));
        tables.add(TableRef::new("a"));
        assert_eq!(tables.len(), 2);
        assert_eq!(tables.first().unwrap().alias.as_deref(), Some("y"));
        let mut out = String::new();
        tables.write_sql(&mut out, &MySql);
        assert_eq!(out, "`a` AS `y`, `b`");
    }

    #[test]
    fn test_join_with_key_and_literal() {
        let join = Join::new(JoinKind::Left, "orders o")
            .on("u.id", "o.user_id")
            .on_value("o.state", "paid");
        let mut args = Args::new(Arc::new(Postgres));
        let mut out = String::new();
        join.write_sql(&mut out, &mut args);
        assert_eq!(
            out,
            r#" LEFT JOIN "orders" AS "o" ON ("u"."id"="o"."user_id" AND "o"."state"=$1)"#
        );
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_join_check_rejects_blank_key() {
        assert!(Join::new(JoinKind::Inner, "o").on("u.id", "").check().is_err());
        assert!(Join::new(JoinKind::Inner, "o").on("u.id", "o.uid").check().is_ok());
    }

    #[test]
    fn test_join_without_on() {
        let mut args = Args::new(Arc::new(MySql));
        let mut out = String::new();
        Join::new(JoinKind::Plain, "t").write_sql(&mut out, &mut args);
        assert_eq!(out, " JOIN `t`");
    }
}
