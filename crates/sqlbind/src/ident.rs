//! Column and table references.
//!
//! A [`ColumnRef`] is either a dotted identifier (`schema.table.column`) whose
//! parts are quoted by the dialect, or a raw expression (`COUNT(*)`,
//! `price * qty`) that is emitted verbatim.
//!
//! Strings always convert to identifiers: they are split on `.` and every
//! part is quoted, escaping embedded quote characters. A bare `*`, or a final
//! `*` part (`t.*`), stays unquoted. Expressions must be spelled out with
//! [`ColumnRef::raw`].

use crate::dialect::Dialect;

/// A column (or table) reference as written into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Dotted identifier, one entry per part.
    Ident(Vec<String>),
    /// Raw SQL expression, emitted verbatim.
    Raw(String),
}

impl ColumnRef {
    /// Parse a user-supplied column string into a dotted identifier.
    pub fn parse(s: &str) -> Self {
        ColumnRef::Ident(s.split('.').map(str::to_string).collect())
    }

    /// A single identifier taken as-is, never split on dots.
    pub fn name(name: impl Into<String>) -> Self {
        ColumnRef::Ident(vec![name.into()])
    }

    /// `table.name`, with `name` taken as one identifier part.
    pub fn qualified(table: Option<&str>, name: impl Into<String>) -> Self {
        match table {
            Some(table) if !table.is_empty() => {
                ColumnRef::Ident(vec![table.to_string(), name.into()])
            }
            _ => ColumnRef::name(name),
        }
    }

    /// A raw expression.
    pub fn raw(expr: impl Into<String>) -> Self {
        ColumnRef::Raw(expr.into())
    }

    /// Whether this reference has no usable name.
    ///
    /// An identifier with any blank part (`""`, `a..b`, `t.`) counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            ColumnRef::Ident(parts) => parts.iter().any(|p| p.trim().is_empty()),
            ColumnRef::Raw(expr) => expr.trim().is_empty(),
        }
    }

    /// Append the rendered reference to `out`.
    pub fn write_sql(&self, out: &mut String, dialect: &dyn Dialect) {
        match self {
            ColumnRef::Raw(expr) => out.push_str(expr),
            ColumnRef::Ident(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        out.push('.');
                    }
                    if part == "*" && i + 1 == parts.len() {
                        out.push('*');
                    } else {
                        dialect.write_quoted(out, part);
                    }
                }
            }
        }
    }

    /// Render the reference in `dialect`.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, dialect);
        out
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        ColumnRef::parse(s)
    }
}

impl From<String> for ColumnRef {
    fn from(s: String) -> Self {
        ColumnRef::parse(&s)
    }
}

impl From<&String> for ColumnRef {
    fn from(s: &String) -> Self {
        ColumnRef::parse(s)
    }
}
