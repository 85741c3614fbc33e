//! INSERT assembler.

use crate::cond::check_key;
use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident::ColumnRef;
use crate::qb::statement::Statement;
use crate::qb::traits::{MutationQb, SqlQb};
use crate::qb::{compile, write_columns, write_comment, write_returning};
use crate::table::TableRef;
use crate::value::Value;
use std::sync::Arc;

/// Leading verb of an INSERT statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertVerb {
    #[default]
    Insert,
    InsertIgnore,
    Replace,
}

impl InsertVerb {
    fn keyword(self) -> &'static str {
        match self {
            InsertVerb::Insert => "INSERT",
            InsertVerb::InsertIgnore => "INSERT IGNORE",
            InsertVerb::Replace => "REPLACE",
        }
    }
}

/// INSERT assembler.
///
/// Rows are appended with [`InsertQb::values`]; single-row statements can be
/// written column by column with [`InsertQb::set`]. The two styles cannot be
/// mixed in one statement.
#[derive(Clone, Debug, Default)]
pub struct InsertQb {
    config: Config,
    dialect: Option<Arc<dyn Dialect>>,
    verb: InsertVerb,
    table: Option<TableRef>,
    columns: Vec<ColumnRef>,
    rows: Vec<Vec<Value>>,
    by_column: bool,
    by_row: bool,
    returning: Vec<ColumnRef>,
    comment: Option<String>,
}

impl InsertQb {
    /// Create an empty INSERT assembler.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Override the dialect for this statement only.
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Some(Arc::new(dialect));
        self
    }

    pub fn dialect_arc(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Target table.
    pub fn into_table(mut self, table: impl Into<TableRef>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// `INSERT IGNORE` instead of `INSERT`.
    pub fn ignore(mut self) -> Self {
        self.verb = InsertVerb::InsertIgnore;
        self
    }

    /// `REPLACE` instead of `INSERT`.
    pub fn replace(mut self) -> Self {
        self.verb = InsertVerb::Replace;
        self
    }

    /// Append target columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnRef>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one row of values.
    pub fn values<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self.by_row = true;
        self
    }

    /// Set one column of a single-row insert.
    ///
    /// Building fails if the statement also uses [`InsertQb::values`].
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.by_column = true;
        self.columns.push(ColumnRef::parse(column));
        match self.rows.first_mut() {
            Some(row) => row.push(value.into()),
            None => self.rows.push(vec![value.into()]),
        }
        self
    }

    /// Set one column if the value is present.
    pub fn set_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set RETURNING columns (dialects with RETURNING only).
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnRef>,
    {
        self.returning.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Attach a trailing `/* comment */`.
    pub fn comment(mut self, text: &str) -> Self {
        self.comment = Some(text.to_string());
        self
    }

    fn validate(&self) -> SqlResult<usize> {
        let Some(table) = &self.table else {
            return Err(SqlError::build("INSERT requires a target table"));
        };
        if table.name.trim().is_empty() {
            return Err(SqlError::build("INSERT requires a target table"));
        }
        if self.by_column && self.by_row {
            return Err(SqlError::build(
                "INSERT cannot mix set() with values(); use columns() and values() for several rows",
            ));
        }
        self.columns.iter().try_for_each(check_key)?;

        let arity = if self.columns.is_empty() {
            self.rows.first().map(Vec::len).unwrap_or(0)
        } else {
            self.columns.len()
        };
        if arity == 0 {
            return Err(SqlError::build("INSERT requires at least one column or value"));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != arity {
                return Err(SqlError::build(format!(
                    "INSERT row {} has {} values, expected {}",
                    i + 1,
                    row.len(),
                    arity
                )));
            }
        }
        Ok(arity)
    }
}

impl SqlQb for InsertQb {
    fn build(&self) -> SqlResult<Statement> {
        let arity = self.validate()?;
        let dialect = self.config.resolve_dialect(self.dialect.as_ref());
        compile(dialect, |out, args| {
            out.push_str(self.verb.keyword());
            out.push_str(" INTO ");
            if let Some(table) = &self.table {
                table.write_sql(out, args.dialect());
            }
            if !self.columns.is_empty() {
                out.push_str(" (");
                write_columns(out, &self.columns, args.dialect());
                out.push(')');
            }
            out.push_str(" VALUES ");

            if self.rows.is_empty() {
                // Template row: placeholders only, nothing bound.
                out.push('(');
                for i in 0..arity {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&args.dialect().placeholder(i + 1));
                }
                out.push(')');
            }
            for (r, row) in self.rows.iter().enumerate() {
                if r > 0 {
                    out.push_str(", ");
                }
                out.push('(');
                for (i, value) in row.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    args.push_into(out, value.clone());
                }
                out.push(')');
            }

            write_returning(out, &self.returning, args.dialect())?;
            write_comment(out, self.comment.as_deref());
            Ok(())
        })
    }
}

impl MutationQb for InsertQb {}
