//! DELETE assembler.

use crate::cond::CondGroup;
use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident::ColumnRef;
use crate::qb::statement::Statement;
use crate::qb::traits::{MutationQb, SqlQb};
use crate::qb::{compile, impl_where_shortcuts, write_columns, write_comment, write_returning};
use crate::table::{Join, JoinKind, TableRef, Tables};
use std::sync::Arc;

/// DELETE assembler.
///
/// `DELETE [targets] FROM tables [joins] [WHERE ...]`. The target list names
/// which of several joined tables lose rows.
#[derive(Clone, Debug, Default)]
pub struct DeleteQb {
    config: Config,
    dialect: Option<Arc<dyn Dialect>>,
    targets: Vec<ColumnRef>,
    tables: Tables,
    joins: Vec<Join>,
    where_group: CondGroup,
    order_by: Vec<ColumnRef>,
    limit: Option<u64>,
    returning: Vec<ColumnRef>,
    comment: Option<String>,
}

impl DeleteQb {
    /// Create an empty DELETE assembler.
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

    /// Name the tables whose rows are removed (multi-table deletes).
    pub fn targets<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnRef>,
    {
        self.targets.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Add a FROM table.
    pub fn from(mut self, table: impl Into<TableRef>) -> Self {
        self.tables.add(table.into());
        self
    }

    /// Add a join.
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Add `INNER JOIN table ON left = right`.
    pub fn inner_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(Join::new(JoinKind::Inner, table).on(left, right))
    }

    /// Add `LEFT JOIN table ON left = right`.
    pub fn left_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(Join::new(JoinKind::Left, table).on(left, right))
    }

    /// Add ORDER BY (MySQL single-table deletes).
    pub fn order_by(mut self, column: impl Into<ColumnRef>) -> Self {
        self.order_by.push(column.into());
        self
    }

    /// Set LIMIT (MySQL single-table deletes).
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
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
}

impl_where_shortcuts!(DeleteQb);

impl SqlQb for DeleteQb {
    fn build(&self) -> SqlResult<Statement> {
        if self.tables.is_empty() {
            return Err(SqlError::build("DELETE requires a FROM table"));
        }
        self.joins.iter().try_for_each(Join::check)?;
        self.where_group.check()?;
        let dialect = self.config.resolve_dialect(self.dialect.as_ref());
        if self.limit.is_some() && dialect.offset_fetch_paging() {
            return Err(SqlError::build(format!(
                "DELETE ... LIMIT is not supported by the {} dialect",
                dialect.name()
            )));
        }
        compile(dialect, |out, args| {
            out.push_str("DELETE ");
            if !self.targets.is_empty() {
                write_columns(out, &self.targets, args.dialect());
                out.push(' ');
            }
            out.push_str("FROM ");
            self.tables.write_sql(out, args.dialect());
            for join in &self.joins {
                join.write_sql(out, args);
            }

            let where_sql = self.where_group.compile(args);
            if !where_sql.is_empty() {
                out.push_str(" WHERE ");
                out.push_str(&where_sql);
            }

            if !self.order_by.is_empty() {
                out.push_str(" ORDER BY ");
                write_columns(out, &self.order_by, args.dialect());
            }
            out.push_str(&args.dialect().limit_offset(self.limit, None));

            write_returning(out, &self.returning, args.dialect())?;
            write_comment(out, self.comment.as_deref());
            Ok(())
        })
    }
}

impl MutationQb for DeleteQb {}
