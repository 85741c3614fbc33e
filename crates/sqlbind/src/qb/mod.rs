//! Clause assemblers for SELECT / INSERT / UPDATE / DELETE.
//!
//! Every assembler is configured incrementally and turned into an immutable
//! [`Statement`] by `build()`. Building never mutates the assembler, so calling
//! it twice yields identical SQL text and arguments.
//!
//! # Usage
//!
//! ```ignore
//! use sqlbind::{qb, Cond, Config, MySql, SqlQb};
//!
//! let stmt = qb::select(["id", "name"])
//!     .config(Config::with_dialect(MySql))
//!     .from("t")
//!     .and_where(Cond::eq("id", 123))
//!     .build()?;
//! assert_eq!(stmt.sql, "SELECT `id`, `name` FROM `t` WHERE `id`=?");
//!
//! let stmt = qb::insert_into("t").values(["a", "b"]).build()?;
//! assert_eq!(stmt.sql, "INSERT INTO t VALUES (?, ?)");
//! ```

mod delete;
mod insert;
mod paginate;
mod select;
mod statement;
mod traits;
mod update;

pub use delete::DeleteQb;
pub use insert::{InsertQb, InsertVerb};
pub use paginate::{Page, Paginator};
pub use select::{Order, SelectQb};
pub use statement::Statement;
pub use traits::{MutationQb, SqlQb};
pub use update::UpdateQb;

use crate::args::{ArgPool, Args};
use crate::dialect::Dialect;
use crate::error::SqlResult;
use crate::ident::ColumnRef;
use std::sync::Arc;

/// Create a SELECT assembler for the given columns.
///
/// # Example
/// ```ignore
/// let qb = sqlbind::qb::select(["id", "name"]).from("users");
/// ```
pub fn select<I, S>(columns: I) -> SelectQb
where
    I: IntoIterator<Item = S>,
    S: Into<ColumnRef>,
{
    SelectQb::new().columns(columns)
}

/// Create a SELECT assembler with a FROM table and no columns yet.
pub fn select_from(table: &str) -> SelectQb {
    SelectQb::new().from(table)
}

/// Create an INSERT assembler for the given table.
pub fn insert_into(table: &str) -> InsertQb {
    InsertQb::new().into_table(table)
}

/// Create an UPDATE assembler for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new().table(table)
}

/// Create a DELETE assembler for the given table.
///
/// Without conditions the statement deletes every row.
pub fn delete_from(table: &str) -> DeleteQb {
    DeleteQb::new().from(table)
}

/// Compile into a [`Statement`] using pooled argument storage.
pub(crate) fn compile(
    dialect: Arc<dyn Dialect>,
    write: impl FnOnce(&mut String, &mut Args) -> SqlResult<()>,
) -> SqlResult<Statement> {
    let mut pooled = ArgPool::global().acquire(dialect);
    {
        let (sql, args) = pooled.parts();
        write(sql, args)?;
    }
    let dialect = pooled.dialect_arc().clone();
    let (sql, values) = pooled.finish();
    Ok(Statement::new(sql, values, dialect))
}

/// Append a comma separated column list.
pub(crate) fn write_columns(out: &mut String, columns: &[ColumnRef], dialect: &dyn Dialect) {
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        col.write_sql(out, dialect);
    }
}

/// Append ` /* comment */`. A `*/` inside the text cannot close the comment.
pub(crate) fn write_comment(out: &mut String, comment: Option<&str>) {
    if let Some(comment) = comment {
        let text = comment.trim();
        if text.is_empty() {
            return;
        }
        out.push_str(" /* ");
        out.push_str(&text.replace("*/", "* /"));
        out.push_str(" */");
    }
}

/// Append ` RETURNING cols`, or fail when the dialect has no RETURNING.
pub(crate) fn write_returning(
    out: &mut String,
    returning: &[ColumnRef],
    dialect: &dyn Dialect,
) -> SqlResult<()> {
    if returning.is_empty() {
        return Ok(());
    }
    if !dialect.supports_returning() {
        return Err(crate::error::SqlError::build(format!(
            "RETURNING is not supported by the {} dialect",
            dialect.name()
        )));
    }
    out.push_str(" RETURNING ");
    write_columns(out, returning, dialect);
    Ok(())
}

/// WHERE shortcuts shared by the assemblers holding a `where_group`.
macro_rules! impl_where_shortcuts {
    ($ty:ty) => {
        impl $ty {
            /// AND a condition into WHERE.
            pub fn and_where(mut self, cond: $crate::cond::Cond) -> Self {
                self.where_group.push(cond);
                self
            }

            /// AND a condition into WHERE if present.
            pub fn and_where_opt(mut self, cond: Option<$crate::cond::Cond>) -> Self {
                self.where_group.push_opt(cond);
                self
            }

            /// Add WHERE: column = value
            pub fn eq(
                self,
                column: &str,
                value: impl Into<$crate::value::Value>,
            ) -> Self {
                self.and_where($crate::cond::Cond::eq(column, value))
            }

            /// Add WHERE: column <> value
            pub fn ne(
                self,
                column: &str,
                value: impl Into<$crate::value::Value>,
            ) -> Self {
                self.and_where($crate::cond::Cond::ne(column, value))
            }

            /// Add WHERE: column > value
            pub fn gt(
                self,
                column: &str,
                value: impl Into<$crate::value::Value>,
            ) -> Self {
                self.and_where($crate::cond::Cond::gt(column, value))
            }

            /// Add WHERE: column >= value
            pub fn gte(
                self,
                column: &str,
                value: impl Into<$crate::value::Value>,
            ) -> Self {
                self.and_where($crate::cond::Cond::gte(column, value))
            }

            /// Add WHERE: column < value
            pub fn lt(
                self,
                column: &str,
                value: impl Into<$crate::value::Value>,
            ) -> Self {
                self.and_where($crate::cond::Cond::lt(column, value))
            }

            /// Add WHERE: column <= value
            pub fn lte(
                self,
                column: &str,
                value: impl Into<$crate::value::Value>,
            ) -> Self {
                self.and_where($crate::cond::Cond::lte(column, value))
            }

            /// Add WHERE: column IN (values...)
            pub fn in_list<V: Into<$crate::value::Value>>(
                self,
                column: &str,
                values: impl IntoIterator<Item = V>,
            ) -> Self {
                self.and_where($crate::cond::Cond::in_list(column, values))
            }

            /// Add WHERE: column IS NULL
            pub fn is_null(self, column: &str) -> Self {
                self.and_where($crate::cond::Cond::is_null(column))
            }

            /// Add WHERE: column IS NOT NULL
            pub fn is_not_null(self, column: &str) -> Self {
                self.and_where($crate::cond::Cond::is_not_null(column))
            }

            /// Add a raw WHERE condition without params.
            pub fn raw(self, sql: &str) -> Self {
                self.and_where($crate::cond::Cond::raw(sql))
            }
        }
    };
}

pub(crate) use impl_where_shortcuts;
