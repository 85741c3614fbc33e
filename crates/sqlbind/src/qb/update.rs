//! UPDATE assembler.

use crate::args::Args;
use crate::cond::{check_key, Cond, CondGroup};
use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident::ColumnRef;
use crate::qb::statement::Statement;
use crate::qb::traits::{MutationQb, SqlQb};
use crate::qb::{compile, impl_where_shortcuts, write_columns, write_comment, write_returning};
use crate::table::{Join, JoinKind, TableRef, Tables};
use crate::value::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Assignment {
    /// `column=?`
    Value(Cond),
    /// `column=<raw sql>`
    Raw { column: ColumnRef, expr: String },
    /// `column=<template with ? markers>`
    Expr { column: ColumnRef, expr: Cond },
}

impl Assignment {
    fn check(&self) -> SqlResult<()> {
        match self {
            Assignment::Value(cond) => cond.check(),
            Assignment::Raw { column, .. } => check_key(column),
            Assignment::Expr { column, expr } => {
                check_key(column)?;
                expr.check()
            }
        }
    }

    fn write_sql(&self, out: &mut String, args: &mut Args) {
        match self {
            Assignment::Value(cond) => cond.write_sql(out, args),
            Assignment::Raw { column, expr } => {
                column.write_sql(out, args.dialect());
                out.push('=');
                out.push_str(expr);
            }
            Assignment::Expr { column, expr } => {
                column.write_sql(out, args.dialect());
                out.push('=');
                expr.write_sql(out, args);
            }
        }
    }
}

/// UPDATE assembler.
#[derive(Clone, Debug, Default)]
pub struct UpdateQb {
    config: Config,
    dialect: Option<Arc<dyn Dialect>>,
    tables: Tables,
    joins: Vec<Join>,
    assignments: Vec<Assignment>,
    from: Tables,
    where_group: CondGroup,
    order_by: Vec<ColumnRef>,
    limit: Option<u64>,
    returning: Vec<ColumnRef>,
    comment: Option<String>,
}

impl UpdateQb {
    /// Create an empty UPDATE assembler.
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

    /// Add a table to update.
    pub fn table(mut self, table: impl Into<TableRef>) -> Self {
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

    // ==================== SET ====================

    /// SET column = value
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.assignments.push(Assignment::Value(Cond::eq(column, value)));
        self
    }

    /// SET column = value, only if the value is present.
    pub fn set_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// SET column = <raw SQL expression>
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        self.assignments.push(Assignment::Raw {
            column: ColumnRef::parse(column),
            expr: expr.to_string(),
        });
        self
    }

    /// SET column = <expression with `?` markers>
    ///
    /// ```ignore
    /// qb::update("t").set_expr("hits", "hits + ?", [1])
    /// ```
    pub fn set_expr<V: Into<Value>>(
        mut self,
        column: &str,
        expr: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.assignments.push(Assignment::Expr {
            column: ColumnRef::parse(column),
            expr: Cond::expr(expr, values),
        });
        self
    }

    /// Add an `UPDATE ... FROM` table.
    pub fn from(mut self, table: impl Into<TableRef>) -> Self {
        self.from.add(table.into());
        self
    }

    /// Add ORDER BY (MySQL single-table updates).
    pub fn order_by(mut self, column: impl Into<ColumnRef>) -> Self {
        self.order_by.push(column.into());
        self
    }

    /// Set LIMIT (MySQL single-table updates).
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

    fn validate(&self) -> SqlResult<()> {
        if self.tables.is_empty() {
            return Err(SqlError::build("UPDATE requires a table"));
        }
        if self.assignments.is_empty() {
            return Err(SqlError::build("UPDATE requires at least one SET value"));
        }
        self.assignments.iter().try_for_each(Assignment::check)?;
        self.joins.iter().try_for_each(Join::check)?;
        self.where_group.check()
    }
}

impl_where_shortcuts!(UpdateQb);

impl SqlQb for UpdateQb {
    fn build(&self) -> SqlResult<Statement> {
        self.validate()?;
        let dialect = self.config.resolve_dialect(self.dialect.as_ref());
        if self.limit.is_some() && dialect.offset_fetch_paging() {
            return Err(SqlError::build(format!(
                "UPDATE ... LIMIT is not supported by the {} dialect",
                dialect.name()
            )));
        }
        compile(dialect, |out, args| {
            out.push_str("UPDATE ");
            self.tables.write_sql(out, args.dialect());
            for join in &self.joins {
                join.write_sql(out, args);
            }

            out.push_str(" SET ");
            for (i, assignment) in self.assignments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                assignment.write_sql(out, args);
            }

            if !self.from.is_empty() {
                out.push_str(" FROM ");
                self.from.write_sql(out, args.dialect());
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

impl MutationQb for UpdateQb {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres, SqlServer};
    use crate::qb::update;

    #[test]
    fn test_update_basic() {
        let stmt = update("users").set("status", "inactive").eq("id", 1).build().unwrap();
        assert_eq!(stmt.sql, "UPDATE users SET status=? WHERE id=?");
        assert_eq!(stmt.args, vec![Value::from("inactive"), Value::Int(1)]);
    }

    #[test]
    fn test_set_numbering_precedes_where() {
        let stmt = update("users")
            .set("a", 1)
            .set_expr("hits", "hits + ?", [2])
            .set_raw("updated_at", "NOW()")
            .eq("id", 3)
            .returning(["id"])
            .dialect(Postgres)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"UPDATE "users" SET "a"=$1, "hits"=hits + $2, "updated_at"=NOW() WHERE "id"=$3 RETURNING "id""#
        );
        let expected: Vec<Value> = (1..=3).map(Value::Int).collect();
        assert_eq!(stmt.args, expected);
    }

    #[test]
    fn test_update_join_order_limit() {
        let stmt = update("t1")
            .inner_join("t2", "t1.id", "t2.t1_id")
            .set("t1.x", "y")
            .gt("t2.n", 5)
            .order_by("t1.id")
            .limit(10)
            .dialect(MySql)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE `t1` INNER JOIN `t2` ON `t1`.`id`=`t2`.`t1_id` SET `t1`.`x`=? WHERE `t2`.`n`>? ORDER BY `t1`.`id` LIMIT 10"
        );
    }

    #[test]
    fn test_update_from() {
        let stmt = update("a")
            .set("v", 1)
            .from("b")
            .and_where(Cond::key_eq("a.id", "b.id"))
            .dialect(Postgres)
            .build()
            .unwrap();
        assert_eq!(stmt.sql, r#"UPDATE "a" SET "v"=$1 FROM "b" WHERE "a"."id"="b"."id""#);
    }

    #[test]
    fn test_configuration_errors() {
        assert!(update("t").eq("id", 1).build().unwrap_err().is_build_error());
        assert!(UpdateQb::new().set("a", 1).build().unwrap_err().is_build_error());
        assert!(update("t").set("", 1).build().unwrap_err().is_build_error());
    }

    #[test]
    fn test_set_expr_arity_mismatch() {
        let short = update("t").set_expr("hits", "hits + ? * ?", [1]).dialect(Postgres);
        assert!(short.build().unwrap_err().is_build_error());
        let long = update("t").set_expr("hits", "hits + 1", [1]);
        assert!(long.build().unwrap_err().is_build_error());
    }

    #[test]
    fn test_limit_rejected_for_offset_fetch_dialect() {
        let err = update("t").set("a", 1).limit(5).dialect(SqlServer).build().unwrap_err();
        assert!(err.is_build_error());

        let stmt = update("t").set("a", 1).dialect(SqlServer).build().unwrap();
        assert_eq!(stmt.sql, "UPDATE [t] SET [a]=@p1");
    }
}
