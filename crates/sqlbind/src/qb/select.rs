//! SELECT assembler.

use crate::args::Args;
use crate::cond::{Cond, CondGroup};
use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident::ColumnRef;
use crate::qb::paginate::{Page, Paginator};
use crate::qb::statement::Statement;
use crate::qb::traits::SqlQb;
use crate::qb::{compile, impl_where_shortcuts, write_columns, write_comment};
use crate::record::{record_columns, Record};
use crate::table::{Join, JoinKind, TableRef, Tables};
use std::sync::Arc;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
struct SelectColumn {
    expr: ColumnRef,
    alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct OrderItem {
    column: ColumnRef,
    order: Option<Order>,
}

enum Projection {
    Columns,
    CountAll,
    One,
}

/// SELECT assembler.
#[derive(Clone, Debug, Default)]
pub struct SelectQb {
    config: Config,
    dialect: Option<Arc<dyn Dialect>>,
    distinct: bool,
    columns: Vec<SelectColumn>,
    tables: Tables,
    joins: Vec<Join>,
    where_group: CondGroup,
    group_by: Vec<ColumnRef>,
    having_group: CondGroup,
    order_by: Vec<OrderItem>,
    limit: Option<u64>,
    offset: Option<u64>,
    paginator: Option<Arc<dyn Paginator>>,
    for_update: bool,
    comment: Option<String>,
}

impl SelectQb {
    /// Create an empty SELECT assembler using the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` (default dialect, record separator).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Override the dialect for this statement only.
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Some(Arc::new(dialect));
        self
    }

    /// Override the dialect from a shared handle.
    pub fn dialect_arc(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    // ==================== SELECT columns ====================

    /// Append selected columns. Repeats are kept.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnRef>,
    {
        self.columns.extend(columns.into_iter().map(|c| SelectColumn {
            expr: c.into(),
            alias: None,
        }));
        self
    }

    /// Append one selected column.
    pub fn column(self, column: impl Into<ColumnRef>) -> Self {
        self.columns([column])
    }

    /// Append a raw expression (`COUNT(*)`), emitted verbatim.
    pub fn column_raw(self, expr: &str) -> Self {
        self.column(ColumnRef::raw(expr))
    }

    /// Append `expr AS alias`.
    pub fn column_as(mut self, expr: impl Into<ColumnRef>, alias: &str) -> Self {
        self.columns.push(SelectColumn {
            expr: expr.into(),
            alias: Some(alias.to_string()),
        });
        self
    }

    /// Append every column of record `T`, unqualified.
    pub fn select_record<T: Record + 'static>(self) -> Self {
        self.push_record::<T>(None)
    }

    /// Append every column of record `T`, qualified by `table`.
    pub fn select_record_from<T: Record + 'static>(self, table: &str) -> Self {
        self.push_record::<T>(Some(table))
    }

    fn push_record<T: Record + 'static>(mut self, table: Option<&str>) -> Self {
        let columns = record_columns::<T>(table.unwrap_or(""), &self.config.separator);
        self.columns.extend(columns.iter().map(|col| SelectColumn {
            expr: col.clone(),
            alias: None,
        }));
        self
    }

    /// SELECT DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== FROM / JOIN ====================

    /// Add a FROM table (`"users"`, `"users u"`, `"users AS u"`).
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

    /// Add `RIGHT JOIN table ON left = right`.
    pub fn right_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(Join::new(JoinKind::Right, table).on(left, right))
    }

    /// Add `FULL OUTER JOIN table ON left = right`.
    pub fn full_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(Join::new(JoinKind::FullOuter, table).on(left, right))
    }

    // ==================== Grouping & ordering ====================

    /// Set GROUP BY columns, replacing any previous ones.
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnRef>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// AND a condition into HAVING.
    pub fn having(mut self, cond: Cond) -> Self {
        self.having_group.push(cond);
        self
    }

    /// Add ORDER BY column without direction.
    pub fn order_by(mut self, column: impl Into<ColumnRef>) -> Self {
        self.order_by.push(OrderItem {
            column: column.into(),
            order: None,
        });
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(mut self, column: impl Into<ColumnRef>) -> Self {
        self.order_by.push(OrderItem {
            column: column.into(),
            order: Some(Order::Asc),
        });
        self
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(mut self, column: impl Into<ColumnRef>) -> Self {
        self.order_by.push(OrderItem {
            column: column.into(),
            order: Some(Order::Desc),
        });
        self
    }

    /// Add a raw ORDER BY expression (`"created_at DESC NULLS LAST"`).
    pub fn order_by_raw(mut self, expr: &str) -> Self {
        self.order_by.push(OrderItem {
            column: ColumnRef::raw(expr),
            order: None,
        });
        self
    }

    // ==================== Pagination ====================

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Paginate through an external paginator. Replaces LIMIT/OFFSET.
    pub fn paginate(mut self, paginator: impl Paginator + 'static) -> Self {
        self.paginator = Some(Arc::new(paginator));
        self
    }

    /// Page-number pagination with bound parameters.
    pub fn page(self, page: u64, per_page: u64) -> Self {
        self.paginate(Page::new(page, per_page))
    }

    /// Append `FOR UPDATE`.
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    /// Attach a trailing `/* comment */`.
    pub fn comment(mut self, text: &str) -> Self {
        self.comment = Some(text.to_string());
        self
    }

    // ==================== Build ====================

    fn resolve_dialect(&self) -> Arc<dyn Dialect> {
        self.config.resolve_dialect(self.dialect.as_ref())
    }

    fn validate(&self) -> SqlResult<()> {
        if self.tables.is_empty() {
            return Err(SqlError::build("SELECT requires at least one FROM table"));
        }
        if self.columns.is_empty() {
            return Err(SqlError::build("SELECT requires at least one column"));
        }
        self.check_conditions()
    }

    fn check_conditions(&self) -> SqlResult<()> {
        self.joins.iter().try_for_each(Join::check)?;
        self.where_group.check()?;
        self.having_group.check()
    }

    fn write_core(&self, out: &mut String, args: &mut Args, projection: Projection) {
        out.push_str("SELECT ");
        match projection {
            Projection::CountAll => out.push_str("COUNT(*)"),
            Projection::One => out.push('1'),
            Projection::Columns => {
                if self.distinct {
                    out.push_str("DISTINCT ");
                }
                for (i, col) in self.columns.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    col.expr.write_sql(out, args.dialect());
                    if let Some(alias) = &col.alias {
                        out.push_str(" AS ");
                        args.dialect().write_quoted(out, alias);
                    }
                }
            }
        }

        out.push_str(" FROM ");
        self.tables.write_sql(out, args.dialect());

        for join in &self.joins {
            join.write_sql(out, args);
        }

        let where_sql = self.where_group.compile(args);
        if !where_sql.is_empty() {
            out.push_str(" WHERE ");
            out.push_str(&where_sql);
        }

        if !self.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            write_columns(out, &self.group_by, args.dialect());
        }

        let having_sql = self.having_group.compile(args);
        if !having_sql.is_empty() {
            out.push_str(" HAVING ");
            out.push_str(&having_sql);
        }
    }

    fn write_tail(&self, out: &mut String, args: &mut Args) {
        if !self.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            for (i, item) in self.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                item.column.write_sql(out, args.dialect());
                match item.order {
                    Some(Order::Asc) => out.push_str(" ASC"),
                    Some(Order::Desc) => out.push_str(" DESC"),
                    None => {}
                }
            }
        }

        match &self.paginator {
            Some(paginator) => {
                let fragment = paginator.render(args);
                out.push_str(&fragment);
            }
            None => out.push_str(&args.dialect().limit_offset(self.limit, self.offset)),
        }

        if self.for_update {
            out.push_str(" FOR UPDATE");
        }
        write_comment(out, self.comment.as_deref());
    }

    /// Build a `SELECT COUNT(*)` over the same rows.
    ///
    /// Grouped or DISTINCT queries are wrapped in a subquery so the count is
    /// of result rows rather than source rows. ORDER BY and pagination are
    /// dropped.
    pub fn count_statement(&self) -> SqlResult<Statement> {
        if self.tables.is_empty() {
            return Err(SqlError::build("SELECT requires at least one FROM table"));
        }
        self.check_conditions()?;
        let wrap = self.distinct || !self.group_by.is_empty() || !self.having_group.is_empty();
        compile(self.resolve_dialect(), |out, args| {
            if wrap {
                out.push_str("SELECT COUNT(*) FROM (");
                let inner = if self.distinct && !self.columns.is_empty() {
                    Projection::Columns
                } else {
                    Projection::One
                };
                self.write_core(out, args, inner);
                out.push_str(") AS t");
            } else {
                self.write_core(out, args, Projection::CountAll);
            }
            write_comment(out, self.comment.as_deref());
            Ok(())
        })
    }
}

impl_where_shortcuts!(SelectQb);

impl SqlQb for SelectQb {
    fn build(&self) -> SqlResult<Statement> {
        self.validate()?;
        compile(self.resolve_dialect(), |out, args| {
            self.write_core(out, args, Projection::Columns);
            self.write_tail(out, args);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres, SqlServer};
    use crate::qb::select;
    use crate::value::Value;

    fn pg(qb: SelectQb) -> Statement {
        qb.dialect(Postgres).build().unwrap()
    }

    #[test]
    fn test_simple_select() {
        let stmt = select(["*"]).from("users").build().unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM users");
        assert!(stmt.args.is_empty());
    }

    #[test]
    fn test_select_with_where() {
        let stmt = pg(select(["id"]).from("users").eq("status", "active").gt("age", 18));
        assert_eq!(
            stmt.sql,
            r#"SELECT "id" FROM "users" WHERE ("status"=$1 AND "age">$2)"#
        );
        assert_eq!(stmt.args, vec![Value::from("active"), Value::Int(18)]);
    }

    #[test]
    fn test_select_with_join() {
        let stmt = pg(select(["u.*"])
            .from("users u")
            .inner_join("orders o", "u.id", "o.user_id")
            .eq("u.status", "active"));
        assert_eq!(
            stmt.sql,
            r#"SELECT "u".* FROM "users" AS "u" INNER JOIN "orders" AS "o" ON "u"."id"="o"."user_id" WHERE "u"."status"=$1"#
        );
    }

    #[test]
    fn test_select_with_order_and_limit() {
        let stmt = pg(select(["id"])
            .from("users")
            .order_by_desc("created_at")
            .order_by_raw("id ASC")
            .limit(10)
            .offset(20));
        assert_eq!(
            stmt.sql,
            r#"SELECT "id" FROM "users" ORDER BY "created_at" DESC, id ASC LIMIT 10 OFFSET 20"#
        );
    }

    #[test]
    fn test_group_by_having_numbering() {
        let stmt = pg(select(["user_id"])
            .column_raw("COUNT(*)")
            .from("orders")
            .eq("state", "paid")
            .group_by(["user_id"])
            .having(Cond::gt(ColumnRef::raw("COUNT(*)"), 5)));
        assert_eq!(
            stmt.sql,
            r#"SELECT "user_id", COUNT(*) FROM "orders" WHERE "state"=$1 GROUP BY "user_id" HAVING COUNT(*)>$2"#
        );
    }

    #[test]
    fn test_odd_column_names_are_quoted() {
        let stmt = pg(select(["order date", "größe"])
            .from("t")
            .eq(r#"a"b"#, 1)
            .order_by_asc("user-id"));
        assert_eq!(
            stmt.sql,
            r#"SELECT "order date", "größe" FROM "t" WHERE "a""b"=$1 ORDER BY "user-id" ASC"#
        );
    }

    #[test]
    fn test_group_by_resets() {
        let stmt = select(["a"]).from("t").group_by(["a"]).group_by(["b"]).build().unwrap();
        assert_eq!(stmt.sql, "SELECT a FROM t GROUP BY b");
    }

    #[test]
    fn test_count_statement() {
        let qb = select(["id"]).from("users").eq("status", "active").limit(5);
        let stmt = qb.dialect(Postgres).count_statement().unwrap();
        assert_eq!(stmt.sql, r#"SELECT COUNT(*) FROM "users" WHERE "status"=$1"#);
    }

    #[test]
    fn test_count_with_group_by_wraps() {
        let stmt = select(["user_id"])
            .from("orders")
            .group_by(["user_id"])
            .having(Cond::gt(ColumnRef::raw("COUNT(*)"), 5))
            .count_statement()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(*) FROM (SELECT 1 FROM orders GROUP BY user_id HAVING COUNT(*)>?) AS t"
        );
        assert_eq!(stmt.args, vec![Value::Int(5)]);
    }

    #[test]
    fn test_page_binds_after_where() {
        let stmt = pg(select(["id"]).from("users").eq("a", 1).page(2, 10));
        assert_eq!(
            stmt.sql,
            r#"SELECT "id" FROM "users" WHERE "a"=$1 LIMIT $2 OFFSET $3"#
        );
        assert_eq!(stmt.args, vec![Value::Int(1), Value::Int(10), Value::Int(10)]);
    }

    #[test]
    fn test_sqlserver_paging() {
        let stmt = select(["id"])
            .from("users")
            .order_by("id")
            .limit(10)
            .offset(30)
            .dialect(SqlServer)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT [id] FROM [users] ORDER BY [id] OFFSET 30 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_distinct_alias_lock_comment() {
        let stmt = select(["name"])
            .column_as(ColumnRef::raw("COUNT(*)"), "n")
            .distinct()
            .from("t")
            .for_update()
            .comment("hot path */ DROP")
            .dialect(MySql)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT DISTINCT `name`, COUNT(*) AS `n` FROM `t` FOR UPDATE /* hot path * / DROP */"
        );
    }

    #[test]
    fn test_missing_parts_are_build_errors() {
        assert!(select(["id"]).build().unwrap_err().is_build_error());
        assert!(SelectQb::new().from("t").build().unwrap_err().is_build_error());
    }

    #[test]
    fn test_template_arity_mismatch_fails_build() {
        let short = select(["id"])
            .from("t")
            .and_where(Cond::expr("a = ? AND b = ?", [1]))
            .dialect(MySql);
        assert!(short.build().unwrap_err().is_build_error());
        assert!(short.count_statement().unwrap_err().is_build_error());

        let having = select(["id"])
            .from("t")
            .having(Cond::expr("SUM(x) > ?", [1, 2]));
        assert!(having.build().unwrap_err().is_build_error());

        let on = Cond::expr("u.n > ?", Vec::<i64>::new());
        let join = select(["id"])
            .from("t")
            .join(Join::new(JoinKind::Inner, "u").on_cond(on));
        assert!(join.build().unwrap_err().is_build_error());
    }

    #[test]
    fn test_empty_and_has_no_where() {
        let stmt = select(["id"]).from("t").and_where(Cond::and([])).build().unwrap();
        assert_eq!(stmt.sql, "SELECT id FROM t");
    }
}
