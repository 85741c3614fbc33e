//! Boolean condition trees and their compilation into SQL fragments.
//!
//! [`Cond`] supports:
//! - comparisons against bound values and against other columns
//! - NULL checks, IN / NOT IN lists, BETWEEN
//! - AND / OR / NOT grouping
//! - raw fragments and `?` templates
//!
//! `Cond::compile()` writes dialect placeholders through an [`Args`] as it
//! walks the tree left to right, so placeholder numbering is consistent across
//! arbitrarily nested groups.
//!
//! Malformed nodes are reported by [`Cond::check`], which every assembler runs
//! before compiling: a key with no usable name, or a `?` template whose marker
//! count differs from its value count.
//!
//! Degenerate inputs reduce instead of failing:
//! - an AND/OR with no children (after dropping empty children) compiles to
//!   the empty fragment; with one child it compiles to that child unwrapped
//! - `IN ()` compiles to the dialect's always-false predicate, `NOT IN ()` to
//!   the always-true one, binding nothing

use crate::args::Args;
use crate::error::{SqlError, SqlResult};
use crate::ident::ColumnRef;
use crate::value::Value;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl CmpOp {
    /// The SQL operator text.
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Like => "LIKE",
            CmpOp::NotLike => "NOT LIKE",
        }
    }

    // Symbolic operators are written tight (`a=?`), keyword ones spaced.
    fn write(self, out: &mut String) {
        match self {
            CmpOp::Like | CmpOp::NotLike => {
                out.push(' ');
                out.push_str(self.as_str());
                out.push(' ');
            }
            _ => out.push_str(self.as_str()),
        }
    }
}

/// Condition node for building WHERE / HAVING / ON clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    /// `column <op> ?`
    Compare {
        column: ColumnRef,
        op: CmpOp,
        value: Value,
    },
    /// `left <op> right`, both sides columns; binds nothing.
    KeyCompare {
        left: ColumnRef,
        op: CmpOp,
        right: ColumnRef,
    },
    /// `column IS NULL`
    IsNull(ColumnRef),
    /// `column IS NOT NULL`
    IsNotNull(ColumnRef),
    /// `column [NOT] IN (?, ?, ...)`
    In {
        column: ColumnRef,
        values: Vec<Value>,
        negated: bool,
    },
    /// `column [NOT] BETWEEN ? AND ?`
    Between {
        column: ColumnRef,
        low: Value,
        high: Value,
        negated: bool,
    },
    /// All children must hold.
    And(Vec<Cond>),
    /// At least one child must hold.
    Or(Vec<Cond>),
    /// Negation.
    Not(Box<Cond>),
    /// Raw SQL fragment without parameters.
    Raw(String),
    /// SQL with `?` markers, each replaced by the next value's placeholder.
    Expr { sql: String, values: Vec<Value> },
}

impl Cond {
    fn compare(column: impl Into<ColumnRef>, op: CmpOp, value: impl Into<Value>) -> Self {
        Cond::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column = value`
    pub fn eq(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Eq, value)
    }

    /// `column <> value`
    pub fn ne(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Ne, value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Gt, value)
    }

    /// `column >= value`
    pub fn gte(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Gte, value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Lt, value)
    }

    /// `column <= value`
    pub fn lte(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Lte, value)
    }

    /// `column LIKE pattern`
    pub fn like(column: impl Into<ColumnRef>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Like, pattern)
    }

    /// `column NOT LIKE pattern`
    pub fn not_like(column: impl Into<ColumnRef>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::NotLike, pattern)
    }

    /// `column <op> value` with an explicit operator.
    pub fn cmp(column: impl Into<ColumnRef>, op: CmpOp, value: impl Into<Value>) -> Self {
        Self::compare(column, op, value)
    }

    /// `left = right` between two columns.
    pub fn key_eq(left: impl Into<ColumnRef>, right: impl Into<ColumnRef>) -> Self {
        Self::key_cmp(left, CmpOp::Eq, right)
    }

    /// `left <op> right` between two columns.
    pub fn key_cmp(left: impl Into<ColumnRef>, op: CmpOp, right: impl Into<ColumnRef>) -> Self {
        Cond::KeyCompare {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<ColumnRef>) -> Self {
        Cond::IsNull(column.into())
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: impl Into<ColumnRef>) -> Self {
        Cond::IsNotNull(column.into())
    }

    /// `column IN (values...)`
    pub fn in_list<V: Into<Value>>(
        column: impl Into<ColumnRef>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Cond::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// `column NOT IN (values...)`
    pub fn not_in<V: Into<Value>>(
        column: impl Into<ColumnRef>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Cond::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// `column BETWEEN low AND high`
    pub fn between(
        column: impl Into<ColumnRef>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Cond::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: false,
        }
    }

    /// `column NOT BETWEEN low AND high`
    pub fn not_between(
        column: impl Into<ColumnRef>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Cond::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: true,
        }
    }

    /// AND group.
    pub fn and(children: impl IntoIterator<Item = Cond>) -> Self {
        Cond::And(children.into_iter().collect())
    }

    /// OR group.
    pub fn or(children: impl IntoIterator<Item = Cond>) -> Self {
        Cond::Or(children.into_iter().collect())
    }

    /// Negation.
    pub fn not(child: Cond) -> Self {
        Cond::Not(Box::new(child))
    }

    /// Raw SQL fragment. Nothing in it is escaped.
    pub fn raw(sql: impl Into<String>) -> Self {
        Cond::Raw(sql.into())
    }

    /// SQL template with `?` markers.
    ///
    /// # Example
    /// ```ignore
    /// Cond::expr("a = ? OR b = ?", [1, 2])
    /// ```
    pub fn expr<V: Into<Value>>(
        sql: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Cond::Expr {
            sql: sql.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this node compiles to the empty fragment.
    pub fn is_empty(&self) -> bool {
        match self {
            Cond::And(children) | Cond::Or(children) => children.iter().all(Cond::is_empty),
            Cond::Not(child) => child.is_empty(),
            Cond::Raw(sql) => sql.trim().is_empty(),
            _ => false,
        }
    }

    /// Report configuration errors in this tree as [`SqlError::Build`].
    pub fn check(&self) -> SqlResult<()> {
        match self {
            Cond::Compare { column, .. }
            | Cond::IsNull(column)
            | Cond::IsNotNull(column)
            | Cond::In { column, .. }
            | Cond::Between { column, .. } => check_key(column),
            Cond::KeyCompare { left, right, .. } => {
                check_key(left)?;
                check_key(right)
            }
            Cond::And(children) | Cond::Or(children) => children.iter().try_for_each(Cond::check),
            Cond::Not(child) => child.check(),
            Cond::Raw(_) => Ok(()),
            Cond::Expr { sql, values } => {
                let markers = sql.matches('?').count();
                if markers != values.len() {
                    return Err(SqlError::build(format!(
                        "template `{sql}` has {markers} `?` markers but {} values",
                        values.len()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Compile into a SQL fragment, binding values through `args`.
    pub fn compile(&self, args: &mut Args) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, args);
        out
    }

    /// Append the compiled fragment to `out`.
    pub fn write_sql(&self, out: &mut String, args: &mut Args) {
        match self {
            Cond::Compare { column, op, value } => {
                column.write_sql(out, args.dialect());
                op.write(out);
                args.push_into(out, value.clone());
            }
            Cond::KeyCompare { left, op, right } => {
                left.write_sql(out, args.dialect());
                op.write(out);
                right.write_sql(out, args.dialect());
            }
            Cond::IsNull(column) => {
                column.write_sql(out, args.dialect());
                out.push_str(" IS NULL");
            }
            Cond::IsNotNull(column) => {
                column.write_sql(out, args.dialect());
                out.push_str(" IS NOT NULL");
            }
            Cond::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    let predicate = if *negated {
                        args.dialect().true_predicate()
                    } else {
                        args.dialect().false_predicate()
                    };
                    out.push_str(predicate);
                    return;
                }
                column.write_sql(out, args.dialect());
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    args.push_into(out, value.clone());
                }
                out.push(')');
            }
            Cond::Between {
                column,
                low,
                high,
                negated,
            } => {
                column.write_sql(out, args.dialect());
                out.push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                args.push_into(out, low.clone());
                out.push_str(" AND ");
                args.push_into(out, high.clone());
            }
            Cond::And(children) => write_group(out, children, Junction::And, args),
            Cond::Or(children) => write_group(out, children, Junction::Or, args),
            Cond::Not(child) => {
                let inner = child.compile(args);
                if !inner.is_empty() {
                    out.push_str("NOT (");
                    out.push_str(&inner);
                    out.push(')');
                }
            }
            Cond::Raw(sql) => out.push_str(sql.trim()),
            Cond::Expr { sql, values } => {
                let mut remaining = values.iter();
                for ch in sql.chars() {
                    if ch == '?' {
                        if let Some(value) = remaining.next() {
                            args.push_into(out, value.clone());
                            continue;
                        }
                    }
                    out.push(ch);
                }
            }
        }
    }
}

/// Fail when `column` has no usable name.
pub(crate) fn check_key(column: &ColumnRef) -> SqlResult<()> {
    if column.is_empty() {
        return Err(SqlError::build(format!("empty column name in {column:?}")));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Junction {
    And,
    Or,
}

impl Junction {
    fn separator(self) -> &'static str {
        match self {
            Junction::And => " AND ",
            Junction::Or => " OR ",
        }
    }
}

/// Children of the same junction are spliced into the parent.
fn flatten<'a>(children: &'a [Cond], junction: Junction, out: &mut Vec<&'a Cond>) {
    for child in children {
        match (junction, child) {
            (Junction::And, Cond::And(inner)) | (Junction::Or, Cond::Or(inner)) => {
                flatten(inner, junction, out);
            }
            _ => out.push(child),
        }
    }
}

fn write_group(out: &mut String, children: &[Cond], junction: Junction, args: &mut Args) {
    let mut flat = Vec::with_capacity(children.len());
    flatten(children, junction, &mut flat);

    let mut parts: Vec<String> = Vec::with_capacity(flat.len());
    for child in flat {
        let sql = child.compile(args);
        if !sql.is_empty() {
            parts.push(sql);
        }
    }

    match parts.len() {
        0 => {}
        1 => out.push_str(&parts[0]),
        _ => {
            out.push('(');
            out.push_str(&parts.join(junction.separator()));
            out.push(')');
        }
    }
}

/// Compile a list of top-level conditions as if they were one AND group.
pub fn compile_all(conds: &[Cond], args: &mut Args) -> String {
    let mut out = String::new();
    write_group(&mut out, conds, Junction::And, args);
    out
}

/// An incrementally built list of AND-ed conditions.
///
/// This is what the clause assemblers keep for WHERE and HAVING.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CondGroup {
    conds: Vec<Cond>,
}

impl CondGroup {
    /// Create a new empty group.
    pub fn new() -> Self {
        Self { conds: Vec::new() }
    }

    /// Check if nothing has been added.
    ///
    /// A group holding only empty groups is not `is_empty()` but still
    /// compiles to nothing.
    pub fn is_empty(&self) -> bool {
        self.conds.is_empty()
    }

    /// Add a condition to be ANDed.
    pub fn push(&mut self, cond: Cond) {
        self.conds.push(cond);
    }

    /// Add an optional condition; `None` is skipped.
    pub fn push_opt(&mut self, cond: Option<Cond>) {
        if let Some(cond) = cond {
            self.conds.push(cond);
        }
    }

    /// Compile the group (without the WHERE/HAVING keyword).
    pub fn compile(&self, args: &mut Args) -> String {
        compile_all(&self.conds, args)
    }

    /// Check every condition; see [`Cond::check`].
    pub fn check(&self) -> SqlResult<()> {
        self.conds.iter().try_for_each(Cond::check)
    }

    /// Get all conditions.
    pub fn conds(&self) -> &[Cond] {
        &self.conds
    }

    /// Take all conditions (consuming the group).
    pub fn into_conds(self) -> Vec<Cond> {
        self.conds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, Generic, MySql, Postgres, SqlServer};
    use std::sync::Arc;

    fn pg() -> Args {
        Args::new(Arc::new(Postgres))
    }

    #[test]
    fn test_simple_eq() {
        let mut args = pg();
        assert_eq!(Cond::eq("name", "alice").compile(&mut args), r#""name"=$1"#);
        assert_eq!(args.args(), &[Value::from("alice")]);
    }

    #[test]
    fn test_like_is_spaced() {
        let mut args = Args::new(Arc::new(MySql));
        assert_eq!(
            Cond::like("name", "a%").compile(&mut args),
            "`name` LIKE ?"
        );
    }

    #[test]
    fn test_key_compare_binds_nothing() {
        let mut args = pg();
        let sql = Cond::key_eq("u.id", "o.user_id").compile(&mut args);
        assert_eq!(sql, r#""u"."id"="o"."user_id""#);
        assert!(args.is_empty());
    }

    #[test]
    fn test_and_group_is_parenthesized() {
        let mut args = pg();
        let sql = Cond::and([Cond::eq("status", "active"), Cond::gt("age", 18)]).compile(&mut args);
        assert_eq!(sql, r#"("status"=$1 AND "age">$2)"#);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_nested_and_or_numbering() {
        let mut args = pg();
        let sql = Cond::and([
            Cond::eq("a", 1),
            Cond::or([Cond::eq("b", 2), Cond::and([Cond::eq("c", 3), Cond::lt("d", 4)])]),
            Cond::between("e", 5, 6),
        ])
        .compile(&mut args);
        assert_eq!(
            sql,
            r#"("a"=$1 AND ("b"=$2 OR ("c"=$3 AND "d"<$4)) AND "e" BETWEEN $5 AND $6)"#
        );
        let expected: Vec<Value> = (1..=6).map(Value::Int).collect();
        assert_eq!(args.args(), expected.as_slice());
    }

    #[test]
    fn test_same_kind_is_flattened() {
        let nested = Cond::and([Cond::and([Cond::eq("a", 1), Cond::eq("b", 2)]), Cond::eq("c", 3)]);
        let flat = Cond::and([Cond::eq("a", 1), Cond::eq("b", 2), Cond::eq("c", 3)]);
        let (mut a1, mut a2) = (pg(), pg());
        assert_eq!(nested.compile(&mut a1), flat.compile(&mut a2));
        assert_eq!(a1.args(), a2.args());
    }

    #[test]
    fn test_single_child_wrapper_is_transparent() {
        let trees = vec![
            Cond::eq("a", 1),
            Cond::or([Cond::eq("a", 1), Cond::in_list("b", [2, 3])]),
            Cond::and([Cond::eq("a", 1), Cond::not(Cond::is_null("b"))]),
            Cond::in_list::<i32>("a", []),
        ];
        for tree in trees {
            let (mut a1, mut a2) = (pg(), pg());
            let wrapped = Cond::and([tree.clone()]);
            assert_eq!(tree.compile(&mut a1), wrapped.compile(&mut a2));
            assert_eq!(a1.args(), a2.args());
        }
    }

    #[test]
    fn test_empty_groups_reduce_to_nothing() {
        let mut args = pg();
        assert_eq!(Cond::and([]).compile(&mut args), "");
        assert_eq!(Cond::or([]).compile(&mut args), "");
        assert_eq!(Cond::not(Cond::and([])).compile(&mut args), "");
        let sql = Cond::and([Cond::or([]), Cond::eq("a", 1), Cond::and([])]).compile(&mut args);
        assert_eq!(sql, r#""a"=$1"#);
    }

    #[test]
    fn test_empty_in_list_is_false_for_every_dialect() {
        let dialects: Vec<Arc<dyn Dialect>> = vec![
            Arc::new(Generic),
            Arc::new(MySql),
            Arc::new(Postgres),
            Arc::new(SqlServer),
        ];
        for dialect in dialects {
            let mut args = Args::new(dialect);
            assert_eq!(Cond::in_list::<i32>("id", []).compile(&mut args), "1=0");
            assert!(args.is_empty());
        }
    }

    #[test]
    fn test_empty_not_in_list_is_true() {
        let mut args = pg();
        assert_eq!(Cond::not_in::<i32>("id", []).compile(&mut args), "1=1");
    }

    #[test]
    fn test_in_list() {
        let mut args = pg();
        let sql = Cond::in_list("id", [1, 2, 3]).compile(&mut args);
        assert_eq!(sql, r#""id" IN ($1, $2, $3)"#);
    }

    #[test]
    fn test_not() {
        let mut args = pg();
        let sql = Cond::not(Cond::eq("banned", true)).compile(&mut args);
        assert_eq!(sql, r#"NOT ("banned"=$1)"#);
    }

    #[test]
    fn test_null_checks() {
        let mut args = pg();
        assert_eq!(Cond::is_null("deleted_at").compile(&mut args), r#""deleted_at" IS NULL"#);
        assert_eq!(Cond::is_not_null("x").compile(&mut args), r#""x" IS NOT NULL"#);
        assert!(args.is_empty());
    }

    #[test]
    fn test_expr_template() {
        let mut args = pg();
        args.add(0);
        let sql = Cond::expr("a = ? OR b = ?", [1, 2]).compile(&mut args);
        assert_eq!(sql, "a = $2 OR b = $3");
    }

    #[test]
    fn test_expr_marker_count_must_match() {
        assert!(Cond::expr("a = ? AND b = ?", [1]).check().unwrap_err().is_build_error());
        assert!(Cond::expr("a = ?", [1, 2]).check().unwrap_err().is_build_error());
        assert!(Cond::expr("a = ? AND b = ?", [1, 2]).check().is_ok());

        let empty = Cond::expr("y > ?", Vec::<i32>::new());
        let nested = Cond::or([Cond::eq("x", 1), Cond::not(empty)]);
        assert!(nested.check().unwrap_err().is_build_error());
    }

    #[test]
    fn test_blank_keys_fail_check() {
        assert!(Cond::eq("", 1).check().unwrap_err().is_build_error());
        assert!(Cond::key_eq("a.id", "b.").check().unwrap_err().is_build_error());
        assert!(Cond::in_list::<i32>("a..b", []).check().is_err());
        assert!(Cond::eq("u.id", 1).check().is_ok());
    }

    #[test]
    fn test_keys_are_quoted_and_escaped() {
        let mut args = pg();
        assert_eq!(Cond::eq("order date", 1).compile(&mut args), r#""order date"=$1"#);
        assert_eq!(Cond::eq("größe", 2).compile(&mut args), r#""größe"=$2"#);
        assert_eq!(Cond::eq(r#"a"b"#, 3).compile(&mut args), r#""a""b"=$3"#);
        assert_eq!(
            Cond::eq("x;DROP TABLE t--", 4).compile(&mut args),
            r#""x;DROP TABLE t--"=$4"#
        );

        let mut args = Args::new(Arc::new(MySql));
        assert_eq!(Cond::eq("a`b", 1).compile(&mut args), "`a``b`=?");
    }

    #[test]
    fn test_raw_key_is_verbatim() {
        let mut args = pg();
        let sql = Cond::gt(ColumnRef::raw("COUNT(*)"), 5).compile(&mut args);
        assert_eq!(sql, "COUNT(*)>$1");
    }

    #[test]
    fn test_raw() {
        let mut args = pg();
        assert_eq!(Cond::raw("deleted = false").compile(&mut args), "deleted = false");
    }

    #[test]
    fn test_group_compiles_like_and() {
        let mut group = CondGroup::new();
        group.push(Cond::eq("a", 1));
        group.push_opt(None);
        group.push(Cond::eq("b", 2));
        let (mut a1, mut a2) = (pg(), pg());
        assert_eq!(
            group.compile(&mut a1),
            Cond::and(group.conds().to_vec()).compile(&mut a2)
        );
    }
}
