use crate::dialect::Dialect;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// The result of building a statement: SQL text plus ordered arguments.
///
/// The Nth placeholder in `sql` (left to right) refers to `args[N-1]`.
#[derive(Clone)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
    dialect: Arc<dyn Dialect>,
}

impl Statement {
    pub fn new(sql: String, args: Vec<Value>, dialect: Arc<dyn Dialect>) -> Self {
        Self { sql, args, dialect }
    }

    /// The dialect the statement was rendered for.
    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    /// Render the SQL with every placeholder replaced by its inline literal.
    ///
    /// For logging and debugging only; never execute the result.
    pub fn interpolate(&self) -> String {
        let mut out = String::with_capacity(self.sql.len() + self.args.len() * 8);
        let mut next = 1usize;
        let mut expected = self.dialect.placeholder(next);
        let mut in_literal = false;
        let mut rest = self.sql.as_str();

        while let Some(ch) = rest.chars().next() {
            if ch == '\'' {
                in_literal = !in_literal;
            } else if !in_literal && next <= self.args.len() && rest.starts_with(&expected) {
                let after = &rest[expected.len()..];
                let numbered = expected.len() > 1;
                let runs_on = numbered && after.starts_with(|c: char| c.is_ascii_digit());
                if !runs_on {
                    out.push_str(&self.args[next - 1].to_sql_inline());
                    rest = after;
                    next += 1;
                    expected = self.dialect.placeholder(next);
                    continue;
                }
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.sql == other.sql
            && self.args == other.args
            && self.dialect.name() == other.dialect.name()
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("dialect", &self.dialect.name())
            .field("sql", &self.sql)
            .field("args", &self.args)
            .finish()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};

    #[test]
    fn test_interpolate_numbered() {
        let stmt = Statement::new(
            "SELECT * FROM t WHERE a=$1 AND b=$2 AND c='$1'".to_string(),
            vec![Value::Int(10), Value::from("x'y")],
            Arc::new(Postgres),
        );
        assert_eq!(
            stmt.interpolate(),
            "SELECT * FROM t WHERE a=10 AND b='x''y' AND c='$1'"
        );
    }

    #[test]
    fn test_interpolate_positional() {
        let stmt = Statement::new(
            "UPDATE t SET a=? WHERE b IS NULL AND c=?".to_string(),
            vec![Value::Null, Value::Bool(true)],
            Arc::new(MySql),
        );
        assert_eq!(stmt.interpolate(), "UPDATE t SET a=NULL WHERE b IS NULL AND c=TRUE");
    }
}
