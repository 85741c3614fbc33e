//! Generic client trait for database access.
//!
//! The crate never opens connections itself; anything implementing
//! [`GenericClient`] can run built statements. Futures are cancelled by
//! dropping them.

use crate::error::{SqlError, SqlResult};
use crate::row::{Row, RowSet};
use crate::value::Value;

/// Metadata returned by a statement executed for effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Number of rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Auto-generated key of the last inserted row, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }
}

/// A database connection (or transaction) able to run SQL with bound arguments.
///
/// `args[N-1]` is the value for the Nth placeholder of `sql`.
pub trait GenericClient: Send + Sync {
    /// Execute a statement for its effect.
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<ExecResult>> + Send;

    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<RowSet>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`SqlError::NotFound`]
    /// - 1 or more rows: returns the first row (does **not** error)
    fn query_one(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<Row>> + Send {
        async move {
            let mut rows = self.query(sql, args).await?;
            rows.pop_front()
                .ok_or_else(|| SqlError::not_found("query returned no rows"))
        }
    }

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<Option<Row>>> + Send {
        async move {
            let mut rows = self.query(sql, args).await?;
            Ok(rows.pop_front())
        }
    }
}
