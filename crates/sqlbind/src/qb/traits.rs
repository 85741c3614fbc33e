//! Trait definitions for the clause assemblers.

use crate::bind::{scan_all, scan_map, scan_opt, scan_set};
use crate::client::{ExecResult, GenericClient};
use crate::error::{SqlError, SqlResult};
use crate::qb::statement::Statement;
use crate::row::{FromRow, Row, RowSet};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Base trait for all assemblers.
///
/// Provides `build()` plus execution helpers that run the built statement on
/// any [`GenericClient`]. Configuration errors surface from `build()` before
/// the client is touched.
pub trait SqlQb: Sync {
    /// Build the SQL text and arguments.
    fn build(&self) -> SqlResult<Statement>;

    /// Debug helper returning only the SQL text.
    fn to_sql(&self) -> SqlResult<String> {
        self.build().map(|stmt| stmt.sql)
    }

    /// Execute and return the raw row set.
    fn query(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<RowSet>> + Send {
        let stmt = self.build();
        async move {
            let stmt = stmt?;
            conn.query(&stmt.sql, &stmt.args).await
        }
    }

    /// Execute and return the first row.
    fn query_one(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<Row>> + Send {
        let stmt = self.build();
        async move {
            let stmt = stmt?;
            conn.query_one(&stmt.sql, &stmt.args).await
        }
    }

    /// Execute and map all rows to `T`.
    fn fetch_all<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<Vec<T>>> + Send {
        let rows = self.query(conn);
        async move { scan_all(&mut rows.await?) }
    }

    /// Execute and map the first row to `T`, if any.
    fn fetch_opt<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<Option<T>>> + Send {
        let rows = self.query(conn);
        async move { scan_opt(&mut rows.await?) }
    }

    /// Execute and map the first row to `T`.
    ///
    /// Returns [`SqlError::NotFound`] when the query yields no rows.
    fn fetch_one<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<T>> + Send {
        let row = self.fetch_opt::<T>(conn);
        async move {
            row.await?
                .ok_or_else(|| SqlError::not_found("query returned no rows"))
        }
    }

    /// Execute and map rows into `key column -> remaining columns`.
    fn fetch_map<K, V>(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<HashMap<K, V>>> + Send
    where
        K: FromRow + Eq + Hash + Send,
        V: FromRow + Send,
    {
        let rows = self.query(conn);
        async move { scan_map(&mut rows.await?) }
    }

    /// Execute and collect the set of keys in `key_columns`.
    fn fetch_set<K>(
        &self,
        conn: &impl GenericClient,
        key_columns: &[&str],
    ) -> impl std::future::Future<Output = SqlResult<HashSet<K>>> + Send
    where
        K: FromRow + Eq + Hash + Send,
    {
        let rows = self.query(conn);
        let key_columns: Vec<String> = key_columns.iter().map(|c| c.to_string()).collect();
        async move { scan_set(&mut rows.await?, &key_columns) }
    }
}

/// Trait for mutation assemblers (INSERT/UPDATE/DELETE).
pub trait MutationQb: SqlQb {
    /// Execute and return the affected-row metadata.
    fn execute(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<ExecResult>> + Send {
        let stmt = self.build();
        async move {
            let stmt = stmt?;
            conn.execute(&stmt.sql, &stmt.args).await
        }
    }
}
