//! Executor facade: a client plus its configuration.
//!
//! [`Database`] is itself a [`GenericClient`], so assemblers run on it the
//! same way they run on a bare connection, with the configured timeout,
//! SQL logging and slow-query warnings applied to every call.

use crate::bind::{scan_all, scan_map, scan_opt, scan_set};
use crate::client::{ExecResult, GenericClient};
use crate::config::Config;
use crate::error::{SqlError, SqlResult};
use crate::qb::{DeleteQb, InsertQb, MutationQb, SelectQb, SqlQb, UpdateQb};
use crate::row::{FromRow, RowSet};
use crate::value::Value;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A client bound to a [`Config`].
///
/// The config's dialect is the connection default: assemblers created through
/// [`Database::select`] and friends inherit it unless they override it.
#[derive(Debug, Clone)]
pub struct Database<C> {
    client: C,
    config: Config,
}

impl<C: GenericClient> Database<C> {
    pub fn new(client: C, config: Config) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    // ==================== Assemblers ====================

    /// SELECT using this database's configuration.
    pub fn select<I, S>(&self, columns: I) -> SelectQb
    where
        I: IntoIterator<Item = S>,
        S: Into<crate::ident::ColumnRef>,
    {
        SelectQb::new().config(self.config.clone()).columns(columns)
    }

    /// INSERT using this database's configuration.
    pub fn insert_into(&self, table: &str) -> InsertQb {
        InsertQb::new().config(self.config.clone()).into_table(table)
    }

    /// UPDATE using this database's configuration.
    pub fn update(&self, table: &str) -> UpdateQb {
        UpdateQb::new().config(self.config.clone()).table(table)
    }

    /// DELETE using this database's configuration.
    pub fn delete_from(&self, table: &str) -> DeleteQb {
        DeleteQb::new().config(self.config.clone()).from(table)
    }

    // ==================== Fetch helpers ====================

    /// Run `qb` and bind the first row; no rows is [`SqlError::NotFound`].
    pub async fn fetch_one<T: FromRow>(&self, qb: &impl SqlQb) -> SqlResult<T> {
        self.fetch_opt(qb)
            .await?
            .ok_or_else(|| SqlError::not_found("query returned no rows"))
    }

    /// Run `qb` and bind the first row, if any.
    pub async fn fetch_opt<T: FromRow>(&self, qb: &impl SqlQb) -> SqlResult<Option<T>> {
        let stmt = qb.build()?;
        scan_opt(&mut self.query(&stmt.sql, &stmt.args).await?)
    }

    /// Run `qb` and bind every row.
    pub async fn fetch_all<T: FromRow>(&self, qb: &impl SqlQb) -> SqlResult<Vec<T>> {
        let stmt = qb.build()?;
        scan_all(&mut self.query(&stmt.sql, &stmt.args).await?)
    }

    /// Run `qb` and bind `first column -> remaining columns`.
    pub async fn fetch_map<K, V>(&self, qb: &impl SqlQb) -> SqlResult<HashMap<K, V>>
    where
        K: FromRow + Eq + Hash,
        V: FromRow,
    {
        let stmt = qb.build()?;
        scan_map(&mut self.query(&stmt.sql, &stmt.args).await?)
    }

    /// Run `qb` and collect the keys found in `key_columns`.
    pub async fn fetch_set<K>(&self, qb: &impl SqlQb, key_columns: &[&str]) -> SqlResult<HashSet<K>>
    where
        K: FromRow + Eq + Hash,
    {
        let stmt = qb.build()?;
        let keys: Vec<String> = key_columns.iter().map(|c| c.to_string()).collect();
        scan_set(&mut self.query(&stmt.sql, &stmt.args).await?, &keys)
    }

    /// Run a mutation assembler for effect.
    ///
    /// Named apart from [`GenericClient::execute`], which takes raw SQL.
    pub async fn exec(&self, qb: &impl MutationQb) -> SqlResult<ExecResult> {
        let stmt = qb.build()?;
        GenericClient::execute(self, &stmt.sql, &stmt.args).await
    }

    // ==================== Instrumentation ====================

    fn log_sql(&self, kind: &'static str, sql: &str, args: &[Value], elapsed: Duration) {
        let shown = match self.config.max_sql_log_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        };
        tracing::debug!(
            target: "sqlbind.sql",
            kind,
            dialect = self.config.dialect.name(),
            sql = %shown,
            args = args.len(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "executed"
        );
        if let Some(threshold) = self.config.slow_query_threshold
            && elapsed > threshold
        {
            tracing::warn!(
                target: "sqlbind.sql",
                kind,
                sql = %shown,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                threshold_ms = threshold.as_secs_f64() * 1000.0,
                "slow query"
            );
        }
    }

    async fn with_timeout<T, F>(&self, future: F) -> SqlResult<T>
    where
        F: std::future::Future<Output = SqlResult<T>> + Send,
    {
        match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| SqlError::Timeout(timeout))?,
            None => future.await,
        }
    }

    async fn instrumented<T, F>(&self, kind: &'static str, sql: &str, args: &[Value], future: F) -> SqlResult<T>
    where
        F: std::future::Future<Output = SqlResult<T>> + Send,
    {
        let start = Instant::now();
        let result = self.with_timeout(future).await;
        let elapsed = start.elapsed();
        match &result {
            Ok(_) => self.log_sql(kind, sql, args, elapsed),
            Err(err) => tracing::debug!(
                target: "sqlbind.sql",
                kind,
                error = %err,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "failed"
            ),
        }
        result
    }
}

/// Cut `sql` to at most `max_bytes` without splitting a character.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

impl<C: GenericClient> GenericClient for Database<C> {
    async fn execute(&self, sql: &str, args: &[Value]) -> SqlResult<ExecResult> {
        self.instrumented("execute", sql, args, self.client.execute(sql, args))
            .await
    }

    async fn query(&self, sql: &str, args: &[Value]) -> SqlResult<RowSet> {
        let rows = self
            .instrumented("query", sql, args, self.client.query(sql, args))
            .await?;
        Ok(rows.with_separator(&self.config.separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
        assert_eq!(truncate_sql_bytes("é", 1), "");
    }
}
