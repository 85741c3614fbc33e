//! SQL dialect support.
//!
//! A dialect decides the three things that differ between engines in the text
//! this crate generates: identifier quoting, placeholder syntax and the
//! pagination fragment. Everything else (keywords, spacing, clause order) is
//! fixed.
//!
//! Dialects are looked up by name through an explicit [`DialectRegistry`];
//! there is no ambient global registration.

use crate::error::{SqlError, SqlResult};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Opening and closing identifier quote characters, or `None` when the
    /// dialect emits identifiers bare.
    fn quote_chars(&self) -> Option<(char, char)> {
        Some(('"', '"'))
    }

    /// Quotes an identifier, doubling any embedded closing quote character.
    fn quote(&self, ident: &str) -> String {
        let mut out = String::with_capacity(ident.len() + 2);
        self.write_quoted(&mut out, ident);
        out
    }

    /// Append the quoted form of `ident` to `out`.
    fn write_quoted(&self, out: &mut String, ident: &str) {
        match self.quote_chars() {
            None => out.push_str(ident),
            Some((open, close)) => {
                out.push(open);
                for ch in ident.chars() {
                    if ch == close {
                        out.push(close);
                    }
                    out.push(ch);
                }
                out.push(close);
            }
        }
    }

    /// Render the placeholder for the 1-based `ordinal` argument.
    fn placeholder(&self, ordinal: usize) -> String {
        let _ = ordinal;
        "?".to_string()
    }

    /// Render the pagination fragment, including its leading space.
    ///
    /// Returns an empty string when neither limit nor offset is set.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut out = String::new();
        if let Some(limit) = limit {
            out.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            out.push_str(&format!(" OFFSET {offset}"));
        }
        out
    }

    /// Whether pagination is written `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    /// rather than `LIMIT n OFFSET m`.
    fn offset_fetch_paging(&self) -> bool {
        false
    }

    /// A syntactically complete predicate that is always false.
    fn false_predicate(&self) -> &'static str {
        "1=0"
    }

    /// A syntactically complete predicate that is always true.
    fn true_predicate(&self) -> &'static str {
        "1=1"
    }

    /// Returns whether the dialect supports a RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }
}

/// Dialect-neutral output: bare identifiers and `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

impl Dialect for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn quote_chars(&self) -> Option<(char, char)> {
        None
    }
}

/// MySQL / MariaDB: backtick quoting and `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_chars(&self) -> Option<(char, char)> {
        Some(('`', '`'))
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            // MySQL has no bare OFFSET; the documented idiom is the max u64 limit.
            (None, Some(offset)) => format!(" LIMIT 18446744073709551615 OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }
}

/// PostgreSQL: double-quote quoting and `$N` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("${ordinal}")
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

/// SQLite: double-quote quoting and `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

/// SQL Server: bracket quoting, `@pN` placeholders and OFFSET/FETCH paging.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServer;

impl Dialect for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_chars(&self) -> Option<(char, char)> {
        Some(('[', ']'))
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("@p{ordinal}")
    }

    fn offset_fetch_paging(&self) -> bool {
        true
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        if limit.is_none() && offset.is_none() {
            return String::new();
        }
        let mut out = format!(" OFFSET {} ROWS", offset.unwrap_or(0));
        if let Some(limit) = limit {
            out.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
        out
    }
}

/// Name → dialect lookup table.
///
/// Registration takes the write lock; lookups only ever take the read lock,
/// so a populated registry can be shared freely between threads.
#[derive(Debug, Default)]
pub struct DialectRegistry {
    dialects: RwLock<HashMap<String, Arc<dyn Dialect>>>,
}

impl DialectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in dialect registered under its name.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(Generic));
        registry.register(Arc::new(MySql));
        registry.register(Arc::new(Postgres));
        registry.register(Arc::new(Sqlite));
        registry.register(Arc::new(SqlServer));
        registry
    }

    /// Register (or replace) a dialect under its own name.
    pub fn register(&self, dialect: Arc<dyn Dialect>) {
        self.register_as(dialect.name(), dialect);
    }

    /// Register (or replace) a dialect under an alias.
    pub fn register_as(&self, name: &str, dialect: Arc<dyn Dialect>) {
        let mut map = self
            .dialects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        map.insert(name.to_ascii_lowercase(), dialect);
    }

    /// Look up a dialect by (case-insensitive) name.
    pub fn get(&self, name: &str) -> SqlResult<Arc<dyn Dialect>> {
        let map = self
            .dialects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        map.get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| SqlError::build(format!("unknown SQL dialect '{name}'")))
    }

    /// Names of all registered dialects, sorted.
    pub fn names(&self) -> Vec<String> {
        let map = self
            .dialects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_embedded_quote() {
        assert_eq!(Postgres.quote(r#"we"ird"#), r#""we""ird""#);
        assert_eq!(MySql.quote("a`b"), "`a``b`");
        assert_eq!(SqlServer.quote("a]b"), "[a]]b]");
        assert_eq!(Generic.quote("plain"), "plain");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(MySql.placeholder(3), "?");
        assert_eq!(Postgres.placeholder(3), "$3");
        assert_eq!(SqlServer.placeholder(3), "@p3");
    }

    #[test]
    fn test_limit_offset() {
        assert_eq!(Postgres.limit_offset(Some(10), Some(20)), " LIMIT 10 OFFSET 20");
        assert_eq!(Postgres.limit_offset(None, None), "");
        assert_eq!(Sqlite.limit_offset(None, Some(5)), " LIMIT -1 OFFSET 5");
        assert_eq!(
            SqlServer.limit_offset(Some(10), None),
            " OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_registry_lookup() {
        let registry = DialectRegistry::with_builtins();
        assert_eq!(registry.get("Postgres").unwrap().name(), "postgres");
        assert!(registry.get("oracle").unwrap_err().is_build_error());
        assert_eq!(registry.names().len(), 5);
    }

    #[test]
    fn test_registry_alias() {
        let registry = DialectRegistry::new();
        registry.register_as("mariadb", Arc::new(MySql));
        assert_eq!(registry.get("mariadb").unwrap().name(), "mysql");
    }
}
