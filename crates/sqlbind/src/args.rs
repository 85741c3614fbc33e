//! Argument allocation: bound values and their placeholders.
//!
//! [`Args`] records every bound value in emission order and hands back the
//! dialect's placeholder for it, so the Nth placeholder written into the SQL
//! text always refers to the Nth value. Placeholder indices are computed at
//! build time; no string rewriting happens afterwards.
//!
//! Compiling a statement borrows its storage from an [`ArgPool`]. The pooled
//! guard owns the storage until it is released (explicitly or on drop), at
//! which point the value list and text buffer are cleared and returned to the
//! pool for the next compilation.

use crate::dialect::Dialect;
use crate::value::Value;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, OnceLock};

/// Ordered argument list bound to one dialect.
#[derive(Debug, Clone)]
pub struct Args {
    dialect: Arc<dyn Dialect>,
    values: Vec<Value>,
}

impl Args {
    /// Create an empty argument list for a dialect.
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    fn with_storage(dialect: Arc<dyn Dialect>, values: Vec<Value>) -> Self {
        Self { dialect, values }
    }

    /// The dialect placeholders are rendered for.
    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    /// Shared handle to the dialect.
    pub fn dialect_arc(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Bind a value and return the placeholder for its position.
    pub fn add(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        self.dialect.placeholder(self.values.len())
    }

    /// Bind a value and append its placeholder to `out`.
    pub fn push_into(&mut self, out: &mut String, value: impl Into<Value>) {
        let placeholder = self.add(value);
        out.push_str(&placeholder);
    }

    /// Quote an identifier in this dialect.
    pub fn quote(&self, ident: &str) -> String {
        self.dialect.quote(ident)
    }

    /// Get the current argument count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no argument has been bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The bound values, in placeholder order.
    pub fn args(&self) -> &[Value] {
        &self.values
    }

    /// Consume the list and return the bound values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Drop every bound value, keeping the allocation.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[derive(Debug, Default)]
struct Storage {
    values: Vec<Value>,
    sql: String,
}

/// Pool of reusable argument/text storage.
#[derive(Debug)]
pub struct ArgPool {
    free: Mutex<Vec<Storage>>,
    max_pooled: usize,
}

impl Default for ArgPool {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ArgPool {
    /// Create a pool retaining at most `max_pooled` idle entries.
    pub fn new(max_pooled: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_pooled,
        }
    }

    /// The process-wide pool used by the clause assemblers.
    pub fn global() -> &'static ArgPool {
        static POOL: OnceLock<ArgPool> = OnceLock::new();
        POOL.get_or_init(ArgPool::default)
    }

    /// Take an empty argument list for `dialect` out of the pool.
    pub fn acquire(&self, dialect: Arc<dyn Dialect>) -> PooledArgs<'_> {
        let storage = self
            .free
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        debug_assert!(storage.values.is_empty() && storage.sql.is_empty());
        PooledArgs {
            args: Args::with_storage(dialect, storage.values),
            sql: storage.sql,
            pool: self,
        }
    }

    /// Number of idle entries currently held.
    pub fn idle(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn give_back(&self, mut storage: Storage) {
        storage.values.clear();
        storage.sql.clear();
        let mut free = self
            .free
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if free.len() < self.max_pooled {
            free.push(storage);
        }
    }
}

/// Argument list and SQL text buffer borrowed from an [`ArgPool`].
///
/// Dereferences to [`Args`]. Releasing consumes the guard, so the storage
/// cannot be touched again once it is back in the pool.
#[derive(Debug)]
pub struct PooledArgs<'a> {
    args: Args,
    sql: String,
    pool: &'a ArgPool,
}

impl PooledArgs<'_> {
    /// The SQL text buffer that goes with this argument list.
    pub fn sql_mut(&mut self) -> &mut String {
        &mut self.sql
    }

    /// Split into the SQL buffer and the argument list for simultaneous use.
    pub fn parts(&mut self) -> (&mut String, &mut Args) {
        (&mut self.sql, &mut self.args)
    }

    /// Copy out the SQL text and values, then release the storage.
    pub fn finish(self) -> (String, Vec<Value>) {
        let out = (self.sql.clone(), self.args.values.clone());
        self.release();
        out
    }

    /// Return the storage to the pool.
    ///
    /// ```
    /// use sqlbind::{ArgPool, Postgres};
    /// use std::sync::Arc;
    ///
    /// let pool = ArgPool::new(4);
    /// let mut args = pool.acquire(Arc::new(Postgres));
    /// assert_eq!(args.add(1), "$1");
    /// args.release();
    /// assert_eq!(pool.idle(), 1);
    /// ```
    ///
    /// The guard is moved into `release`, so a released list cannot be used:
    ///
    /// ```compile_fail,E0382
    /// use sqlbind::{ArgPool, Postgres};
    /// use std::sync::Arc;
    ///
    /// let pool = ArgPool::new(4);
    /// let mut args = pool.acquire(Arc::new(Postgres));
    /// args.release();
    /// args.add(1);
    /// ```
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for PooledArgs<'_> {
    type Target = Args;

    fn deref(&self) -> &Args {
        &self.args
    }
}

impl DerefMut for PooledArgs<'_> {
    fn deref_mut(&mut self) -> &mut Args {
        &mut self.args
    }
}

impl Drop for PooledArgs<'_> {
    fn drop(&mut self) {
        let storage = Storage {
            values: std::mem::take(&mut self.args.values),
            sql: std::mem::take(&mut self.sql),
        };
        self.pool.give_back(storage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};

    #[test]
    fn test_sequential_placeholders() {
        let mut args = Args::new(Arc::new(Postgres));
        assert_eq!(args.add(1i32), "$1");
        assert_eq!(args.add("x"), "$2");
        assert_eq!(args.args(), &[Value::Int(1), Value::from("x")]);
    }

    #[test]
    fn test_positional_placeholders_repeat() {
        let mut args = Args::new(Arc::new(MySql));
        assert_eq!(args.add(1i32), "?");
        assert_eq!(args.add(2i32), "?");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_release_resets_and_reuses_storage() {
        let pool = ArgPool::new(4);
        let mut args = pool.acquire(Arc::new(Postgres));
        args.add(1i64);
        args.add(2i64);
        args.sql_mut().push_str("SELECT 1");
        let (sql, values) = args.finish();
        assert_eq!(sql, "SELECT 1");
        assert_eq!(values.len(), 2);
        assert_eq!(pool.idle(), 1);

        // Reacquired storage starts from zero: numbering restarts at $1.
        let mut again = pool.acquire(Arc::new(Postgres));
        assert_eq!(pool.idle(), 0);
        assert!(again.is_empty());
        assert!(again.sql_mut().is_empty());
        assert_eq!(again.add(3i64), "$1");
    }

    #[test]
    fn test_released_capacity_is_kept() {
        let pool = ArgPool::new(4);
        let mut args = pool.acquire(Arc::new(MySql));
        for i in 0..32i64 {
            args.add(i);
        }
        args.release();
        let again = pool.acquire(Arc::new(MySql));
        assert!(again.is_empty());
        assert!(again.args.values.capacity() >= 32);
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = ArgPool::new(1);
        let a = pool.acquire(Arc::new(MySql));
        let b = pool.acquire(Arc::new(MySql));
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
    }
}
