//! # sqlbind
//!
//! A dialect-aware SQL statement compiler and result-row binder.
//!
//! ## Features
//!
//! - **Dialect aware**: identifier quoting, placeholders and pagination come
//!   from a [`Dialect`] chosen per statement or per connection
//! - **Composable conditions**: [`Cond`] trees compile with correct grouping
//!   and consistent placeholder numbering
//! - **Typed results**: rows bind into records, scalars, tuples and keyed maps
//!   via [`FromRow`] and [`bind`]
//! - **Transaction-friendly**: pass a transaction anywhere a [`GenericClient`]
//!   is expected
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use sqlbind::{qb, Cond, Config, Postgres, SqlQb};
//!
//! let stmt = qb::select(["id", "name"])
//!     .config(Config::with_dialect(Postgres))
//!     .from("users")
//!     .and_where(Cond::eq("status", "active"))
//!     .order_by_desc("created_at")
//!     .limit(10)
//!     .build()?;
//! assert_eq!(
//!     stmt.sql,
//!     r#"SELECT "id", "name" FROM "users" WHERE "status"=$1 ORDER BY "created_at" DESC LIMIT 10"#
//! );
//! ```

pub mod args;
pub mod bind;
pub mod client;
pub mod cond;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod row;
pub mod table;
pub mod value;

#[cfg(feature = "postgres")]
pub mod pg;

pub use args::{ArgPool, Args, PooledArgs};
pub use bind::{
    Bound, Cursor, Destination, MapValue, bind, scan_all, scan_keyed, scan_map, scan_one,
    scan_opt, scan_set,
};
pub use client::{ExecResult, GenericClient};
pub use cond::{CmpOp, Cond, CondGroup, compile_all};
pub use config::Config;
pub use db::Database;
pub use dialect::{Dialect, DialectRegistry, Generic, MySql, Postgres, SqlServer, Sqlite};
pub use error::{SqlError, SqlResult};
pub use ident::ColumnRef;
pub use record::{Field, Record, record_columns};
pub use row::{Columns, FromRow, Row, RowSet};
pub use table::{Join, JoinKind, TableRef, Tables};
pub use value::{FromValue, ToValue, Value};

// Re-export qb module for easy access
pub use qb::{
    DeleteQb, InsertQb, InsertVerb, MutationQb, Order, Page, Paginator, SelectQb, SqlQb,
    Statement, UpdateQb, delete_from, insert_into, select, select_from, update,
};

#[cfg(feature = "derive")]
pub use sqlbind_derive::{FromRow, Record};
