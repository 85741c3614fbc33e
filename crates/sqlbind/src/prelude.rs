//! Convenient imports for typical `sqlbind` usage.
//!
//! ```ignore
//! use sqlbind::prelude::*;
//! ```

pub use crate::{
    Cond, Config, Database, Dialect, FromRow, GenericClient, MutationQb, Record, SqlError,
    SqlQb, SqlResult, Statement, Value, qb,
};

pub use crate::{Generic, MySql, Postgres, SqlServer, Sqlite};
