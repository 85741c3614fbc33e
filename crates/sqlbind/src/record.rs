//! Record-to-column mapping.
//!
//! A [`Record`] describes its columns as a tree of [`Field`]s: plain columns,
//! embedded records whose columns get a `name + separator` prefix, and inline
//! records whose columns are spliced in unprefixed. The tree is usually derived
//! with `#[derive(Record)]`:
//!
//! ```ignore
//! #[derive(Record, FromRow)]
//! struct User {
//!     id: i64,
//!     #[orm(column = "user_name")]
//!     name: String,
//!     #[orm(flatten)]
//!     address: Address,      // address_city, address_zip
//!     #[orm(skip)]
//!     cached: Option<String>,
//! }
//! ```
//!
//! Field types are leaves unless marked `flatten`, so dates, JSON values and
//! anything else convertible to a single value need no annotation.
//!
//! Flattening walks the tree once per (type, table, separator) and caches the
//! result process-wide.

use crate::ident::ColumnRef;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// One node of a record's column tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A single column.
    Column(String),
    /// An embedded record; its columns are prefixed with `name` and the separator.
    Embedded { name: String, fields: Vec<Field> },
    /// An embedded record whose columns are used unprefixed.
    Inline(Vec<Field>),
}

impl Field {
    pub fn column(name: impl Into<String>) -> Self {
        Field::Column(name.into())
    }

    pub fn embedded(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Field::Embedded {
            name: name.into(),
            fields,
        }
    }
}

/// Types whose columns can be listed for SELECT.
pub trait Record {
    /// The column tree, in declaration order.
    fn fields() -> Vec<Field>;
}

/// Join `prefix` and `name` with `separator`; an empty prefix yields `name`.
pub fn scoped_name(prefix: &str, separator: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        let mut out = String::with_capacity(prefix.len() + separator.len() + name.len());
        out.push_str(prefix);
        out.push_str(separator);
        out.push_str(name);
        out
    }
}

/// Flatten a column tree into result-set column names.
pub fn flatten_fields(fields: &[Field], prefix: &str, separator: &str, out: &mut Vec<String>) {
    for field in fields {
        match field {
            Field::Column(name) => out.push(scoped_name(prefix, separator, name)),
            Field::Embedded { name, fields } => {
                let nested = scoped_name(prefix, separator, name);
                flatten_fields(fields, &nested, separator, out);
            }
            Field::Inline(fields) => flatten_fields(fields, prefix, separator, out),
        }
    }
}

type CacheKey = (TypeId, String, String);

fn cache() -> &'static RwLock<HashMap<CacheKey, Arc<[ColumnRef]>>> {
    static CACHE: OnceLock<RwLock<HashMap<CacheKey, Arc<[ColumnRef]>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The flattened columns of `T`, qualified by `table` when it is non-empty.
///
/// Computed on first use for each (type, table, separator) and cached.
pub fn record_columns<T: Record + 'static>(table: &str, separator: &str) -> Arc<[ColumnRef]> {
    let key = (TypeId::of::<T>(), table.to_string(), separator.to_string());

    if let Some(hit) = cache()
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(&key)
    {
        return hit.clone();
    }

    let mut names = Vec::new();
    flatten_fields(&T::fields(), "", separator, &mut names);
    let qualifier = (!table.is_empty()).then_some(table);
    let columns: Arc<[ColumnRef]> = names
        .into_iter()
        .map(|name| ColumnRef::qualified(qualifier, name))
        .collect();

    tracing::trace!(
        target: "sqlbind.record",
        record = std::any::type_name::<T>(),
        table,
        columns = columns.len(),
        "record columns cached"
    );

    // Another thread may have raced us here; keep whichever landed first.
    let mut map = cache()
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    map.entry(key).or_insert(columns).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Postgres;

    struct Address;
    impl Record for Address {
        fn fields() -> Vec<Field> {
            vec![Field::column("city"), Field::column("zip")]
        }
    }

    struct Audit;
    impl Record for Audit {
        fn fields() -> Vec<Field> {
            vec![Field::column("created_at")]
        }
    }

    struct User;
    impl Record for User {
        fn fields() -> Vec<Field> {
            vec![
                Field::column("id"),
                Field::embedded("address", Address::fields()),
                Field::Inline(Audit::fields()),
            ]
        }
    }

    #[test]
    fn test_flatten_with_separator() {
        let mut out = Vec::new();
        flatten_fields(&User::fields(), "", "_", &mut out);
        assert_eq!(out, ["id", "address_city", "address_zip", "created_at"]);

        let mut dotted = Vec::new();
        flatten_fields(&User::fields(), "", ".", &mut dotted);
        assert_eq!(dotted[1], "address.city");
    }

    #[test]
    fn test_record_columns_are_cached_per_table() {
        let a = record_columns::<User>("u", "_");
        let b = record_columns::<User>("u", "_");
        assert!(Arc::ptr_eq(&a, &b));

        let c = record_columns::<User>("", "_");
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a[0].to_sql(&Postgres), r#""u"."id""#);
        assert_eq!(c[0].to_sql(&Postgres), r#""id""#);
    }

    #[test]
    fn test_dotted_names_stay_one_identifier() {
        let cols = record_columns::<User>("u", ".");
        assert_eq!(cols[1].to_sql(&Postgres), r#""u"."address.city""#);
    }
}
