//! Binding result cursors into typed destinations.
//!
//! A [`Destination`] says what shape the rows end up in:
//!
//! - `One`: the first row only; no rows is [`SqlError::NotFound`]
//! - `Many`: every row, in order
//! - `Map`: keyed by one or more key columns, valued by the remaining columns
//!   or by the whole row
//! - `Presence`: keyed by the key columns, valued `true`
//!
//! Column positions are resolved once per cursor. A NULL only fails to bind
//! when the destination type cannot represent absence.

use crate::error::{SqlError, SqlResult};
use crate::row::{Columns, FromRow, Row, RowSet};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

/// A source of result rows.
pub trait Cursor {
    /// Column names shared by every row.
    fn columns(&self) -> &Arc<Columns>;

    /// The next row, or `None` when exhausted.
    fn next_row(&mut self) -> SqlResult<Option<Row>>;

    /// Number of remaining rows, when known.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

impl Cursor for RowSet {
    fn columns(&self) -> &Arc<Columns> {
        RowSet::columns(self)
    }

    fn next_row(&mut self) -> SqlResult<Option<Row>> {
        Ok(self.pop_front())
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

/// What a keyed mapping stores per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapValue {
    /// Every column that is not a key column.
    Remaining,
    /// The whole row.
    Record,
}

/// Shape rows are bound into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    One,
    Many,
    Map {
        key_columns: Vec<String>,
        value: MapValue,
    },
    Presence {
        key_columns: Vec<String>,
    },
}

impl Destination {
    /// Map keyed by the first column, valued by the rest.
    pub fn map_first_column() -> Self {
        Destination::Map {
            key_columns: Vec::new(),
            value: MapValue::Remaining,
        }
    }
}

/// Bound result, mirroring [`Destination`].
#[derive(Debug, Clone, PartialEq)]
pub enum Bound<K: Eq + Hash, V> {
    One(V),
    Many(Vec<V>),
    Map(HashMap<K, V>),
    Presence(HashMap<K, bool>),
}

struct KeyLayout {
    key: Vec<usize>,
    key_columns: Arc<Columns>,
    rest: Vec<usize>,
    rest_columns: Arc<Columns>,
}

impl KeyLayout {
    /// Resolve key columns by name; an empty list means the first column.
    fn resolve(columns: &Columns, key_names: &[String]) -> SqlResult<Self> {
        let key: Vec<usize> = if key_names.is_empty() {
            if columns.is_empty() {
                return Err(SqlError::decode("#0", "result set has no columns"));
            }
            vec![0]
        } else {
            key_names
                .iter()
                .map(|name| {
                    columns
                        .position(name)
                        .ok_or_else(|| SqlError::decode(name.as_str(), "key column not in result set"))
                })
                .collect::<SqlResult<_>>()?
        };
        let rest: Vec<usize> = (0..columns.len()).filter(|i| !key.contains(i)).collect();

        let names = |indices: &[usize]| -> Arc<Columns> {
            Arc::new(Columns::with_separator(
                indices.iter().map(|&i| columns.names()[i].clone()).collect(),
                columns.separator(),
            ))
        };
        Ok(Self {
            key_columns: names(&key),
            rest_columns: names(&rest),
            key,
            rest,
        })
    }

    fn key<K: FromRow>(&self, row: &Row) -> SqlResult<K> {
        K::from_row(&row.project(&self.key, &self.key_columns))
    }

    fn rest<V: FromRow>(&self, row: &Row) -> SqlResult<V> {
        V::from_row(&row.project(&self.rest, &self.rest_columns))
    }
}

/// Upper bound on the pre-sized capacity of a bound collection.
const MAX_PRESIZE: usize = 4096;

/// Bind every row of `cursor` into `dest`.
///
/// `capacity_hint` (or the cursor's own size hint) only pre-sizes the
/// collection, up to [`MAX_PRESIZE`] entries; all rows are always consumed.
pub fn bind<K, V, C>(
    cursor: &mut C,
    dest: &Destination,
    capacity_hint: Option<usize>,
) -> SqlResult<Bound<K, V>>
where
    K: FromRow + Eq + Hash,
    V: FromRow,
    C: Cursor + ?Sized,
{
    let capacity = capacity_hint
        .or_else(|| cursor.size_hint())
        .unwrap_or(0)
        .min(MAX_PRESIZE);

    match dest {
        Destination::One => match cursor.next_row()? {
            Some(row) => Ok(Bound::One(V::from_row(&row)?)),
            None => Err(SqlError::not_found("query returned no rows")),
        },
        Destination::Many => {
            let mut out = Vec::with_capacity(capacity);
            while let Some(row) = cursor.next_row()? {
                out.push(V::from_row(&row)?);
            }
            Ok(Bound::Many(out))
        }
        Destination::Map { key_columns, value } => {
            let layout = KeyLayout::resolve(cursor.columns(), key_columns)?;
            let mut out = HashMap::with_capacity(capacity);
            while let Some(row) = cursor.next_row()? {
                let key = layout.key::<K>(&row)?;
                let item = match value {
                    MapValue::Remaining => layout.rest::<V>(&row)?,
                    MapValue::Record => V::from_row(&row)?,
                };
                out.insert(key, item);
            }
            Ok(Bound::Map(out))
        }
        Destination::Presence { key_columns } => {
            let layout = KeyLayout::resolve(cursor.columns(), key_columns)?;
            let mut out = HashMap::with_capacity(capacity);
            while let Some(row) = cursor.next_row()? {
                out.insert(layout.key::<K>(&row)?, true);
            }
            Ok(Bound::Presence(out))
        }
    }
}

fn shape_mismatch() -> SqlError {
    SqlError::Other("bound shape does not match destination".to_string())
}

/// Bind the first row.
pub fn scan_one<T: FromRow, C: Cursor + ?Sized>(cursor: &mut C) -> SqlResult<T> {
    match bind::<(), T, C>(cursor, &Destination::One, None)? {
        Bound::One(v) => Ok(v),
        _ => Err(shape_mismatch()),
    }
}

/// Bind the first row, if any.
pub fn scan_opt<T: FromRow, C: Cursor + ?Sized>(cursor: &mut C) -> SqlResult<Option<T>> {
    match scan_one(cursor) {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Bind every row.
pub fn scan_all<T: FromRow, C: Cursor + ?Sized>(cursor: &mut C) -> SqlResult<Vec<T>> {
    match bind::<(), T, C>(cursor, &Destination::Many, None)? {
        Bound::Many(v) => Ok(v),
        _ => Err(shape_mismatch()),
    }
}

/// Bind into `first column -> remaining columns`.
pub fn scan_map<K, V, C>(cursor: &mut C) -> SqlResult<HashMap<K, V>>
where
    K: FromRow + Eq + Hash,
    V: FromRow,
    C: Cursor + ?Sized,
{
    match bind::<K, V, C>(cursor, &Destination::map_first_column(), None)? {
        Bound::Map(m) => Ok(m),
        _ => Err(shape_mismatch()),
    }
}

/// Bind into `key columns -> whole row as V`.
pub fn scan_keyed<K, V, C>(cursor: &mut C, key_columns: &[String]) -> SqlResult<HashMap<K, V>>
where
    K: FromRow + Eq + Hash,
    V: FromRow,
    C: Cursor + ?Sized,
{
    let dest = Destination::Map {
        key_columns: key_columns.to_vec(),
        value: MapValue::Record,
    };
    match bind::<K, V, C>(cursor, &dest, None)? {
        Bound::Map(m) => Ok(m),
        _ => Err(shape_mismatch()),
    }
}

/// Collect the distinct keys found in `key_columns`.
pub fn scan_set<K, C>(cursor: &mut C, key_columns: &[String]) -> SqlResult<HashSet<K>>
where
    K: FromRow + Eq + Hash,
    C: Cursor + ?Sized,
{
    let dest = Destination::Presence {
        key_columns: key_columns.to_vec(),
    };
    match bind::<K, (), C>(cursor, &dest, None)? {
        Bound::Presence(m) => Ok(m.into_keys().collect()),
        _ => Err(shape_mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn pairs() -> RowSet {
        RowSet::new(["id", "name"])
            .with_row(vec![Value::Int(1), Value::from("x")])
            .unwrap()
            .with_row(vec![Value::Int(2), Value::from("y")])
            .unwrap()
    }

    #[test]
    fn test_key_value_map() {
        let map: HashMap<i64, String> = scan_map(&mut pairs()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&1], "x");
        assert_eq!(map[&2], "y");
    }

    #[test]
    fn test_oversized_capacity_hint_only_presizes() {
        let many = bind::<(), i64, _>(&mut pairs(), &Destination::Many, Some(usize::MAX)).unwrap();
        assert_eq!(many, Bound::Many(vec![1, 2]));

        let map = bind::<i64, String, _>(
            &mut pairs(),
            &Destination::map_first_column(),
            Some(usize::MAX),
        )
        .unwrap();
        assert_eq!(
            map,
            Bound::Map(HashMap::from([(1, "x".to_string()), (2, "y".to_string())]))
        );

        let presence = bind::<i64, (), _>(
            &mut pairs(),
            &Destination::Presence { key_columns: vec!["id".to_string()] },
            Some(usize::MAX),
        )
        .unwrap();
        assert_eq!(presence, Bound::Presence(HashMap::from([(1, true), (2, true)])));
    }

    #[test]
    fn test_one_and_not_found() {
        let first: (i64, String) = scan_one(&mut pairs()).unwrap();
        assert_eq!(first, (1, "x".to_string()));

        let mut empty = RowSet::new(["id"]);
        let err = scan_one::<i64, _>(&mut empty).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(scan_opt::<i64, _>(&mut RowSet::new(["id"])).unwrap(), None);
    }

    #[test]
    fn test_many_ignores_small_capacity_hint() {
        let mut rows = pairs();
        let bound: Bound<(), (i64, String)> = bind(&mut rows, &Destination::Many, Some(1)).unwrap();
        match bound {
            Bound::Many(v) => assert_eq!(v.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_presence_and_composite_keys() {
        let mut rows = RowSet::new(["a", "b", "v"]);
        rows.push(vec![Value::Int(1), Value::from("p"), Value::Null]).unwrap();
        rows.push(vec![Value::Int(1), Value::from("q"), Value::Int(5)]).unwrap();
        let dest = Destination::Map {
            key_columns: vec!["a".into(), "b".into()],
            value: MapValue::Remaining,
        };
        let bound: Bound<(i64, String), Option<i64>> = bind(&mut rows, &dest, None).unwrap();
        let Bound::Map(map) = bound else {
            panic!("expected map");
        };
        assert_eq!(map[&(1, "p".to_string())], None);
        assert_eq!(map[&(1, "q".to_string())], Some(5));

        let set: HashSet<i64> = scan_set(&mut pairs(), &["id".to_string()]).unwrap();
        assert!(set.contains(&1) && set.contains(&2));
    }

    #[test]
    fn test_null_into_non_nullable_fails() {
        let mut rows = RowSet::new(["id"]).with_row([Value::Null]).unwrap();
        assert!(scan_all::<i64, _>(&mut rows).unwrap_err().is_decode());
    }

    #[test]
    fn test_unknown_key_column() {
        let err = scan_set::<i64, _>(&mut pairs(), &["nope".to_string()]).unwrap_err();
        assert!(err.is_decode());
    }
}
