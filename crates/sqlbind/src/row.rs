//! Result rows and row mapping traits.

use crate::error::{SqlError, SqlResult};
use crate::record::scoped_name;
use crate::value::{FromValue, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Column names of a result set, indexed once and shared by every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    names: Vec<String>,
    index: HashMap<String, usize>,
    separator: String,
}

impl Columns {
    /// Index `names` using the default `_` separator for embedded records.
    pub fn new(names: Vec<String>) -> Self {
        Self::with_separator(names, "_")
    }

    /// Index `names`; embedded record columns are `prefix + separator + name`.
    ///
    /// When a name repeats, lookups resolve to its first occurrence.
    pub fn with_separator(names: Vec<String>, separator: &str) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self {
            names,
            index,
            separator: separator.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Position of `name`, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Columns>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row; `values` must line up with `columns`.
    pub fn new(columns: Arc<Columns>, values: Vec<Value>) -> SqlResult<Self> {
        if columns.len() != values.len() {
            return Err(SqlError::Other(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &Arc<Columns> {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Raw value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.position(column).map(|i| &self.values[i])
    }

    /// Column name for an embedded field under `prefix`.
    pub fn scoped_name(&self, prefix: &str, name: &str) -> String {
        scoped_name(prefix, self.columns.separator(), name)
    }

    /// Try to get a column value, returning [`SqlError::Decode`] on failure.
    pub fn try_get_column<T: FromValue>(&self, column: &str) -> SqlResult<T> {
        let idx = self
            .columns
            .position(column)
            .ok_or_else(|| SqlError::decode(column, "column not found in result set"))?;
        decode_at(&self.values[idx], column)
    }

    /// Try to get a value by position.
    pub fn try_get_index<T: FromValue>(&self, idx: usize) -> SqlResult<T> {
        let name = self
            .columns
            .names()
            .get(idx)
            .ok_or_else(|| SqlError::decode(format!("#{idx}"), "column index out of range"))?;
        decode_at(&self.values[idx], name)
    }

    /// A row holding only the columns at `indices`, in that order.
    pub(crate) fn project(&self, indices: &[usize], columns: &Arc<Columns>) -> Row {
        Row {
            columns: columns.clone(),
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

fn decode_at<T: FromValue>(value: &Value, column: &str) -> SqlResult<T> {
    let decoded = if value.is_null() {
        T::from_null()
    } else {
        T::from_value(value)
    };
    decoded.map_err(|message| SqlError::decode(column, message))
}

/// In-memory result set returned by clients.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    columns: Arc<Columns>,
    rows: VecDeque<Vec<Value>>,
}

impl RowSet {
    /// An empty result set with the given column names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_columns(Arc::new(Columns::new(
            names.into_iter().map(Into::into).collect(),
        )))
    }

    pub fn from_columns(columns: Arc<Columns>) -> Self {
        Self {
            columns,
            rows: VecDeque::new(),
        }
    }

    /// Re-index the column names with a different embedded-record separator.
    pub fn with_separator(mut self, separator: &str) -> Self {
        if self.columns.separator() != separator {
            self.columns = Arc::new(Columns::with_separator(
                self.columns.names().to_vec(),
                separator,
            ));
        }
        self
    }

    /// Append a row; its length must match the column count.
    pub fn push<I, V>(&mut self, row: I) -> SqlResult<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = row.into_iter().map(Into::into).collect();
        if values.len() != self.columns.len() {
            return Err(SqlError::Other(format!(
                "row has {} values for {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push_back(values);
        Ok(())
    }

    /// Builder form of [`RowSet::push`].
    pub fn with_row<I, V>(mut self, row: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push(row)?;
        Ok(self)
    }

    pub fn columns(&self) -> &Arc<Columns> {
        &self.columns
    }

    /// Number of rows not yet consumed.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take the next row.
    pub fn pop_front(&mut self) -> Option<Row> {
        self.rows.pop_front().map(|values| Row {
            columns: self.columns.clone(),
            values,
        })
    }

    /// All remaining rows.
    pub fn into_rows(self) -> Vec<Row> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|values| Row {
                columns: columns.clone(),
                values,
            })
            .collect()
    }
}

/// Trait for types that can be built from a result row.
///
/// This trait should typically be derived using `#[derive(FromRow)]`
/// from the `sqlbind-derive` crate.
///
/// # Example
///
/// ```ignore
/// use sqlbind::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     email: Option<String>,
/// }
/// ```
pub trait FromRow: Sized {
    /// Build from the columns under `prefix` (empty for top-level records).
    fn from_scope(row: &Row, prefix: &str) -> SqlResult<Self>;

    /// Convert a row into Self.
    fn from_row(row: &Row) -> SqlResult<Self> {
        Self::from_scope(row, "")
    }
}

// Scalars bind the first column.
macro_rules! impl_from_row_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromRow for $t {
                fn from_scope(row: &Row, _prefix: &str) -> SqlResult<Self> {
                    row.try_get_index(0)
                }
            }
        )*
    };
}

impl_from_row_scalar!(
    Value,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    Vec<u8>,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    serde_json::Value,
);

impl<T: FromValue> FromRow for Option<T> {
    fn from_scope(row: &Row, _prefix: &str) -> SqlResult<Self> {
        row.try_get_index(0)
    }
}

impl FromRow for () {
    fn from_scope(_row: &Row, _prefix: &str) -> SqlResult<Self> {
        Ok(())
    }
}

// Tuples bind positionally.
macro_rules! impl_from_row_tuple {
    ($($idx:tt => $t:ident),+) => {
        impl<$($t: FromValue),+> FromRow for ($($t,)+) {
            fn from_scope(row: &Row, _prefix: &str) -> SqlResult<Self> {
                Ok(($(row.try_get_index::<$t>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(0 => A);
impl_from_row_tuple!(0 => A, 1 => B);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);
