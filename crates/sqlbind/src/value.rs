//! SQL values and the conversions in and out of them.
//!
//! [`Value`] is the dialect-neutral representation of a bound argument and of
//! a column in a result row. Values go in through `From<T>` (see [`ToValue`])
//! and come back out through [`FromValue`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

/// A SQL value used as a bound parameter or read from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Bytes(Vec<u8>),
    /// UUID value.
    Uuid(Uuid),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
    /// Timestamp in UTC.
    TimestampTz(DateTime<Utc>),
    /// JSON document.
    Json(serde_json::Value),
}

impl Value {
    /// Whether this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in decode error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Json(_) => "json",
        }
    }

    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: only meant for logging/debugging. Statements are always
    /// executed with bound parameters.
    pub fn to_sql_inline(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => quote_literal(s),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Value::Uuid(u) => format!("'{u}'"),
            Value::Date(d) => format!("'{d}'"),
            Value::Time(t) => format!("'{t}'"),
            Value::Timestamp(ts) => format!("'{ts}'"),
            Value::TimestampTz(ts) => format!("'{}'", ts.to_rfc3339()),
            Value::Json(j) => quote_literal(&j.to_string()),
        }
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Marker for types accepted as bound arguments.
///
/// Blanket-implemented for everything convertible into [`Value`].
pub trait ToValue {
    fn to_value(self) -> Value;
}

impl<T: Into<Value>> ToValue for T {
    fn to_value(self) -> Value {
        self.into()
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Conversion from a column [`Value`] into a Rust type.
///
/// `from_value` is never called with [`Value::Null`]; NULL goes through
/// `from_null`, which fails unless the type can represent absence.
pub trait FromValue: Sized {
    /// Convert a non-NULL value.
    fn from_value(value: &Value) -> Result<Self, String>;

    /// Convert a NULL value.
    fn from_null() -> Result<Self, String> {
        Err("unexpected NULL for non-nullable destination".to_string())
    }
}

fn mismatch<T>(expected: &str, got: &Value) -> Result<T, String> {
    Err(format!("expected {expected}, got {}", got.type_name()))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }

    fn from_null() -> Result<Self, String> {
        Ok(Value::Null)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        T::from_value(value).map(Some)
    }

    fn from_null() -> Result<Self, String> {
        Ok(None)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            other => mismatch("bool", other),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self, String> {
                    match value {
                        Value::Int(n) => <$t>::try_from(*n)
                            .map_err(|_| format!("integer {} out of range for {}", n, stringify!($t))),
                        Value::Bool(b) => Ok(<$t>::from(*b)),
                        other => mismatch(stringify!($t), other),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            other => mismatch("f64", other),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Uuid(u) => Ok(u.to_string()),
            other => mismatch("text", other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            other => mismatch("bytes", other),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::Text(s) => Uuid::parse_str(s).map_err(|e| e.to_string()),
            other => mismatch("uuid", other),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::Timestamp(ts) => Ok(ts.date()),
            Value::Text(s) => s.parse().map_err(|e: chrono::ParseError| e.to_string()),
            other => mismatch("date", other),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Time(t) => Ok(*t),
            Value::Text(s) => s.parse().map_err(|e: chrono::ParseError| e.to_string()),
            other => mismatch("time", other),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            Value::TimestampTz(ts) => Ok(ts.naive_utc()),
            Value::Text(s) => s.parse().map_err(|e: chrono::ParseError| e.to_string()),
            other => mismatch("timestamp", other),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::TimestampTz(ts) => Ok(*ts),
            Value::Timestamp(ts) => Ok(ts.and_utc()),
            Value::Text(s) => s.parse().map_err(|e: chrono::ParseError| e.to_string()),
            other => mismatch("timestamptz", other),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            Value::Text(s) => serde_json::from_str(s).map_err(|e| e.to_string()),
            other => mismatch("json", other),
        }
    }

    fn from_null() -> Result<Self, String> {
        Ok(serde_json::Value::Null)
    }
}
