//! [`GenericClient`] for `tokio-postgres` connections and transactions.
//!
//! Arguments are sent as [`Value`]s through [`ToSql`]; result columns are
//! converted back into [`Value`]s by their Postgres type.

use crate::client::{ExecResult, GenericClient};
use crate::error::{SqlError, SqlResult};
use crate::row::{Columns, RowSet};
use crate::value::Value;
use bytes::BytesMut;
use std::error::Error;
use std::sync::Arc;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
            Value::Time(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
            Value::TimestampTz(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn column_value(row: &tokio_postgres::Row, idx: usize) -> SqlResult<Value> {
    let column = &row.columns()[idx];
    let decode = |e: tokio_postgres::Error| SqlError::decode(column.name(), e.to_string());

    let value = match *column.type_() {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map_err(decode)?.map(Value::Bool),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map_err(decode)?
            .map(Value::from),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map_err(decode)?
            .map(Value::from),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map_err(decode)?.map(Value::Int),
        Type::OID => row
            .try_get::<_, Option<u32>>(idx)
            .map_err(decode)?
            .map(Value::from),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map_err(decode)?
            .map(Value::from),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map_err(decode)?.map(Value::Float),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(idx)
            .map_err(decode)?
            .map(Value::Text),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .map_err(decode)?
            .map(Value::Bytes),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(idx).map_err(decode)?.map(Value::Uuid),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .map_err(decode)?
            .map(Value::Date),
        Type::TIME => row
            .try_get::<_, Option<chrono::NaiveTime>>(idx)
            .map_err(decode)?
            .map(Value::Time),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .map_err(decode)?
            .map(Value::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map_err(decode)?
            .map(Value::TimestampTz),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map_err(decode)?
            .map(Value::Json),
        ref other => {
            return Err(SqlError::decode(
                column.name(),
                format!("unsupported column type {other}"),
            ));
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

fn to_row_set(rows: Vec<tokio_postgres::Row>, columns: &[tokio_postgres::Column]) -> SqlResult<RowSet> {
    let names = columns.iter().map(|c| c.name().to_string()).collect();
    let mut set = RowSet::from_columns(Arc::new(Columns::new(names)));
    for row in &rows {
        let values = (0..row.len())
            .map(|idx| column_value(row, idx))
            .collect::<SqlResult<Vec<_>>>()?;
        set.push(values)?;
    }
    Ok(set)
}

macro_rules! impl_pg_client {
    ($ty:ty) => {
        impl GenericClient for $ty {
            async fn execute(&self, sql: &str, args: &[Value]) -> SqlResult<ExecResult> {
                let n = <$ty>::execute(self, sql, &params(args)).await?;
                Ok(ExecResult::new(n))
            }

            async fn query(&self, sql: &str, args: &[Value]) -> SqlResult<RowSet> {
                let stmt = self.prepare(sql).await?;
                let rows = <$ty>::query(self, &stmt, &params(args)).await?;
                to_row_set(rows, stmt.columns())
            }
        }
    };
}

impl_pg_client!(tokio_postgres::Client);
impl_pg_client!(tokio_postgres::Transaction<'_>);
