//! SQLite value to JSON decoding

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Column, Row as _, TypeInfo, Value, ValueRef};

use crate::result_set::Row;
use crate::{Error, Result};

/// Convert a single SQLite value to JSON.
///
/// BLOBs become base64 strings; non-finite REALs become `null`.
pub(crate) fn to_json(value: SqliteValueRef<'_>) -> Result<JsonValue> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let type_name = value.type_info().name().to_string();
   let value = ValueRef::to_owned(&value);

   match type_name.as_str() {
      "NULL" => Ok(JsonValue::Null),
      "INTEGER" | "BOOLEAN" => Ok(JsonValue::from(value.try_decode::<i64>()?)),
      "REAL" => {
         let v = value.try_decode::<f64>()?;
         Ok(serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null))
      }
      "TEXT" | "DATE" | "TIME" | "DATETIME" => {
         Ok(JsonValue::String(value.try_decode::<String>()?))
      }
      "BLOB" => {
         let bytes = value.try_decode::<Vec<u8>>()?;
         Ok(JsonValue::String(BASE64.encode(bytes)))
      }
      other => Err(Error::UnsupportedDatatype(other.to_string())),
   }
}

/// Decode a row into a column-ordered map.
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Row> {
   let mut values = Row::with_capacity(row.len());
   for (i, column) in row.columns().iter().enumerate() {
      let v = row.try_get_raw(i)?;
      values.insert(column.name().to_string(), to_json(v)?);
   }
   Ok(values)
}

pub(crate) fn decode_rows(rows: &[SqliteRow]) -> Result<Vec<Row>> {
   rows.iter().map(decode_row).collect()
}
