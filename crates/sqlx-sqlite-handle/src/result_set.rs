use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A decoded row, keyed by column name in result-column order.
pub type Row = IndexMap<String, JsonValue>;

/// Outcome of one statement: returned rows plus write bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
   /// Rows in the order SQLite produced them.
   pub rows: Vec<Row>,
   /// Rows inserted, updated or deleted by the statement.
   pub rows_affected: u64,
   /// ROWID of the last inserted row, present only when `rows_affected > 0`.
   pub insert_id: Option<i64>,
}

impl ResultSet {
   pub fn len(&self) -> usize {
      self.rows.len()
   }

   pub fn is_empty(&self) -> bool {
      self.rows.is_empty()
   }

   /// Row at `index`, if any.
   pub fn item(&self, index: usize) -> Option<&Row> {
      self.rows.get(index)
   }

   /// Value of `column` in the row at `index`.
   pub fn value(&self, index: usize, column: &str) -> Option<&JsonValue> {
      self.item(index).and_then(|row| row.get(column))
   }

   pub fn iter(&self) -> impl Iterator<Item = &Row> {
      self.rows.iter()
   }
}
