//! Statement and transaction execution on a single connection

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Connection, Sqlite, SqliteConnection};
use sqlx_sqlite_store::WriteGuard;
use tracing::{debug, trace};

use crate::decode::decode_rows;
use crate::result_set::ResultSet;
use crate::{Error, Result};

/// Statement in a transaction with query and bind values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
   pub query: String,
   #[serde(default)]
   pub values: Vec<JsonValue>,
}

impl Statement {
   pub fn new(query: impl Into<String>) -> Self {
      Self {
         query: query.into(),
         values: Vec::new(),
      }
   }

   pub fn with_values(mut self, values: Vec<JsonValue>) -> Self {
      self.values = values;
      self
   }
}

/// Run one statement and collect its rows, affected-row count and insert id.
///
/// The affected-row count is the change in `total_changes()` across the
/// statement, so a SELECT that follows a write reports zero instead of
/// inheriting the earlier write's `changes()`.
pub(crate) async fn run_statement(
   conn: &mut SqliteConnection,
   statement: Statement,
) -> Result<ResultSet> {
   let Statement { query, values } = statement;
   trace!(query = %query, params = values.len(), "Executing statement");

   let before: i64 = sqlx::query_scalar("SELECT total_changes()")
      .fetch_one(&mut *conn)
      .await?;

   let mut q = sqlx::query(&query);
   for value in values {
      q = bind_value(q, value);
   }
   let rows = q.fetch_all(&mut *conn).await?;

   let after: i64 = sqlx::query_scalar("SELECT total_changes()")
      .fetch_one(&mut *conn)
      .await?;

   let rows_affected = u64::try_from(after - before).unwrap_or_default();
   let insert_id = if rows_affected > 0 {
      Some(
         sqlx::query_scalar::<_, i64>("SELECT last_insert_rowid()")
            .fetch_one(&mut *conn)
            .await?,
      )
   } else {
      None
   };

   Ok(ResultSet {
      rows: decode_rows(&rows)?,
      rows_affected,
      insert_id,
   })
}

async fn run_statements(
   conn: &mut SqliteConnection,
   statements: Vec<Statement>,
) -> Result<Vec<ResultSet>> {
   let mut results = Vec::with_capacity(statements.len());
   for statement in statements {
      results.push(run_statement(&mut *conn, statement).await?);
   }
   Ok(results)
}

/// Execute `statements` atomically on the writer under `BEGIN IMMEDIATE`.
///
/// Any error, including a failed COMMIT, rolls the batch back. The guard tracks
/// the transaction, so a caller that drops this future midway leaves a
/// rollback for the next writer instead of an open transaction.
pub(crate) async fn run_write_transaction(
   writer: &mut WriteGuard,
   statements: Vec<Statement>,
) -> Result<Vec<ResultSet>> {
   writer.begin("BEGIN IMMEDIATE").await?;

   let result = async {
      let results = run_statements(&mut *writer, statements).await?;
      writer.commit().await?;
      Ok::<Vec<ResultSet>, Error>(results)
   }
   .await;

   match result {
      Ok(results) => {
         debug!("Transaction committed ({} statement(s))", results.len());
         Ok(results)
      }
      Err(e) => rolled_back(e, writer.rollback().await.map_err(Error::from)),
   }
}

/// Execute `statements` against one read snapshot.
///
/// Uses an sqlx transaction, which rolls back on drop, so a cancelled read
/// never returns a connection to the pool mid-transaction.
pub(crate) async fn run_read_transaction(
   conn: &mut SqliteConnection,
   statements: Vec<Statement>,
) -> Result<Vec<ResultSet>> {
   let mut tx = conn.begin().await?;

   match run_statements(&mut tx, statements).await {
      Ok(results) => {
         tx.commit().await?;
         Ok(results)
      }
      Err(e) => rolled_back(e, tx.rollback().await.map_err(Error::from)),
   }
}

fn rolled_back(error: Error, rollback: Result<()>) -> Result<Vec<ResultSet>> {
   match rollback {
      Ok(()) => {
         debug!("Transaction rolled back: {}", error);
         Err(error)
      }
      Err(rollback_err) => Err(Error::TransactionRollbackFailed {
         transaction_error: error.to_string(),
         rollback_error: rollback_err.to_string(),
      }),
   }
}

/// SQLite storage class a JSON bind value is stored as.
#[derive(Debug, Clone, PartialEq)]
enum BindArg {
   Null,
   Integer(i64),
   Real(f64),
   Text(String),
}

impl From<JsonValue> for BindArg {
   fn from(value: JsonValue) -> Self {
      match value {
         JsonValue::Null => BindArg::Null,
         JsonValue::Bool(b) => BindArg::Integer(i64::from(b)),
         JsonValue::Number(number) => match (number.as_i64(), number.as_u64()) {
            (Some(int_val), _) => BindArg::Integer(int_val),
            // Past i64::MAX; REAL keeps the magnitude
            (None, Some(uint_val)) => BindArg::Real(uint_val as f64),
            _ => BindArg::Real(number.as_f64().unwrap_or_default()),
         },
         JsonValue::String(s) => BindArg::Text(s),
         nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => BindArg::Text(nested.to_string()),
      }
   }
}

pub(crate) fn bind_value<'a>(
   query: sqlx::query::Query<'a, Sqlite, SqliteArguments<'a>>,
   value: JsonValue,
) -> sqlx::query::Query<'a, Sqlite, SqliteArguments<'a>> {
   match BindArg::from(value) {
      BindArg::Null => query.bind(None::<i64>),
      BindArg::Integer(v) => query.bind(v),
      BindArg::Real(v) => query.bind(v),
      BindArg::Text(v) => query.bind(v),
   }
}
