//! One read-write handle and two read-only handles on the same store.
//!
//! The writer recreates the table, the first reader sees it empty, the writer
//! inserts one row, and the second reader sees exactly that row.

use serde_json::{Value as JsonValue, json};
use sqlx_sqlite_handle::{Handle, OpenOptions, ResultSet, Statement};
use tracing::debug;

use crate::scenario::{Scenario, ScenarioContext, ScenarioFuture};
use crate::{Error, Result};

pub const STORE_NAME: &str = "parallel-reader-test.db";
pub const TABLE: &str = "tt";
pub const COLUMN: &str = "test_data";
pub const TEST_DATA: &str = "My-test-data";

#[derive(Debug, Clone)]
pub struct ParallelReaderScenario {
   store_name: String,
}

impl Default for ParallelReaderScenario {
   fn default() -> Self {
      Self {
         store_name: STORE_NAME.to_string(),
      }
   }
}

impl ParallelReaderScenario {
   /// Use a different base store name. Variants may still prefix it.
   pub fn with_store_name(store_name: impl Into<String>) -> Self {
      Self {
         store_name: store_name.into(),
      }
   }
}

impl Scenario for ParallelReaderScenario {
   fn suite(&self) -> &str {
      "parallel reader test(s)"
   }

   fn description(&self) -> &str {
      "same database file with parallel read-only handles"
   }

   fn run(&self, ctx: ScenarioContext) -> ScenarioFuture {
      let store_name = ctx.store_name(&self.store_name);
      Box::pin(verify_parallel_readers(ctx, store_name))
   }
}

/// Run the five steps against `store_name` under `ctx.location()`.
///
/// Handles are released when this returns; the store itself stays open.
pub async fn verify_parallel_readers(ctx: ScenarioContext, store_name: String) -> Result<()> {
   let _pending = ctx.dispatch();

   let writer = open(&ctx, &store_name, false).await?;
   let reader1 = open(&ctx, &store_name, true).await?;
   let reader2 = open(&ctx, &store_name, true).await?;

   writer
      .transaction(vec![
         Statement::new(format!("DROP TABLE IF EXISTS {TABLE}")),
         Statement::new(format!("CREATE TABLE IF NOT EXISTS {TABLE} ({COLUMN})")),
      ])
      .await
      .map_err(|source| Error::Transaction {
         step: "create table",
         source,
      })?;

   let rs = reader1
      .execute(format!("SELECT COUNT(*) AS recordCount FROM {TABLE}"), vec![])
      .await
      .map_err(|source| Error::Statement {
         step: "count rows",
         source,
      })?;
   expect_value(&rs, "count rows", "recordCount", json!(0))?;

   writer
      .transaction(vec![
         Statement::new(format!("INSERT INTO {TABLE} VALUES (?)"))
            .with_values(vec![json!(TEST_DATA)]),
      ])
      .await
      .map_err(|source| Error::Transaction {
         step: "insert row",
         source,
      })?;

   let rs = reader2
      .execute(format!("SELECT {COLUMN} FROM {TABLE}"), vec![])
      .await
      .map_err(|source| Error::Statement {
         step: "select inserted row",
         source,
      })?;
   expect_len(&rs, "select inserted row", 1)?;
   expect_value(&rs, "select inserted row", COLUMN, json!(TEST_DATA))?;

   debug!(store = %store_name, variant = %ctx.variant(), "Parallel readers verified");

   Ok(())
}

async fn open(ctx: &ScenarioContext, store_name: &str, read_only: bool) -> Result<Handle> {
   let options = OpenOptions::new()
      .read_only(read_only)
      .config(ctx.store_config().clone());
   let mode = options.mode();

   Handle::open_in(ctx.location(), store_name, options)
      .await
      .map_err(|source| Error::Open {
         store: store_name.to_string(),
         mode,
         source,
      })
}

fn expect_len(rs: &ResultSet, step: &'static str, expected: usize) -> Result<()> {
   if rs.len() != expected {
      return Err(Error::Assertion {
         step,
         expected: json!(expected),
         actual: json!(rs.len()),
      });
   }
   Ok(())
}

fn expect_value(rs: &ResultSet, step: &'static str, column: &str, expected: JsonValue) -> Result<()> {
   let actual = rs.value(0, column).cloned().unwrap_or(JsonValue::Null);
   if actual != expected {
      return Err(Error::Assertion {
         step,
         expected,
         actual,
      });
   }
   Ok(())
}
