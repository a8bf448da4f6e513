use std::time::Duration;

use serde_json::Value as JsonValue;
use sqlx_sqlite_handle::AccessMode;

/// Result type alias for verifier operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Ways a scenario can fail.
///
/// Every variant ends the scenario; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// A handle could not be opened.
   #[error("failed to open {mode} handle on '{store}': {source}")]
   Open {
      store: String,
      mode: AccessMode,
      #[source]
      source: sqlx_sqlite_handle::Error,
   },

   /// A transaction failed and was rolled back.
   #[error("transaction failed during {step}: {source}")]
   Transaction {
      step: &'static str,
      #[source]
      source: sqlx_sqlite_handle::Error,
   },

   /// A single statement failed.
   #[error("statement failed during {step}: {source}")]
   Statement {
      step: &'static str,
      #[source]
      source: sqlx_sqlite_handle::Error,
   },

   /// An observed value did not match the expected one.
   #[error("assertion failed during {step}: expected {expected}, got {actual}")]
   Assertion {
      step: &'static str,
      expected: JsonValue,
      actual: JsonValue,
   },

   /// The scenario did not signal completion in time.
   #[error("scenario timed out after {0:?}")]
   TimedOut(Duration),

   /// The scenario task ended (panicked or was cancelled) without signaling completion.
   #[error("scenario ended without signaling completion")]
   Abandoned,

   /// Configuration file could not be parsed.
   #[error("invalid configuration: {0}")]
   Config(#[from] serde_json::Error),

   /// The report could not be serialized.
   #[error("failed to write report: {0}")]
   Report(#[source] serde_json::Error),

   /// I/O error while reading configuration.
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::Open { .. } => "OPEN_FAILED".to_string(),
         Error::Transaction { .. } => "TRANSACTION_FAILED".to_string(),
         Error::Statement { .. } => "STATEMENT_FAILED".to_string(),
         Error::Assertion { .. } => "ASSERTION_FAILED".to_string(),
         Error::TimedOut(_) => "TIMED_OUT".to_string(),
         Error::Abandoned => "ABANDONED".to_string(),
         Error::Config(_) => "CONFIG_ERROR".to_string(),
         Error::Report(_) => "REPORT_ERROR".to_string(),
         Error::Io(_) => "IO_ERROR".to_string(),
      }
   }

   /// Error code of the underlying database failure, if there is one.
   pub fn database_error_code(&self) -> Option<String> {
      match self {
         Error::Open { source, .. }
         | Error::Transaction { source, .. }
         | Error::Statement { source, .. } => Some(source.error_code()),
         _ => None,
      }
   }
}
