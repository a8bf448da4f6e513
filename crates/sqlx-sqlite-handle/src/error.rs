/// Result type alias for handle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SQLite handle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the underlying store.
   #[error(transparent)]
   Store(#[from] sqlx_sqlite_store::Error),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Transaction failed and rollback also failed.
   #[error("transaction failed: {transaction_error}; rollback also failed: {rollback_error}")]
   TransactionRollbackFailed {
      transaction_error: String,
      rollback_error: String,
   },

   /// Store name is not a plain file name.
   #[error("invalid store name '{0}': must be a plain file name")]
   InvalidStoreName(String),

   /// I/O error when preparing the store location.
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// Database errors carry SQLite's own result code as `SQLITE_<code>`.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => sqlx_error_code(e),
         Error::Store(sqlx_sqlite_store::Error::DatabaseClosed) => "DATABASE_CLOSED".to_string(),
         Error::Store(sqlx_sqlite_store::Error::Sqlx(e)) => sqlx_error_code(e),
         Error::Store(_) => "STORE_ERROR".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
         Error::InvalidStoreName(_) => "INVALID_STORE_NAME".to_string(),
         Error::Io(_) => "IO_ERROR".to_string(),
      }
   }
}

fn sqlx_error_code(e: &sqlx::Error) -> String {
   if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
      return format!("SQLITE_{}", code);
   }
   "SQLX_ERROR".to_string()
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_unsupported_datatype() {
      let err = Error::UnsupportedDatatype("WEIRD".into());
      assert_eq!(err.error_code(), "UNSUPPORTED_DATATYPE");
      assert!(err.to_string().contains("WEIRD"));
   }

   #[test]
   fn test_error_code_transaction_rollback_failed() {
      let err = Error::TransactionRollbackFailed {
         transaction_error: "constraint".into(),
         rollback_error: "busy".into(),
      };
      assert_eq!(err.error_code(), "TRANSACTION_ROLLBACK_FAILED");
      assert!(err.to_string().contains("constraint"));
      assert!(err.to_string().contains("busy"));
   }

   #[test]
   fn test_error_code_invalid_store_name() {
      let err = Error::InvalidStoreName("../escape.db".into());
      assert_eq!(err.error_code(), "INVALID_STORE_NAME");
      assert!(err.to_string().contains("../escape.db"));
   }

   #[test]
   fn test_error_code_database_closed() {
      let err = Error::Store(sqlx_sqlite_store::Error::DatabaseClosed);
      assert_eq!(err.error_code(), "DATABASE_CLOSED");
   }

   #[test]
   fn test_error_code_io() {
      let err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
      assert_eq!(err.error_code(), "IO_ERROR");
   }

   #[test]
   fn test_error_code_sqlx_non_database() {
      // RowNotFound is not a database error, so no SQLite code
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
   }
}
