//! Error type for `aigoal-store-sqlite`.

use aigoal_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A rule rejection or domain encoding failure from `aigoal-core`.
  #[error(transparent)]
  Core(#[from] aigoal_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column holds a value the domain types cannot represent.
  #[error("corrupt row: {0}")]
  Corrupt(String),
}

impl StoreError for Error {
  fn rejection(&self) -> Option<&aigoal_core::Error> {
    match self {
      Self::Core(e) => e.rejection(),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
