//! Error types for `bursar-core`.

use thiserror::Error;

use crate::archive::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{kind} not found: {id}")]
  EntityNotFound { kind: EntityKind, id: i64 },

  /// No free sequence number left in an identifier bucket. A bucket holds at
  /// most 99 applications over its whole history, ghosted ones included.
  #[error("identifier bucket {bucket} is exhausted")]
  AllocatorExhausted { bucket: String },

  #[error("constraint violation: {0}")]
  ConstraintViolation(String),

  #[error("invalid short name: {0:?}")]
  InvalidShortName(String),

  #[error("short name already in use: {0:?}")]
  ShortNameTaken(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
