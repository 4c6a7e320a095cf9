//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by walking its source chain for a
  /// [`bursar_core::Error`]. Registry and allocator conflicts map to 409,
  /// validation failures to 400, missing entities to 404; anything the
  /// domain layer does not recognise stays a 500.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    use bursar_core::Error as Core;

    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(e);
    let mut current: Option<&(dyn std::error::Error + 'static)> =
      Some(boxed.as_ref());
    while let Some(err) = current {
      if let Some(core) = err.downcast_ref::<Core>() {
        return match core {
          Core::EntityNotFound { .. } => ApiError::NotFound(core.to_string()),
          Core::InvalidShortName(_) => ApiError::BadRequest(core.to_string()),
          Core::ShortNameTaken(_)
          | Core::AllocatorExhausted { .. }
          | Core::ConstraintViolation(_) => ApiError::Conflict(core.to_string()),
          Core::Serialization(_) => break,
        };
      }
      current = err.source();
    }
    ApiError::Store(boxed)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
