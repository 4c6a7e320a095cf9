//! Handlers for `/facilities` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/facilities` | `?company_id` required; optional `include_archived` |
//! | `POST` | `/facilities` | Body: [`NewFacility`]; code assigned by the store |
//! | `GET`  | `/facilities/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use bursar_core::{
  facility::{Facility, NewFacility},
  store::ProgramStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Required: the company whose facilities to return.
  pub company_id:       i64,
  #[serde(default)]
  pub include_archived: bool,
}

/// `GET /facilities?company_id=<id>[&include_archived=true]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Facility>>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let facilities = store
    .list_facilities(params.company_id, params.include_archived)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(facilities))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /facilities` — body: `{"company_id":1,"name":"Main plant"}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewFacility>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let facility = store
    .create_facility(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(facility)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /facilities/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Facility>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let facility = store
    .get_facility(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("facility {id} not found")))?;
  Ok(Json(facility))
}
