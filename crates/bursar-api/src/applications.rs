//! Handlers for `/applications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/applications` | `?facility_id` required; optional `include_archived` |
//! | `POST` | `/applications` | Body: [`NewApplication`]; identifier allocated here |
//! | `GET`  | `/applications/:id` | 404 if not found |
//! | `POST` | `/applications/:id/status` | Body: `{"status":"submitted"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use bursar_core::{
  application::{Application, ApplicationStatus, NewApplication},
  store::ProgramStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Required: the facility whose applications to return.
  pub facility_id:      i64,
  #[serde(default)]
  pub include_archived: bool,
}

/// `GET /applications?facility_id=<id>[&include_archived=true]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Application>>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let applications = store
    .list_applications(params.facility_id, params.include_archived)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(applications))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /applications` — returns 201 with the allocated identifier.
///
/// Allocation conflicts surface as 409: an exhausted bucket cannot accept
/// another application until ghost entries are cleared.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewApplication>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let application = store
    .create_application(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(application)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /applications/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Application>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let application = store
    .get_application(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))?;
  Ok(Json(application))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: ApplicationStatus,
}

/// `POST /applications/:id/status` — body: `{"status":"under_review"}`
pub async fn set_status<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Application>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let application = store
    .update_status(id, body.status)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(application))
}
