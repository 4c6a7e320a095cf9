//! Handlers for `/companies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/companies` | Optional `?include_archived=true` |
//! | `POST` | `/companies` | Body: [`NewCompany`]; short name derived if absent |
//! | `GET`  | `/companies/:id` | 404 if not found |
//! | `POST` | `/companies/:id/rename-short-name` | Rewrites all owned identifiers |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use bursar_core::{
  company::{Company, NewCompany},
  store::ProgramStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub include_archived: bool,
}

/// `GET /companies[?include_archived=true]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Company>>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let companies = store
    .list_companies(params.include_archived)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(companies))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /companies` — body: `{"name":"Acme Corp","short_name":null}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewCompany>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let company = store
    .create_company(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(company)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /companies/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Company>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let company = store
    .get_company(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("company {id} not found")))?;
  Ok(Json(company))
}

// ─── Rename ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RenameBody {
  pub short_name: String,
}

/// `POST /companies/:id/rename-short-name` — body: `{"short_name":"APEX"}`
///
/// Changes the short name and rewrites the prefix of every identifier the
/// company owns, live and ghosted.
pub async fn rename<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<RenameBody>,
) -> Result<Json<Company>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let company = store
    .rename_short_name(id, body.short_name)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(company))
}
