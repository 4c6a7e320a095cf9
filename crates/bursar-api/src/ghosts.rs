//! Handlers for the `/ghost-ids` registry endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/ghost-ids` | Optional `?company_id=<id>` |
//! | `POST` | `/ghost-ids/clear` | Body: `{"identifiers":["ACME-001-101"]}` |
//! | `POST` | `/ghost-ids/clear-all` | Empties the registry |
//!
//! Clearing an entry makes that exact identifier allocatable again; both
//! clears are deliberate admin actions, never side effects.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use bursar_core::{archive::GhostId, store::ProgramStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub company_id: Option<i64>,
}

/// `GET /ghost-ids[?company_id=<id>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<GhostId>>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let ghosts = store
    .list_ghost_ids(params.company_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(ghosts))
}

// ─── Clear ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ClearBody {
  pub identifiers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
  pub cleared: u64,
}

/// `POST /ghost-ids/clear` — body: `{"identifiers":["ACME-001-101"]}`
pub async fn clear<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<ClearBody>,
) -> Result<Json<ClearedResponse>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let cleared = store
    .clear_ghost_ids(body.identifiers)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(ClearedResponse { cleared }))
}

/// `POST /ghost-ids/clear-all`
pub async fn clear_all<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<ClearedResponse>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let cleared = store
    .clear_all_ghost_ids()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(ClearedResponse { cleared }))
}
