//! Handlers for archive / restore / purge and the archived listing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/archive` | Body: [`ArchiveBody`]; cascades, writes ghost rows |
//! | `POST` | `/restore` | Body: [`RestoreBody`]; flat, no cascade |
//! | `POST` | `/purge` | Body: [`PurgeBody`]; archived targets only |
//! | `GET`  | `/archived` | Nested tree of everything archived |
//!
//! All three bulk operations are best-effort per id and always return 200
//! with a [`BulkOutcome`]; per-id problems are reported in `failed`, never as
//! an HTTP error.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
};
use bursar_core::{
  archive::{ArchivedTree, BulkOutcome, EntityKind},
  store::ProgramStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Archive ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ArchiveBody {
  pub kind:   EntityKind,
  pub ids:    Vec<i64>,
  pub reason: String,
  /// User id of the acting administrator.
  pub actor:  i64,
}

/// `POST /archive` — body: `{"kind":"company","ids":[1],"reason":"...","actor":7}`
pub async fn archive<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<ArchiveBody>,
) -> Result<Json<BulkOutcome>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let outcome = store
    .archive(body.kind, body.ids, body.reason, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}

// ─── Restore ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RestoreBody {
  pub kind: EntityKind,
  pub ids:  Vec<i64>,
}

/// `POST /restore` — body: `{"kind":"application","ids":[4,5]}`
pub async fn restore<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<RestoreBody>,
) -> Result<Json<BulkOutcome>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let outcome = store
    .restore(body.kind, body.ids)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}

// ─── Purge ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PurgeBody {
  pub kind: EntityKind,
  pub ids:  Vec<i64>,
}

/// `POST /purge` — permanently deletes archived entities and their archived
/// descendants. Ghost rows survive.
pub async fn purge<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<PurgeBody>,
) -> Result<Json<BulkOutcome>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let outcome = store
    .purge(body.kind, body.ids)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}

// ─── Archived listing ─────────────────────────────────────────────────────────

/// `GET /archived` — everything archived, descendants nested under archived
/// parents, orphans at the top level.
pub async fn archived<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<ArchivedTree>, ApiError>
where
  S: ProgramStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let tree = store.list_archived().await.map_err(ApiError::from_store)?;
  Ok(Json(tree))
}
