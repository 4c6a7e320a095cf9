//! JSON REST API for Bursar.
//!
//! Exposes an axum [`Router`] backed by any [`bursar_core::store::ProgramStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", bursar_api::api_router(store.clone()))
//! ```

pub mod applications;
pub mod companies;
pub mod error;
pub mod facilities;
pub mod ghosts;
pub mod lifecycle;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use bursar_core::store::ProgramStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Companies
    .route(
      "/companies",
      get(companies::list::<S>).post(companies::create::<S>),
    )
    .route("/companies/{id}", get(companies::get_one::<S>))
    .route(
      "/companies/{id}/rename-short-name",
      post(companies::rename::<S>),
    )
    // Facilities
    .route(
      "/facilities",
      get(facilities::list::<S>).post(facilities::create::<S>),
    )
    .route("/facilities/{id}", get(facilities::get_one::<S>))
    // Applications
    .route(
      "/applications",
      get(applications::list::<S>).post(applications::create::<S>),
    )
    .route("/applications/{id}", get(applications::get_one::<S>))
    .route("/applications/{id}/status", post(applications::set_status::<S>))
    // Lifecycle
    .route("/archive", post(lifecycle::archive::<S>))
    .route("/restore", post(lifecycle::restore::<S>))
    .route("/purge", post(lifecycle::purge::<S>))
    .route("/archived", get(lifecycle::archived::<S>))
    // Ghost registry
    .route("/ghost-ids", get(ghosts::list::<S>))
    .route("/ghost-ids/clear", post(ghosts::clear::<S>))
    .route("/ghost-ids/clear-all", post(ghosts::clear_all::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
