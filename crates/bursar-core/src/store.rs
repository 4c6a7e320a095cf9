//! The `ProgramStore` trait — the persistence boundary of the registry.
//!
//! The trait is implemented by storage backends (e.g.
//! `bursar-store-sqlite`). Higher layers (`bursar-api`, the server binary)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  application::{Application, ApplicationStatus, NewApplication},
  archive::{ArchivedTree, BulkOutcome, EntityKind, GhostId},
  company::{Company, NewCompany, User},
  facility::{Facility, NewFacility},
};

/// Abstraction over a Bursar program store backend.
///
/// Identifier allocation, archival cascades and purge ordering are the
/// backend's responsibility so it can make each one atomic at whatever
/// granularity its database offers. Two disciplines are non-negotiable for
/// every implementation:
///
/// - allocating an identifier and inserting the application row happen
///   together, so no two live applications can ever share an identifier;
/// - archiving an application and writing its ghost row happen together —
///   archival is the single point where ghost rows are created.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ProgramStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Companies ─────────────────────────────────────────────────────────

  /// Create a company. A missing short name is derived from the display
  /// name and disambiguated with a numeric suffix; an explicit one must be
  /// valid and free. Archived companies still hold their short names —
  /// only purged ones free them.
  fn create_company(
    &self,
    input: NewCompany,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  /// Retrieve a company by id. Returns `None` if not found.
  fn get_company(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  /// List companies, optionally including archived ones.
  fn list_companies(
    &self,
    include_archived: bool,
  ) -> impl Future<Output = Result<Vec<Company>, Self::Error>> + Send + '_;

  /// Change a company's short name and rewrite the prefix of every owned
  /// application identifier, live and ghosted, in one transaction. The one
  /// sanctioned mutation of issued identifiers.
  fn rename_short_name(
    &self,
    company_id: i64,
    new_short: String,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  // ── Facilities ────────────────────────────────────────────────────────

  /// Create a facility under a company, assigning its immutable 3-digit
  /// code from the company's monotonic counter.
  fn create_facility(
    &self,
    input: NewFacility,
  ) -> impl Future<Output = Result<Facility, Self::Error>> + Send + '_;

  fn get_facility(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Facility>, Self::Error>> + Send + '_;

  fn list_facilities(
    &self,
    company_id: i64,
    include_archived: bool,
  ) -> impl Future<Output = Result<Vec<Facility>, Self::Error>> + Send + '_;

  // ── Applications ──────────────────────────────────────────────────────

  /// Allocate the next free identifier in the (facility, activity) bucket
  /// and insert the application row, atomically.
  fn create_application(
    &self,
    input: NewApplication,
  ) -> impl Future<Output = Result<Application, Self::Error>> + Send + '_;

  fn get_application(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Application>, Self::Error>> + Send + '_;

  fn list_applications(
    &self,
    facility_id: i64,
    include_archived: bool,
  ) -> impl Future<Output = Result<Vec<Application>, Self::Error>> + Send + '_;

  fn update_status(
    &self,
    id: i64,
    status: ApplicationStatus,
  ) -> impl Future<Output = Result<Application, Self::Error>> + Send + '_;

  // ── Dependent rows ────────────────────────────────────────────────────

  /// Attach a document to an application; returns the document id.
  fn attach_document(
    &self,
    application_id: i64,
    file_name: String,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Record a submission event against an application.
  fn record_submission(
    &self,
    application_id: i64,
    note: String,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Assign a contractor to assist with an application.
  fn assign_contractor(
    &self,
    application_id: i64,
    contractor: String,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Count dependent rows (documents, submissions, assignments) still
  /// referencing an application.
  fn count_dependents(
    &self,
    application_id: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Soft-delete the given entities, cascading to their descendants.
  /// Archiving an application writes its ghost row in the same step.
  /// Archiving a company also clears its users' company association.
  /// Best-effort per id; missing or already-archived ids are skipped.
  fn archive(
    &self,
    kind: EntityKind,
    ids: Vec<i64>,
    reason: String,
    actor: i64,
  ) -> impl Future<Output = Result<BulkOutcome, Self::Error>> + Send + '_;

  /// Clear the archive flag and metadata on exactly the given ids.
  /// Deliberately does not cascade and never touches the ghost registry.
  fn restore(
    &self,
    kind: EntityKind,
    ids: Vec<i64>,
  ) -> impl Future<Output = Result<BulkOutcome, Self::Error>> + Send + '_;

  /// Permanently delete already-archived entities and their archived
  /// descendants, dependents first, child before parent. Rejects
  /// non-archived targets per id. Ghost rows are neither created nor
  /// removed here.
  fn purge(
    &self,
    kind: EntityKind,
    ids: Vec<i64>,
  ) -> impl Future<Output = Result<BulkOutcome, Self::Error>> + Send + '_;

  /// Everything currently archived, nested for admin display.
  fn list_archived(
    &self,
  ) -> impl Future<Output = Result<ArchivedTree, Self::Error>> + Send + '_;

  // ── Ghost registry ────────────────────────────────────────────────────

  fn list_ghost_ids(
    &self,
    company_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<GhostId>, Self::Error>> + Send + '_;

  /// Delete the given registry rows, making those exact identifier strings
  /// allocatable again. Returns the number of rows removed.
  fn clear_ghost_ids(
    &self,
    identifiers: Vec<String>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Clear the whole registry. Returns the number of rows removed.
  fn clear_all_ghost_ids(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_user(
    &self,
    name: String,
    company_id: Option<i64>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;
}
