//! Archival types — soft-delete metadata, ghost identifiers, bulk outcomes.
//!
//! Archival is a soft delete: the row stays, flagged with [`ArchiveMeta`].
//! Archiving an application also writes a [`GhostId`] row keyed by its
//! identifier; that row is the permanent proof that the identifier was issued
//! and must not be reissued, and it survives both restore and permanent
//! purge. Only an explicit admin clearing removes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  application::{Activity, Application},
  company::Company,
  facility::Facility,
};

// ─── Entity kinds ────────────────────────────────────────────────────────────

/// The three archivable entity types, parent before child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Company,
  Facility,
  Application,
}

impl std::fmt::Display for EntityKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      EntityKind::Company => "company",
      EntityKind::Facility => "facility",
      EntityKind::Application => "application",
    })
  }
}

// ─── Archive metadata ────────────────────────────────────────────────────────

/// Who archived a row, when, and why. Present iff the row is archived;
/// cleared in full by a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMeta {
  pub archived_at: DateTime<Utc>,
  /// User id of the acting administrator.
  pub archived_by: i64,
  pub reason:      String,
}

// ─── Ghost identifiers ───────────────────────────────────────────────────────

/// A permanently retained record of an archived or purged application's
/// identifier. Carries enough context for admin display after the original
/// row is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostId {
  pub id:             i64,
  pub application_id: String,
  pub company_id:     i64,
  pub facility_id:    i64,
  pub activity:       Activity,
  pub original_title: String,
  pub deleted_at:     DateTime<Utc>,
}

// ─── Bulk outcomes ───────────────────────────────────────────────────────────

/// Per-id failure inside a bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
  pub id:      i64,
  pub message: String,
}

/// Result of a best-effort bulk operation (archive, restore, purge).
///
/// Ids are processed independently: a failure on one id never rolls back or
/// aborts the others. Missing and already-processed ids count as skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkOutcome {
  pub succeeded: u64,
  pub skipped:   u64,
  pub failed:    Vec<BulkFailure>,
}

impl BulkOutcome {
  pub fn succeed(&mut self) { self.succeeded += 1; }

  pub fn skip(&mut self) { self.skipped += 1; }

  pub fn fail(&mut self, id: i64, message: impl Into<String>) {
    self.failed.push(BulkFailure { id, message: message.into() });
  }
}

// ─── Archived listings ───────────────────────────────────────────────────────

/// An archived facility with its archived applications nested for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedFacility {
  pub facility:     Facility,
  pub applications: Vec<Application>,
}

/// An archived company with its archived descendants nested for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedCompany {
  pub company:    Company,
  pub facilities: Vec<ArchivedFacility>,
}

/// Everything currently archived, grouped for the admin UI.
///
/// Archived facilities whose company is live, and archived applications
/// whose facility is live, appear in the top-level orphan lists instead of
/// nested under a parent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchivedTree {
  pub companies:    Vec<ArchivedCompany>,
  pub facilities:   Vec<ArchivedFacility>,
  pub applications: Vec<Application>,
}
