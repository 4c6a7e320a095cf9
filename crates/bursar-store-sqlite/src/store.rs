//! [`SqliteStore`] — the SQLite implementation of [`ProgramStore`].

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use bursar_core::{
  allocate,
  application::{Application, ApplicationStatus, NewApplication},
  archive::{
    ArchivedCompany, ArchivedFacility, ArchivedTree, BulkOutcome, EntityKind,
    GhostId,
  },
  company::{self, Company, NewCompany, User},
  facility::{self, Facility, NewFacility},
  store::ProgramStore,
};

use crate::{
  Error, Result,
  encode::{
    RawApplication, RawCompany, RawFacility, RawGhostId, encode_activity,
    encode_dt, encode_status,
  },
  schema::SCHEMA,
};

type CoreResult<T> = std::result::Result<T, bursar_core::Error>;

/// Disambiguation attempts before giving up on a derived short name.
const SHORT_NAME_ATTEMPTS: u32 = 1000;

// ─── Row mappers ─────────────────────────────────────────────────────────────

const COMPANY_COLS: &str = "id, name, short_name, is_archived, archived_at, \
                            archived_by, archive_reason, created_at";

fn company_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawCompany> {
  Ok(RawCompany {
    id:             row.get(0)?,
    name:           row.get(1)?,
    short_name:     row.get(2)?,
    is_archived:    row.get(3)?,
    archived_at:    row.get(4)?,
    archived_by:    row.get(5)?,
    archive_reason: row.get(6)?,
    created_at:     row.get(7)?,
  })
}

const FACILITY_COLS: &str = "id, company_id, name, code, is_archived, \
                             archived_at, archived_by, archive_reason, \
                             created_at";

fn facility_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawFacility> {
  Ok(RawFacility {
    id:             row.get(0)?,
    company_id:     row.get(1)?,
    name:           row.get(2)?,
    code:           row.get(3)?,
    is_archived:    row.get(4)?,
    archived_at:    row.get(5)?,
    archived_by:    row.get(6)?,
    archive_reason: row.get(7)?,
    created_at:     row.get(8)?,
  })
}

const APPLICATION_COLS: &str = "id, application_id, company_id, facility_id, \
                                activity, title, status, is_archived, \
                                archived_at, archived_by, archive_reason, \
                                created_at";

fn application_from_row(
  row: &rusqlite::Row,
) -> rusqlite::Result<RawApplication> {
  Ok(RawApplication {
    id:             row.get(0)?,
    application_id: row.get(1)?,
    company_id:     row.get(2)?,
    facility_id:    row.get(3)?,
    activity:       row.get(4)?,
    title:          row.get(5)?,
    status:         row.get(6)?,
    is_archived:    row.get(7)?,
    archived_at:    row.get(8)?,
    archived_by:    row.get(9)?,
    archive_reason: row.get(10)?,
    created_at:     row.get(11)?,
  })
}

const GHOST_COLS: &str = "id, application_id, company_id, facility_id, \
                          activity, original_title, deleted_at";

fn ghost_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawGhostId> {
  Ok(RawGhostId {
    id:             row.get(0)?,
    application_id: row.get(1)?,
    company_id:     row.get(2)?,
    facility_id:    row.get(3)?,
    activity:       row.get(4)?,
    original_title: row.get(5)?,
    deleted_at:     row.get(6)?,
  })
}

// ─── Archival steps ──────────────────────────────────────────────────────────

/// Flag one application archived and upsert its ghost row — the single point
/// where ghost rows are created. Returns `false` (skip) if the row is missing
/// or already archived. Must run inside a transaction so the flag and the
/// ghost row land together.
fn archive_application_step(
  conn: &rusqlite::Connection,
  id: i64,
  at: &str,
  actor: i64,
  reason: &str,
) -> rusqlite::Result<bool> {
  let row: Option<(String, i64, i64, String, String, bool)> = conn
    .query_row(
      "SELECT application_id, company_id, facility_id, activity, title, \
       is_archived FROM applications WHERE id = ?1",
      [id],
      |r| {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
      },
    )
    .optional()?;

  let Some((application_id, company_id, facility_id, activity, title, archived)) =
    row
  else {
    return Ok(false);
  };
  if archived {
    return Ok(false);
  }

  conn.execute(
    "UPDATE applications SET is_archived = 1, archived_at = ?2, \
     archived_by = ?3, archive_reason = ?4 WHERE id = ?1",
    rusqlite::params![id, at, actor, reason],
  )?;

  conn.execute(
    "INSERT INTO ghost_application_ids \
       (application_id, company_id, facility_id, activity, original_title, deleted_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
     ON CONFLICT(application_id) DO UPDATE SET deleted_at = excluded.deleted_at",
    rusqlite::params![application_id, company_id, facility_id, activity, title, at],
  )?;

  Ok(true)
}

/// Set the archive flag on a facility or company row that is still live.
fn flag_archived(
  conn: &rusqlite::Connection,
  table: &str,
  id: i64,
  at: &str,
  actor: i64,
  reason: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "UPDATE {table} SET is_archived = 1, archived_at = ?2, \
       archived_by = ?3, archive_reason = ?4 WHERE id = ?1 AND is_archived = 0"
    ),
    rusqlite::params![id, at, actor, reason],
  )?;
  Ok(())
}

/// Is the row live, archived, or absent?
fn row_archive_state(
  conn: &rusqlite::Connection,
  table: &str,
  id: i64,
) -> rusqlite::Result<Option<bool>> {
  conn
    .query_row(
      &format!("SELECT is_archived FROM {table} WHERE id = ?1"),
      [id],
      |r| r.get(0),
    )
    .optional()
}

fn ids_where(
  conn: &rusqlite::Connection,
  sql: &str,
  param: i64,
) -> rusqlite::Result<Vec<i64>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map([param], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()?;
  Ok(rows)
}

/// Delete one application's dependent rows, then the row itself.
/// Child-before-parent so the foreign keys are satisfied.
fn purge_application_rows(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM documents   WHERE application_id = ?1", [id])?;
  conn.execute("DELETE FROM submissions WHERE application_id = ?1", [id])?;
  conn.execute("DELETE FROM assignments WHERE application_id = ?1", [id])?;
  conn.execute("DELETE FROM applications WHERE id = ?1", [id])?;
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Bursar program store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The single
/// connection serializes all writes, so the allocate-and-insert transaction
/// in [`create_application`](ProgramStore::create_application) cannot
/// interleave with a competing allocation.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ProgramStore impl ───────────────────────────────────────────────────────

impl ProgramStore for SqliteStore {
  type Error = Error;

  // ── Companies ─────────────────────────────────────────────────────────────

  async fn create_company(&self, input: NewCompany) -> Result<Company> {
    let now = Utc::now();
    let now_str = encode_dt(now);

    let out: CoreResult<(i64, String, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let short = {
          let mut taken =
            tx.prepare("SELECT 1 FROM companies WHERE short_name = ?1")?;
          match &input.short_name {
            Some(s) => {
              if let Err(e) = company::validate_short_name(s) {
                return Ok(Err(e));
              }
              if taken.exists([s.as_str()])? {
                return Ok(Err(bursar_core::Error::ShortNameTaken(s.clone())));
              }
              s.clone()
            }
            None => {
              let base = company::derive_short_name(&input.name);
              let mut chosen = None;
              for n in 0..SHORT_NAME_ATTEMPTS {
                let cand = company::short_name_candidate(&base, n);
                if !taken.exists([cand.as_str()])? {
                  chosen = Some(cand);
                  break;
                }
              }
              match chosen {
                Some(c) => c,
                None => {
                  return Ok(Err(bursar_core::Error::ConstraintViolation(
                    format!("no free short name for base {base:?}"),
                  )));
                }
              }
            }
          }
        };

        tx.execute(
          "INSERT INTO companies (name, short_name, created_at) \
           VALUES (?1, ?2, ?3)",
          rusqlite::params![input.name, short, now_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok((id, input.name, short)))
      })
      .await?;

    let (id, name, short_name) = out?;
    Ok(Company { id, name, short_name, archive: None, created_at: now })
  }

  async fn get_company(&self, id: i64) -> Result<Option<Company>> {
    let raw: Option<RawCompany> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COMPANY_COLS} FROM companies WHERE id = ?1"),
              [id],
              company_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCompany::into_company).transpose()
  }

  async fn list_companies(&self, include_archived: bool) -> Result<Vec<Company>> {
    let raws: Vec<RawCompany> = self
      .conn
      .call(move |conn| {
        let sql = if include_archived {
          format!("SELECT {COMPANY_COLS} FROM companies ORDER BY id")
        } else {
          format!(
            "SELECT {COMPANY_COLS} FROM companies WHERE is_archived = 0 \
             ORDER BY id"
          )
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], company_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCompany::into_company).collect()
  }

  async fn rename_short_name(
    &self,
    company_id: i64,
    new_short: String,
  ) -> Result<Company> {
    let out: CoreResult<RawCompany> = self
      .conn
      .call(move |conn| {
        if let Err(e) = company::validate_short_name(&new_short) {
          return Ok(Err(e));
        }

        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row("SELECT 1 FROM companies WHERE id = ?1", [company_id], |_| {
            Ok(true)
          })
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(Err(bursar_core::Error::EntityNotFound {
            kind: EntityKind::Company,
            id:   company_id,
          }));
        }

        let collides: bool = tx
          .query_row(
            "SELECT 1 FROM companies WHERE short_name = ?1 AND id != ?2",
            rusqlite::params![new_short, company_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if collides {
          return Ok(Err(bursar_core::Error::ShortNameTaken(new_short.clone())));
        }

        tx.execute(
          "UPDATE companies SET short_name = ?1 WHERE id = ?2",
          rusqlite::params![new_short, company_id],
        )?;

        // Rewrite the prefix of every owned identifier, live and ghosted.
        for table in ["applications", "ghost_application_ids"] {
          let rows: Vec<(i64, String)> = {
            let mut stmt = tx.prepare(&format!(
              "SELECT id, application_id FROM {table} WHERE company_id = ?1"
            ))?;
            stmt
              .query_map([company_id], |r| Ok((r.get(0)?, r.get(1)?)))?
              .collect::<rusqlite::Result<Vec<_>>>()?
          };
          let mut update = tx.prepare(&format!(
            "UPDATE {table} SET application_id = ?1 WHERE id = ?2"
          ))?;
          for (row_id, old_id) in rows {
            let new_id = allocate::with_short_name(&old_id, &new_short);
            update.execute(rusqlite::params![new_id, row_id])?;
          }
        }

        let raw = tx.query_row(
          &format!("SELECT {COMPANY_COLS} FROM companies WHERE id = ?1"),
          [company_id],
          company_from_row,
        )?;
        tx.commit()?;

        tracing::info!(company_id, short_name = %new_short, "short name renamed");
        Ok(Ok(raw))
      })
      .await?;

    out?.into_company()
  }

  // ── Facilities ────────────────────────────────────────────────────────────

  async fn create_facility(&self, input: NewFacility) -> Result<Facility> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    let company_id = input.company_id;
    let name = input.name.clone();

    let out: CoreResult<(i64, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let seq: Option<i64> = tx
          .query_row(
            "SELECT facility_seq FROM companies WHERE id = ?1",
            [input.company_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(seq) = seq else {
          return Ok(Err(bursar_core::Error::EntityNotFound {
            kind: EntityKind::Company,
            id:   input.company_id,
          }));
        };

        let next = (seq + 1) as u32;
        let code = match facility::format_code(next) {
          Ok(c) => c,
          Err(e) => return Ok(Err(e)),
        };

        tx.execute(
          "UPDATE companies SET facility_seq = ?1 WHERE id = ?2",
          rusqlite::params![next, input.company_id],
        )?;
        tx.execute(
          "INSERT INTO facilities (company_id, name, code, created_at) \
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![input.company_id, input.name, code, now_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok((id, code)))
      })
      .await?;

    let (id, code) = out?;
    Ok(Facility { id, company_id, name, code, archive: None, created_at: now })
  }

  async fn get_facility(&self, id: i64) -> Result<Option<Facility>> {
    let raw: Option<RawFacility> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FACILITY_COLS} FROM facilities WHERE id = ?1"),
              [id],
              facility_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFacility::into_facility).transpose()
  }

  async fn list_facilities(
    &self,
    company_id: i64,
    include_archived: bool,
  ) -> Result<Vec<Facility>> {
    let raws: Vec<RawFacility> = self
      .conn
      .call(move |conn| {
        let sql = if include_archived {
          format!(
            "SELECT {FACILITY_COLS} FROM facilities WHERE company_id = ?1 \
             ORDER BY id"
          )
        } else {
          format!(
            "SELECT {FACILITY_COLS} FROM facilities WHERE company_id = ?1 \
             AND is_archived = 0 ORDER BY id"
          )
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([company_id], facility_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFacility::into_facility).collect()
  }

  // ── Applications ──────────────────────────────────────────────────────────

  async fn create_application(
    &self,
    input: NewApplication,
  ) -> Result<Application> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    let company_id = input.company_id;
    let facility_id = input.facility_id;
    let activity = input.activity;
    let title = input.title.clone();

    let out: CoreResult<(i64, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let short: Option<String> = tx
          .query_row(
            "SELECT short_name FROM companies WHERE id = ?1",
            [input.company_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(short) = short else {
          return Ok(Err(bursar_core::Error::EntityNotFound {
            kind: EntityKind::Company,
            id:   input.company_id,
          }));
        };

        let fac: Option<(i64, String)> = tx
          .query_row(
            "SELECT company_id, code FROM facilities WHERE id = ?1",
            [input.facility_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let Some((owner, code)) = fac else {
          return Ok(Err(bursar_core::Error::EntityNotFound {
            kind: EntityKind::Facility,
            id:   input.facility_id,
          }));
        };
        if owner != input.company_id {
          return Ok(Err(bursar_core::Error::ConstraintViolation(format!(
            "facility {} does not belong to company {}",
            input.facility_id, input.company_id
          ))));
        }

        // Forbidden set: live non-archived identifiers ∪ ghost registry.
        // Probed inside the insert transaction, so no concurrent allocation
        // can observe the same free slot.
        let allocated = {
          let mut live = tx.prepare(
            "SELECT 1 FROM applications \
             WHERE application_id = ?1 AND is_archived = 0",
          )?;
          let mut ghost = tx.prepare(
            "SELECT 1 FROM ghost_application_ids WHERE application_id = ?1",
          )?;
          allocate::next_identifier(&short, &code, input.activity, |id| {
            Ok::<bool, rusqlite::Error>(live.exists([id])? || ghost.exists([id])?)
          })?
        };
        let application_id = match allocated {
          Ok(id) => id,
          Err(e) => return Ok(Err(e)),
        };

        tx.execute(
          "INSERT INTO applications \
             (application_id, company_id, facility_id, activity, title, status, created_at) \
           VALUES (?1, ?2, ?3, ?4, ?5, 'draft', ?6)",
          rusqlite::params![
            application_id,
            input.company_id,
            input.facility_id,
            encode_activity(input.activity),
            input.title,
            now_str,
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok((id, application_id)))
      })
      .await?;

    let (id, application_id) = out?;
    Ok(Application {
      id,
      application_id,
      company_id,
      facility_id,
      activity,
      title,
      status: ApplicationStatus::Draft,
      archive: None,
      created_at: now,
    })
  }

  async fn get_application(&self, id: i64) -> Result<Option<Application>> {
    let raw: Option<RawApplication> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {APPLICATION_COLS} FROM applications WHERE id = ?1"
              ),
              [id],
              application_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawApplication::into_application).transpose()
  }

  async fn list_applications(
    &self,
    facility_id: i64,
    include_archived: bool,
  ) -> Result<Vec<Application>> {
    let raws: Vec<RawApplication> = self
      .conn
      .call(move |conn| {
        let sql = if include_archived {
          format!(
            "SELECT {APPLICATION_COLS} FROM applications \
             WHERE facility_id = ?1 ORDER BY id"
          )
        } else {
          format!(
            "SELECT {APPLICATION_COLS} FROM applications \
             WHERE facility_id = ?1 AND is_archived = 0 ORDER BY id"
          )
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([facility_id], application_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawApplication::into_application)
      .collect()
  }

  async fn update_status(
    &self,
    id: i64,
    status: ApplicationStatus,
  ) -> Result<Application> {
    let status_str = encode_status(status);

    let out: CoreResult<RawApplication> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE applications SET status = ?1 WHERE id = ?2",
          rusqlite::params![status_str, id],
        )?;
        if changed == 0 {
          return Ok(Err(bursar_core::Error::EntityNotFound {
            kind: EntityKind::Application,
            id,
          }));
        }
        let raw = conn.query_row(
          &format!("SELECT {APPLICATION_COLS} FROM applications WHERE id = ?1"),
          [id],
          application_from_row,
        )?;
        Ok(Ok(raw))
      })
      .await?;

    out?.into_application()
  }

  // ── Dependent rows ────────────────────────────────────────────────────────

  async fn attach_document(
    &self,
    application_id: i64,
    file_name: String,
  ) -> Result<i64> {
    self.insert_dependent("documents", "file_name", application_id, file_name)
      .await
  }

  async fn record_submission(
    &self,
    application_id: i64,
    note: String,
  ) -> Result<i64> {
    self.insert_dependent("submissions", "note", application_id, note).await
  }

  async fn assign_contractor(
    &self,
    application_id: i64,
    contractor: String,
  ) -> Result<i64> {
    self
      .insert_dependent("assignments", "contractor", application_id, contractor)
      .await
  }

  async fn count_dependents(&self, application_id: i64) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT \
             (SELECT COUNT(*) FROM documents   WHERE application_id = ?1) + \
             (SELECT COUNT(*) FROM submissions WHERE application_id = ?1) + \
             (SELECT COUNT(*) FROM assignments WHERE application_id = ?1)",
          [application_id],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n as u64)
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn archive(
    &self,
    kind: EntityKind,
    ids: Vec<i64>,
    reason: String,
    actor: i64,
  ) -> Result<BulkOutcome> {
    let at = encode_dt(Utc::now());

    let outcome: BulkOutcome = self
      .conn
      .call(move |conn| {
        let mut outcome = BulkOutcome::default();
        for id in ids {
          let step = archive_one(conn, kind, id, &at, actor, &reason);
          match step {
            Ok(true) => outcome.succeed(),
            Ok(false) => outcome.skip(),
            Err(e) => {
              tracing::warn!(%kind, id, error = %e, "archive failed");
              outcome.fail(id, e.to_string());
            }
          }
        }
        Ok(outcome)
      })
      .await?;

    tracing::info!(
      %kind,
      succeeded = outcome.succeeded,
      skipped = outcome.skipped,
      failed = outcome.failed.len(),
      "archive finished"
    );
    Ok(outcome)
  }

  async fn restore(&self, kind: EntityKind, ids: Vec<i64>) -> Result<BulkOutcome> {
    let table = table_for(kind);

    let outcome: BulkOutcome = self
      .conn
      .call(move |conn| {
        let mut outcome = BulkOutcome::default();
        for id in ids {
          // Restore is flat: exactly this row, no cascade, registry untouched.
          let step = conn.execute(
            &format!(
              "UPDATE {table} SET is_archived = 0, archived_at = NULL, \
               archived_by = NULL, archive_reason = NULL \
               WHERE id = ?1 AND is_archived = 1"
            ),
            [id],
          );
          match step {
            Ok(1) => outcome.succeed(),
            Ok(_) => outcome.skip(),
            Err(e) => {
              tracing::warn!(%kind, id, error = %e, "restore failed");
              outcome.fail(id, e.to_string());
            }
          }
        }
        Ok(outcome)
      })
      .await?;

    tracing::info!(
      %kind,
      succeeded = outcome.succeeded,
      skipped = outcome.skipped,
      "restore finished"
    );
    Ok(outcome)
  }

  async fn purge(&self, kind: EntityKind, ids: Vec<i64>) -> Result<BulkOutcome> {
    let outcome: BulkOutcome = self
      .conn
      .call(move |conn| {
        let mut outcome = BulkOutcome::default();
        for id in ids {
          match row_archive_state(conn, table_for(kind), id) {
            Ok(None) => outcome.skip(),
            Ok(Some(false)) => {
              // Enforced precondition: purge never touches live rows.
              outcome.fail(
                id,
                bursar_core::Error::ConstraintViolation(format!(
                  "cannot permanently delete non-archived {kind} {id}"
                ))
                .to_string(),
              );
            }
            Ok(Some(true)) => match live_descendants(conn, kind, id) {
              Ok(0) => {
                let step = (|| -> rusqlite::Result<()> {
                  let tx = conn.transaction()?;
                  purge_one(&tx, kind, id)?;
                  tx.commit()?;
                  Ok(())
                })();
                match step {
                  Ok(()) => outcome.succeed(),
                  Err(e) => {
                    tracing::warn!(%kind, id, error = %e, "purge failed");
                    outcome.fail(id, e.to_string());
                  }
                }
              }
              Ok(n) => {
                // A restored child still references the target; deleting it
                // would orphan live rows.
                outcome.fail(
                  id,
                  bursar_core::Error::ConstraintViolation(format!(
                    "cannot permanently delete {kind} {id}: \
                     {n} live descendant(s)"
                  ))
                  .to_string(),
                );
              }
              Err(e) => outcome.fail(id, e.to_string()),
            },
            Err(e) => outcome.fail(id, e.to_string()),
          }
        }
        Ok(outcome)
      })
      .await?;

    tracing::info!(
      %kind,
      succeeded = outcome.succeeded,
      skipped = outcome.skipped,
      failed = outcome.failed.len(),
      "purge finished"
    );
    Ok(outcome)
  }

  async fn list_archived(&self) -> Result<ArchivedTree> {
    let (raw_companies, raw_facilities, raw_applications): (
      Vec<RawCompany>,
      Vec<RawFacility>,
      Vec<RawApplication>,
    ) = self
      .conn
      .call(|conn| {
        let companies = {
          let mut stmt = conn.prepare(&format!(
            "SELECT {COMPANY_COLS} FROM companies WHERE is_archived = 1 \
             ORDER BY id"
          ))?;
          stmt
            .query_map([], company_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let facilities = {
          let mut stmt = conn.prepare(&format!(
            "SELECT {FACILITY_COLS} FROM facilities WHERE is_archived = 1 \
             ORDER BY id"
          ))?;
          stmt
            .query_map([], facility_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let applications = {
          let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLS} FROM applications WHERE is_archived = 1 \
             ORDER BY id"
          ))?;
          stmt
            .query_map([], application_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok((companies, facilities, applications))
      })
      .await?;

    let companies = raw_companies
      .into_iter()
      .map(RawCompany::into_company)
      .collect::<Result<Vec<_>>>()?;
    let facilities = raw_facilities
      .into_iter()
      .map(RawFacility::into_facility)
      .collect::<Result<Vec<_>>>()?;
    let applications = raw_applications
      .into_iter()
      .map(RawApplication::into_application)
      .collect::<Result<Vec<_>>>()?;

    // Group archived applications under archived facilities; the rest are
    // orphans (their facility is live).
    let mut by_facility: HashMap<i64, Vec<Application>> = HashMap::new();
    let facility_ids: std::collections::HashSet<i64> =
      facilities.iter().map(|f| f.id).collect();
    let mut orphan_applications = Vec::new();
    for app in applications {
      if facility_ids.contains(&app.facility_id) {
        by_facility.entry(app.facility_id).or_default().push(app);
      } else {
        orphan_applications.push(app);
      }
    }

    // Group archived facilities under archived companies; the rest are
    // orphans (their company is live).
    let company_ids: std::collections::HashSet<i64> =
      companies.iter().map(|c| c.id).collect();
    let mut by_company: HashMap<i64, Vec<ArchivedFacility>> = HashMap::new();
    let mut orphan_facilities = Vec::new();
    for fac in facilities {
      let node = ArchivedFacility {
        applications: by_facility.remove(&fac.id).unwrap_or_default(),
        facility:     fac,
      };
      if company_ids.contains(&node.facility.company_id) {
        by_company
          .entry(node.facility.company_id)
          .or_default()
          .push(node);
      } else {
        orphan_facilities.push(node);
      }
    }

    let companies = companies
      .into_iter()
      .map(|c| ArchivedCompany {
        facilities: by_company.remove(&c.id).unwrap_or_default(),
        company:    c,
      })
      .collect();

    Ok(ArchivedTree {
      companies,
      facilities: orphan_facilities,
      applications: orphan_applications,
    })
  }

  // ── Ghost registry ────────────────────────────────────────────────────────

  async fn list_ghost_ids(&self, company_id: Option<i64>) -> Result<Vec<GhostId>> {
    let raws: Vec<RawGhostId> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(cid) = company_id {
          let mut stmt = conn.prepare(&format!(
            "SELECT {GHOST_COLS} FROM ghost_application_ids \
             WHERE company_id = ?1 ORDER BY application_id"
          ))?;
          stmt
            .query_map([cid], ghost_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {GHOST_COLS} FROM ghost_application_ids \
             ORDER BY application_id"
          ))?;
          stmt
            .query_map([], ghost_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGhostId::into_ghost).collect()
  }

  async fn clear_ghost_ids(&self, identifiers: Vec<String>) -> Result<u64> {
    let cleared: u64 = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("DELETE FROM ghost_application_ids WHERE application_id = ?1")?;
        let mut cleared = 0u64;
        for identifier in &identifiers {
          cleared += stmt.execute([identifier.as_str()])? as u64;
        }
        Ok(cleared)
      })
      .await?;

    tracing::info!(cleared, "ghost ids cleared");
    Ok(cleared)
  }

  async fn clear_all_ghost_ids(&self) -> Result<u64> {
    let cleared: u64 = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM ghost_application_ids", [])? as u64))
      .await?;

    tracing::info!(cleared, "ghost registry emptied");
    Ok(cleared)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(
    &self,
    name: String,
    company_id: Option<i64>,
  ) -> Result<User> {
    let (id, name) = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (name, company_id) VALUES (?1, ?2)",
          rusqlite::params![name, company_id],
        )?;
        Ok((conn.last_insert_rowid(), name))
      })
      .await?;
    Ok(User { id, name, company_id })
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    let user: Option<User> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, name, company_id FROM users WHERE id = ?1",
              [id],
              |r| {
                Ok(User {
                  id:         r.get(0)?,
                  name:       r.get(1)?,
                  company_id: r.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(user)
  }
}

impl SqliteStore {
  async fn insert_dependent(
    &self,
    table: &'static str,
    column: &'static str,
    application_id: i64,
    value: String,
  ) -> Result<i64> {
    let now_str = encode_dt(Utc::now());

    let out: CoreResult<i64> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM applications WHERE id = ?1",
            [application_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(Err(bursar_core::Error::EntityNotFound {
            kind: EntityKind::Application,
            id:   application_id,
          }));
        }
        conn.execute(
          &format!(
            "INSERT INTO {table} (application_id, {column}, created_at) \
             VALUES (?1, ?2, ?3)"
          ),
          rusqlite::params![application_id, value, now_str],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await?;

    Ok(out?)
  }
}

// ─── Cascade helpers ─────────────────────────────────────────────────────────

fn table_for(kind: EntityKind) -> &'static str {
  match kind {
    EntityKind::Company => "companies",
    EntityKind::Facility => "facilities",
    EntityKind::Application => "applications",
  }
}

/// Archive one entity, cascading to its descendants.
///
/// Each application's flag-plus-ghost pair runs in its own small transaction.
/// The cascade as a whole is deliberately not wrapped in one: a failure
/// partway leaves the already-archived children in place, and the caller
/// reports it per id. Returns `false` when the target is missing or already
/// archived.
fn archive_one(
  conn: &mut rusqlite::Connection,
  kind: EntityKind,
  id: i64,
  at: &str,
  actor: i64,
  reason: &str,
) -> rusqlite::Result<bool> {
  match kind {
    EntityKind::Application => {
      let tx = conn.transaction()?;
      let done = archive_application_step(&tx, id, at, actor, reason)?;
      tx.commit()?;
      Ok(done)
    }

    EntityKind::Facility => {
      match row_archive_state(conn, "facilities", id)? {
        None | Some(true) => return Ok(false),
        Some(false) => {}
      }
      let apps = ids_where(
        conn,
        "SELECT id FROM applications WHERE facility_id = ?1",
        id,
      )?;
      for app_id in apps {
        let tx = conn.transaction()?;
        archive_application_step(&tx, app_id, at, actor, reason)?;
        tx.commit()?;
      }
      flag_archived(conn, "facilities", id, at, actor, reason)?;
      Ok(true)
    }

    EntityKind::Company => {
      match row_archive_state(conn, "companies", id)? {
        None | Some(true) => return Ok(false),
        Some(false) => {}
      }
      let apps = ids_where(
        conn,
        "SELECT id FROM applications WHERE company_id = ?1",
        id,
      )?;
      for app_id in apps {
        let tx = conn.transaction()?;
        archive_application_step(&tx, app_id, at, actor, reason)?;
        tx.commit()?;
      }
      let facilities = ids_where(
        conn,
        "SELECT id FROM facilities WHERE company_id = ?1",
        id,
      )?;
      for fac_id in facilities {
        flag_archived(conn, "facilities", fac_id, at, actor, reason)?;
      }
      // Accounts outlive the company; only the association is dropped.
      conn.execute(
        "UPDATE users SET company_id = NULL WHERE company_id = ?1",
        [id],
      )?;
      flag_archived(conn, "companies", id, at, actor, reason)?;
      Ok(true)
    }
  }
}

/// Count live rows still referencing a purge target. A purge only removes
/// the archived closure, so any live (restored) child blocks it.
fn live_descendants(
  conn: &rusqlite::Connection,
  kind: EntityKind,
  id: i64,
) -> rusqlite::Result<i64> {
  match kind {
    EntityKind::Application => Ok(0),
    EntityKind::Facility => conn.query_row(
      "SELECT COUNT(*) FROM applications \
       WHERE facility_id = ?1 AND is_archived = 0",
      [id],
      |r| r.get(0),
    ),
    EntityKind::Company => conn.query_row(
      "SELECT \
         (SELECT COUNT(*) FROM facilities \
          WHERE company_id = ?1 AND is_archived = 0) + \
         (SELECT COUNT(*) FROM applications \
          WHERE company_id = ?1 AND is_archived = 0)",
      [id],
      |r| r.get(0),
    ),
  }
}

/// Delete one archived entity and its archived descendants, child before
/// parent. Ghost rows are left alone — they were written at archive time and
/// outlive the purge. Runs inside the caller's transaction; a live child
/// still referencing the target trips a foreign-key error and rolls the
/// whole id back.
fn purge_one(
  tx: &rusqlite::Transaction,
  kind: EntityKind,
  id: i64,
) -> rusqlite::Result<()> {
  match kind {
    EntityKind::Application => purge_application_rows(tx, id),

    EntityKind::Facility => {
      let apps = ids_where(
        tx,
        "SELECT id FROM applications WHERE facility_id = ?1 AND is_archived = 1",
        id,
      )?;
      for app_id in apps {
        purge_application_rows(tx, app_id)?;
      }
      tx.execute("DELETE FROM facilities WHERE id = ?1", [id])?;
      Ok(())
    }

    EntityKind::Company => {
      let apps = ids_where(
        tx,
        "SELECT id FROM applications WHERE company_id = ?1 AND is_archived = 1",
        id,
      )?;
      for app_id in apps {
        purge_application_rows(tx, app_id)?;
      }
      let facilities = ids_where(
        tx,
        "SELECT id FROM facilities WHERE company_id = ?1 AND is_archived = 1",
        id,
      )?;
      for fac_id in facilities {
        tx.execute("DELETE FROM facilities WHERE id = ?1", [fac_id])?;
      }
      tx.execute(
        "UPDATE users SET company_id = NULL WHERE company_id = ?1",
        [id],
      )?;
      tx.execute("DELETE FROM companies WHERE id = ?1", [id])?;
      Ok(())
    }
  }
}
