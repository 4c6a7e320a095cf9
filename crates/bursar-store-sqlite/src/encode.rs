//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Enums (activity, status)
//! are stored as their snake_case tokens. Archive metadata is spread over
//! three nullable columns next to the `is_archived` flag.

use bursar_core::{
  application::{Activity, Application, ApplicationStatus},
  archive::{ArchiveMeta, GhostId},
  company::Company,
  facility::Facility,
};
use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Activity ────────────────────────────────────────────────────────────────

pub fn encode_activity(a: Activity) -> &'static str {
  match a {
    Activity::EnergyEfficiency => "energy_efficiency",
    Activity::RenewableGeneration => "renewable_generation",
    Activity::ProcessModernization => "process_modernization",
    Activity::WorkforceTraining => "workforce_training",
    Activity::ResearchDevelopment => "research_development",
  }
}

pub fn decode_activity(s: &str) -> Result<Activity> {
  match s {
    "energy_efficiency" => Ok(Activity::EnergyEfficiency),
    "renewable_generation" => Ok(Activity::RenewableGeneration),
    "process_modernization" => Ok(Activity::ProcessModernization),
    "workforce_training" => Ok(Activity::WorkforceTraining),
    "research_development" => Ok(Activity::ResearchDevelopment),
    other => Err(Error::BadColumn { field: "activity", value: other.to_owned() }),
  }
}

// ─── ApplicationStatus ───────────────────────────────────────────────────────

pub fn encode_status(s: ApplicationStatus) -> &'static str {
  match s {
    ApplicationStatus::Draft => "draft",
    ApplicationStatus::Submitted => "submitted",
    ApplicationStatus::UnderReview => "under_review",
    ApplicationStatus::Approved => "approved",
    ApplicationStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<ApplicationStatus> {
  match s {
    "draft" => Ok(ApplicationStatus::Draft),
    "submitted" => Ok(ApplicationStatus::Submitted),
    "under_review" => Ok(ApplicationStatus::UnderReview),
    "approved" => Ok(ApplicationStatus::Approved),
    "rejected" => Ok(ApplicationStatus::Rejected),
    other => Err(Error::BadColumn { field: "status", value: other.to_owned() }),
  }
}

// ─── Archive metadata ────────────────────────────────────────────────────────

/// Fold the flag column and its three metadata columns into `Option`.
pub fn decode_archive(
  is_archived: bool,
  archived_at: Option<String>,
  archived_by: Option<i64>,
  reason: Option<String>,
) -> Result<Option<ArchiveMeta>> {
  if !is_archived {
    return Ok(None);
  }
  let at = archived_at
    .ok_or_else(|| Error::DateParse("archived row without archived_at".into()))?;
  Ok(Some(ArchiveMeta {
    archived_at: decode_dt(&at)?,
    archived_by: archived_by.unwrap_or(0),
    reason:      reason.unwrap_or_default(),
  }))
}

// ─── Raw row mirrors ─────────────────────────────────────────────────────────

/// `companies` row as read from SQLite, before decoding.
pub struct RawCompany {
  pub id:             i64,
  pub name:           String,
  pub short_name:     String,
  pub is_archived:    bool,
  pub archived_at:    Option<String>,
  pub archived_by:    Option<i64>,
  pub archive_reason: Option<String>,
  pub created_at:     String,
}

impl RawCompany {
  pub fn into_company(self) -> Result<Company> {
    Ok(Company {
      id:         self.id,
      name:       self.name,
      short_name: self.short_name,
      archive:    decode_archive(
        self.is_archived,
        self.archived_at,
        self.archived_by,
        self.archive_reason,
      )?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// `facilities` row as read from SQLite, before decoding.
pub struct RawFacility {
  pub id:             i64,
  pub company_id:     i64,
  pub name:           String,
  pub code:           String,
  pub is_archived:    bool,
  pub archived_at:    Option<String>,
  pub archived_by:    Option<i64>,
  pub archive_reason: Option<String>,
  pub created_at:     String,
}

impl RawFacility {
  pub fn into_facility(self) -> Result<Facility> {
    Ok(Facility {
      id:         self.id,
      company_id: self.company_id,
      name:       self.name,
      code:       self.code,
      archive:    decode_archive(
        self.is_archived,
        self.archived_at,
        self.archived_by,
        self.archive_reason,
      )?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// `applications` row as read from SQLite, before decoding.
pub struct RawApplication {
  pub id:             i64,
  pub application_id: String,
  pub company_id:     i64,
  pub facility_id:    i64,
  pub activity:       String,
  pub title:          String,
  pub status:         String,
  pub is_archived:    bool,
  pub archived_at:    Option<String>,
  pub archived_by:    Option<i64>,
  pub archive_reason: Option<String>,
  pub created_at:     String,
}

impl RawApplication {
  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      id:             self.id,
      application_id: self.application_id,
      company_id:     self.company_id,
      facility_id:    self.facility_id,
      activity:       decode_activity(&self.activity)?,
      title:          self.title,
      status:         decode_status(&self.status)?,
      archive:        decode_archive(
        self.is_archived,
        self.archived_at,
        self.archived_by,
        self.archive_reason,
      )?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// `ghost_application_ids` row as read from SQLite, before decoding.
pub struct RawGhostId {
  pub id:             i64,
  pub application_id: String,
  pub company_id:     i64,
  pub facility_id:    i64,
  pub activity:       String,
  pub original_title: String,
  pub deleted_at:     String,
}

impl RawGhostId {
  pub fn into_ghost(self) -> Result<GhostId> {
    Ok(GhostId {
      id:             self.id,
      application_id: self.application_id,
      company_id:     self.company_id,
      facility_id:    self.facility_id,
      activity:       decode_activity(&self.activity)?,
      original_title: self.original_title,
      deleted_at:     decode_dt(&self.deleted_at)?,
    })
  }
}
