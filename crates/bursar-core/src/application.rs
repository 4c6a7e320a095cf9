//! Application — a company's request for program funds at one facility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::archive::ArchiveMeta;

// ─── Activity types ──────────────────────────────────────────────────────────

/// The closed set of program activities an application can be filed for.
///
/// Each activity maps to a fixed single digit that is baked into the
/// application identifier. The bijection is part of the identifier format and
/// must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
  EnergyEfficiency,
  RenewableGeneration,
  ProcessModernization,
  WorkforceTraining,
  ResearchDevelopment,
}

impl Activity {
  /// The identifier digit for this activity.
  pub fn digit(self) -> char {
    match self {
      Activity::EnergyEfficiency => '1',
      Activity::RenewableGeneration => '2',
      Activity::ProcessModernization => '3',
      Activity::WorkforceTraining => '4',
      Activity::ResearchDevelopment => '5',
    }
  }

  /// Inverse of [`Activity::digit`].
  pub fn from_digit(c: char) -> Option<Self> {
    match c {
      '1' => Some(Activity::EnergyEfficiency),
      '2' => Some(Activity::RenewableGeneration),
      '3' => Some(Activity::ProcessModernization),
      '4' => Some(Activity::WorkforceTraining),
      '5' => Some(Activity::ResearchDevelopment),
      _ => None,
    }
  }

  pub const ALL: [Activity; 5] = [
    Activity::EnergyEfficiency,
    Activity::RenewableGeneration,
    Activity::ProcessModernization,
    Activity::WorkforceTraining,
    Activity::ResearchDevelopment,
  ];
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review status of an application.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
  #[default]
  Draft,
  Submitted,
  UnderReview,
  Approved,
  Rejected,
}

// ─── Application ─────────────────────────────────────────────────────────────

/// An application row.
///
/// `application_id` is assigned exactly once at creation and is unique among
/// every application that has ever existed — archived rows and purged rows
/// (via the ghost registry) included. The only sanctioned mutation is the
/// prefix rewrite performed by a company short-name rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
  pub id:             i64,
  /// Human-readable identifier, e.g. `ACME-001-102`.
  pub application_id: String,
  pub company_id:     i64,
  pub facility_id:    i64,
  pub activity:       Activity,
  pub title:          String,
  pub status:         ApplicationStatus,
  pub archive:        Option<ArchiveMeta>,
  pub created_at:     DateTime<Utc>,
}

impl Application {
  pub fn is_archived(&self) -> bool { self.archive.is_some() }
}

/// Input for creating an application. The identifier is allocated by the
/// store, never supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
  pub company_id:  i64,
  pub facility_id: i64,
  pub activity:    Activity,
  pub title:       String,
}
