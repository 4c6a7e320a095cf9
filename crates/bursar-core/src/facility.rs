//! Facility — a company-owned site that applications are filed against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, archive::ArchiveMeta};

/// Highest facility code a company can hold (three decimal digits).
pub const MAX_FACILITY_CODE: u32 = 999;

/// A facility owned by exactly one company.
///
/// The code is assigned once at creation from a per-company monotonic counter
/// and never changes afterwards — it is not recomputed from the facility's
/// position in any list, so archiving or purging sibling facilities cannot
/// shift it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
  pub id:         i64,
  pub company_id: i64,
  pub name:       String,
  /// Immutable 3-digit zero-padded code, e.g. `"001"`.
  pub code:       String,
  pub archive:    Option<ArchiveMeta>,
  pub created_at: DateTime<Utc>,
}

impl Facility {
  pub fn is_archived(&self) -> bool { self.archive.is_some() }
}

/// Input for creating a facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFacility {
  pub company_id: i64,
  pub name:       String,
}

/// Format the `n`-th facility code for a company (1-based).
///
/// Fails once the per-company counter passes [`MAX_FACILITY_CODE`]; the code
/// occupies a fixed 3-digit field in application identifiers.
pub fn format_code(n: u32) -> Result<String> {
  if n == 0 || n > MAX_FACILITY_CODE {
    return Err(Error::ConstraintViolation(format!(
      "facility counter {n} outside 1..={MAX_FACILITY_CODE}"
    )));
  }
  Ok(format!("{n:03}"))
}
