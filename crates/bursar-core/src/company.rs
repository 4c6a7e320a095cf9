//! Company — the tenant that owns facilities and applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, archive::ArchiveMeta};

/// Maximum length of a company short name.
pub const SHORT_NAME_MAX: usize = 6;

/// Fallback short-name base for display names with no usable characters.
const SHORT_NAME_FALLBACK: &str = "ORG";

/// A company enrolled in the program.
///
/// The short name is the prefix of every application identifier the company
/// will ever own, so it stays reserved for as long as the company row exists
/// — archived companies block reuse just like live ones. Only a permanent
/// purge frees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
  pub id:         i64,
  pub name:       String,
  /// 1–6 ASCII uppercase alphanumerics.
  pub short_name: String,
  pub archive:    Option<ArchiveMeta>,
  pub created_at: DateTime<Utc>,
}

impl Company {
  pub fn is_archived(&self) -> bool { self.archive.is_some() }
}

/// Input for creating a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
  pub name:       String,
  /// Explicit short name; derived from `name` when absent.
  pub short_name: Option<String>,
}

/// A user account associated with at most one company.
///
/// Accounts outlive company archival: archiving a company clears the
/// association instead of touching the account itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:         i64,
  pub name:       String,
  pub company_id: Option<i64>,
}

// ─── Short names ─────────────────────────────────────────────────────────────

/// Check that `s` is a well-formed short name: 1–6 ASCII uppercase
/// alphanumerics.
pub fn validate_short_name(s: &str) -> Result<()> {
  let ok = !s.is_empty()
    && s.len() <= SHORT_NAME_MAX
    && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
  if ok {
    Ok(())
  } else {
    Err(Error::InvalidShortName(s.to_owned()))
  }
}

/// Derive a short-name base from a display name: the first word that yields
/// any alphanumerics, uppercased and truncated. `"Acme Corp"` → `"ACME"`.
pub fn derive_short_name(name: &str) -> String {
  for word in name.split_whitespace() {
    let base: String = word
      .chars()
      .filter(char::is_ascii_alphanumeric)
      .map(|c| c.to_ascii_uppercase())
      .take(SHORT_NAME_MAX)
      .collect();
    if !base.is_empty() {
      return base;
    }
  }
  SHORT_NAME_FALLBACK.to_owned()
}

/// The `n`-th candidate for a contested base: the base itself, then the base
/// with a numeric suffix, truncated so the result still fits.
/// `("ACME", 0)` → `"ACME"`, `("ACME", 1)` → `"ACME2"`.
pub fn short_name_candidate(base: &str, n: u32) -> String {
  if n == 0 {
    return base.to_owned();
  }
  let suffix = (n + 1).to_string();
  let keep = SHORT_NAME_MAX.saturating_sub(suffix.len()).min(base.len());
  format!("{}{suffix}", &base[..keep])
}
