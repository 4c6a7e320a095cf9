//! The identifier allocator — a pure scan over a taken-identifier predicate.
//!
//! An identifier has the form `{SHORT}-{code}-{digit}{seq}`:
//! company short name, 3-digit facility code, one activity digit and a
//! 2-digit sequence number. The allocator always scans from sequence 1, so a
//! slot freed by clearing its ghost entry is reissued before higher slots are
//! tried.
//!
//! The forbidden set is supplied by the caller as a predicate: an identifier
//! is taken if a *non-archived* application currently carries it, or if it is
//! present in the ghost registry. Archived-but-not-purged identifiers are
//! deliberately absent from the predicate's live branch — their ghost entry
//! blocks them instead, and a restore brings them back through the live
//! branch. The store runs the scan inside the same transaction that inserts
//! the new row, which closes the allocate-then-persist race.

use crate::{Error, Result, application::Activity};

/// Highest sequence number per (facility, activity) bucket.
///
/// A hard design limit: at most 99 applications per bucket, ever, including
/// archived and ghosted ones.
pub const MAX_SEQ: u32 = 99;

/// Format the candidate identifier for one sequence slot.
pub fn candidate(
  short_name: &str,
  facility_code: &str,
  activity: Activity,
  seq: u32,
) -> String {
  format!("{short_name}-{facility_code}-{}{seq:02}", activity.digit())
}

/// The bucket label used in exhaustion errors, e.g. `ACME-001-1`.
fn bucket(short_name: &str, facility_code: &str, activity: Activity) -> String {
  format!("{short_name}-{facility_code}-{}", activity.digit())
}

/// Find the lowest free sequence slot in a bucket.
///
/// `is_taken` is consulted once per candidate; a database-backed caller can
/// make it a pair of indexed existence probes. Errors from the predicate
/// abort the scan unchanged.
pub fn next_identifier<E>(
  short_name: &str,
  facility_code: &str,
  activity: Activity,
  mut is_taken: impl FnMut(&str) -> Result<bool, E>,
) -> Result<Result<String>, E> {
  for seq in 1..=MAX_SEQ {
    let id = candidate(short_name, facility_code, activity, seq);
    if !is_taken(&id)? {
      return Ok(Ok(id));
    }
  }
  Ok(Err(Error::AllocatorExhausted {
    bucket: bucket(short_name, facility_code, activity),
  }))
}

/// Rewrite the short-name prefix of an existing identifier.
///
/// Used by the company short-name rename cascade — the one sanctioned
/// mutation of an issued identifier. Everything after the first `-` is kept
/// verbatim.
pub fn with_short_name(identifier: &str, new_short: &str) -> String {
  match identifier.split_once('-') {
    Some((_, rest)) => format!("{new_short}-{rest}"),
    None => new_short.to_owned(),
  }
}
