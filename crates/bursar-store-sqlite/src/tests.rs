//! Integration tests for `SqliteStore` against an in-memory database.

use bursar_core::{
  application::{Activity, ApplicationStatus, NewApplication},
  archive::EntityKind,
  company::{Company, NewCompany},
  facility::{Facility, NewFacility},
  store::ProgramStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn company(s: &SqliteStore, name: &str) -> Company {
  s.create_company(NewCompany { name: name.into(), short_name: None })
    .await
    .unwrap()
}

async fn facility(s: &SqliteStore, company_id: i64, name: &str) -> Facility {
  s.create_facility(NewFacility { company_id, name: name.into() })
    .await
    .unwrap()
}

/// One company ("Acme Corp" → "ACME") with one facility ("001").
async fn setup() -> (SqliteStore, Company, Facility) {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let f = facility(&s, c.id, "Main plant").await;
  (s, c, f)
}

fn new_app(c: &Company, f: &Facility, activity: Activity) -> NewApplication {
  NewApplication {
    company_id:  c.id,
    facility_id: f.id,
    activity,
    title:       "Boiler upgrade".into(),
  }
}

fn assert_identifier_format(id: &str) {
  let parts: Vec<&str> = id.split('-').collect();
  assert_eq!(parts.len(), 3, "identifier {id:?}");
  assert!((1..=6).contains(&parts[0].len()), "short name in {id:?}");
  assert!(
    parts[0]
      .chars()
      .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
    "short name in {id:?}"
  );
  assert_eq!(parts[1].len(), 3, "facility code in {id:?}");
  assert!(parts[1].chars().all(|c| c.is_ascii_digit()), "code in {id:?}");
  assert_eq!(parts[2].len(), 3, "activity+sequence in {id:?}");
  assert!(parts[2].chars().all(|c| c.is_ascii_digit()), "tail in {id:?}");
}

// ─── Companies and short names ───────────────────────────────────────────────

#[tokio::test]
async fn create_company_derives_short_name() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  assert_eq!(c.short_name, "ACME");

  let fetched = s.get_company(c.id).await.unwrap().unwrap();
  assert_eq!(fetched.short_name, "ACME");
  assert!(!fetched.is_archived());
}

#[tokio::test]
async fn explicit_short_name_is_validated() {
  let s = store().await;

  let err = s
    .create_company(NewCompany {
      name:       "Acme Corp".into(),
      short_name: Some("acme".into()),
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::InvalidShortName(_))
  ));

  company(&s, "Acme Corp").await;
  let err = s
    .create_company(NewCompany {
      name:       "Other".into(),
      short_name: Some("ACME".into()),
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::ShortNameTaken(_))
  ));
}

#[tokio::test]
async fn contested_short_name_gets_numeric_suffix() {
  let s = store().await;
  let first = company(&s, "Acme Corp").await;
  let second = company(&s, "Acme Ltd").await;
  assert_eq!(first.short_name, "ACME");
  assert_eq!(second.short_name, "ACME2");
}

#[tokio::test]
async fn archived_company_still_blocks_its_short_name() {
  let s = store().await;
  let first = company(&s, "Acme Corp").await;
  s.archive(EntityKind::Company, vec![first.id], "closed".into(), 1)
    .await
    .unwrap();

  // Archived but not purged: the short name stays reserved so a restore
  // cannot collide with a newer company.
  let second = company(&s, "Acme Corp").await;
  assert_eq!(second.short_name, "ACME2");
}

#[tokio::test]
async fn purged_company_frees_its_short_name() {
  let s = store().await;
  let first = company(&s, "Acme Corp").await;
  s.archive(EntityKind::Company, vec![first.id], "closed".into(), 1)
    .await
    .unwrap();
  let purged = s.purge(EntityKind::Company, vec![first.id]).await.unwrap();
  assert_eq!(purged.succeeded, 1);

  let second = company(&s, "Acme Corp").await;
  assert_eq!(second.short_name, "ACME");
}

#[tokio::test]
async fn get_company_missing_returns_none() {
  let s = store().await;
  assert!(s.get_company(999).await.unwrap().is_none());
}

// ─── Facility codes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn facility_codes_are_sequential() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  assert_eq!(facility(&s, c.id, "First").await.code, "001");
  assert_eq!(facility(&s, c.id, "Second").await.code, "002");
  assert_eq!(facility(&s, c.id, "Third").await.code, "003");
}

#[tokio::test]
async fn facility_codes_are_never_reassigned() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  facility(&s, c.id, "First").await;
  let second = facility(&s, c.id, "Second").await;

  s.archive(EntityKind::Facility, vec![second.id], "sold".into(), 1)
    .await
    .unwrap();
  s.purge(EntityKind::Facility, vec![second.id]).await.unwrap();

  // The counter moves forward only; "002" stays burned.
  assert_eq!(facility(&s, c.id, "Third").await.code, "003");
}

#[tokio::test]
async fn facility_codes_are_independent_per_company() {
  let s = store().await;
  let a = company(&s, "Acme Corp").await;
  let b = company(&s, "Globex International").await;
  facility(&s, a.id, "A1").await;
  assert_eq!(facility(&s, b.id, "B1").await.code, "001");
}

#[tokio::test]
async fn create_echoes_submitted_fields() {
  let (s, c, f) = setup().await;
  assert_eq!(f.name, "Main plant");
  assert_eq!(f.company_id, c.id);

  let app = s
    .create_application(new_app(&c, &f, Activity::RenewableGeneration))
    .await
    .unwrap();
  assert_eq!(app.title, "Boiler upgrade");
  assert_eq!(app.company_id, c.id);
  assert_eq!(app.facility_id, f.id);
  assert_eq!(app.activity, Activity::RenewableGeneration);
}

#[tokio::test]
async fn create_facility_unknown_company_errors() {
  let s = store().await;
  let err = s
    .create_facility(NewFacility { company_id: 42, name: "Plant".into() })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::EntityNotFound {
      kind: EntityKind::Company,
      id:   42,
    })
  ));
}

// ─── Identifier allocation ───────────────────────────────────────────────────

#[tokio::test]
async fn first_identifier_in_a_bucket() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  assert_eq!(app.application_id, "ACME-001-101");
  assert_eq!(app.status, ApplicationStatus::Draft);
}

#[tokio::test]
async fn identifiers_are_monotonic_within_a_bucket() {
  let (s, c, f) = setup().await;
  for expected in ["ACME-001-101", "ACME-001-102", "ACME-001-103"] {
    let app = s
      .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
      .await
      .unwrap();
    assert_eq!(app.application_id, expected);
  }
}

#[tokio::test]
async fn identifier_format_holds_across_activities() {
  let (s, c, f) = setup().await;
  for activity in Activity::ALL {
    let app = s.create_application(new_app(&c, &f, activity)).await.unwrap();
    assert_identifier_format(&app.application_id);
    let digit = app.application_id.split('-').nth(2).unwrap().chars().next();
    assert_eq!(digit, Some(activity.digit()));
  }
}

#[tokio::test]
async fn buckets_are_independent_per_activity() {
  let (s, c, f) = setup().await;
  s.create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  let other = s
    .create_application(new_app(&c, &f, Activity::WorkforceTraining))
    .await
    .unwrap();
  assert_eq!(other.application_id, "ACME-001-401");
}

#[tokio::test]
async fn create_application_checks_facility_ownership() {
  let s = store().await;
  let a = company(&s, "Acme Corp").await;
  let b = company(&s, "Globex International").await;
  let fb = facility(&s, b.id, "Globex plant").await;

  let err = s
    .create_application(NewApplication {
      company_id:  a.id,
      facility_id: fb.id,
      activity:    Activity::EnergyEfficiency,
      title:       "Cross-tenant".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::ConstraintViolation(_))
  ));
}

#[tokio::test]
async fn create_application_unknown_facility_errors() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let err = s
    .create_application(NewApplication {
      company_id:  c.id,
      facility_id: 77,
      activity:    Activity::EnergyEfficiency,
      title:       "Nowhere".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::EntityNotFound {
      kind: EntityKind::Facility,
      id:   77,
    })
  ));
}

#[tokio::test]
async fn bucket_exhaustion_is_a_capacity_error() {
  let (s, c, f) = setup().await;
  for _ in 0..99 {
    s.create_application(new_app(&c, &f, Activity::EnergyEfficiency))
      .await
      .unwrap();
  }
  let err = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::AllocatorExhausted { .. })
  ));
}

#[tokio::test]
async fn concurrent_allocations_never_collide() {
  let (s, c, f) = setup().await;
  let (a, b) = tokio::join!(
    s.create_application(new_app(&c, &f, Activity::EnergyEfficiency)),
    s.create_application(new_app(&c, &f, Activity::EnergyEfficiency)),
  );
  let (a, b) = (a.unwrap(), b.unwrap());
  assert_ne!(a.application_id, b.application_id);
}

// ─── Ghost ids ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn archiving_an_application_writes_its_ghost_row() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();

  s.archive(EntityKind::Application, vec![app.id], "withdrawn".into(), 7)
    .await
    .unwrap();

  let ghosts = s.list_ghost_ids(None).await.unwrap();
  assert_eq!(ghosts.len(), 1);
  assert_eq!(ghosts[0].application_id, "ACME-001-101");
  assert_eq!(ghosts[0].company_id, c.id);
  assert_eq!(ghosts[0].activity, Activity::EnergyEfficiency);
  assert_eq!(ghosts[0].original_title, "Boiler upgrade");

  let archived = s.get_application(app.id).await.unwrap().unwrap();
  let meta = archived.archive.expect("archive metadata");
  assert_eq!(meta.archived_by, 7);
  assert_eq!(meta.reason, "withdrawn");
}

#[tokio::test]
async fn ghosted_identifier_is_skipped_by_the_allocator() {
  let (s, c, f) = setup().await;
  let first = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  s.archive(EntityKind::Application, vec![first.id], "withdrawn".into(), 1)
    .await
    .unwrap();

  // 101 is archived (out of the live branch) but its ghost row blocks it.
  let second = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  assert_eq!(second.application_id, "ACME-001-102");
}

#[tokio::test]
async fn restored_identifier_blocks_via_the_live_branch() {
  let (s, c, f) = setup().await;
  let first = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  s.archive(EntityKind::Application, vec![first.id], "oops".into(), 1)
    .await
    .unwrap();
  s.restore(EntityKind::Application, vec![first.id]).await.unwrap();

  // Restore does not touch the registry; the identifier is now doubly
  // blocked (live row + ghost row).
  assert_eq!(s.list_ghost_ids(None).await.unwrap().len(), 1);
  let second = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  assert_eq!(second.application_id, "ACME-001-102");
}

#[tokio::test]
async fn clearing_a_ghost_reissues_the_lowest_free_slot() {
  let (s, c, f) = setup().await;

  let first = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  assert_eq!(first.application_id, "ACME-001-101");

  s.archive(EntityKind::Application, vec![first.id], "withdrawn".into(), 1)
    .await
    .unwrap();
  let second = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  assert_eq!(second.application_id, "ACME-001-102");

  let cleared = s
    .clear_ghost_ids(vec!["ACME-001-101".into()])
    .await
    .unwrap();
  assert_eq!(cleared, 1);

  // The scan always starts at 1, so the freed slot comes back before 103.
  let third = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  assert_eq!(third.application_id, "ACME-001-101");

  // The archived row keeps the identifier too; only live rows are unique.
  let first = s.get_application(first.id).await.unwrap().unwrap();
  assert_eq!(first.application_id, "ACME-001-101");
  assert!(first.is_archived());
}

#[tokio::test]
async fn identifiers_never_repeat_across_archive_and_purge() {
  let (s, c, f) = setup().await;
  let mut seen = std::collections::HashSet::new();

  for round in 0..10 {
    let app = s
      .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
      .await
      .unwrap();
    assert!(
      seen.insert(app.application_id.clone()),
      "identifier {} reissued",
      app.application_id
    );
    s.archive(EntityKind::Application, vec![app.id], "cycle".into(), 1)
      .await
      .unwrap();
    if round % 2 == 0 {
      s.purge(EntityKind::Application, vec![app.id]).await.unwrap();
    }
  }
}

#[tokio::test]
async fn list_ghost_ids_filters_by_company() {
  let s = store().await;
  let a = company(&s, "Acme Corp").await;
  let b = company(&s, "Globex International").await;
  let fa = facility(&s, a.id, "A1").await;
  let fb = facility(&s, b.id, "B1").await;

  let app_a = s.create_application(new_app(&a, &fa, Activity::EnergyEfficiency)).await.unwrap();
  let app_b = s.create_application(new_app(&b, &fb, Activity::EnergyEfficiency)).await.unwrap();
  s.archive(EntityKind::Application, vec![app_a.id], "a".into(), 1).await.unwrap();
  s.archive(EntityKind::Application, vec![app_b.id], "b".into(), 1).await.unwrap();

  assert_eq!(s.list_ghost_ids(None).await.unwrap().len(), 2);
  let only_a = s.list_ghost_ids(Some(a.id)).await.unwrap();
  assert_eq!(only_a.len(), 1);
  assert_eq!(only_a[0].company_id, a.id);
}

#[tokio::test]
async fn clear_all_empties_the_registry() {
  let (s, c, f) = setup().await;
  for _ in 0..3 {
    let app = s
      .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
      .await
      .unwrap();
    s.archive(EntityKind::Application, vec![app.id], "x".into(), 1)
      .await
      .unwrap();
  }
  assert_eq!(s.clear_all_ghost_ids().await.unwrap(), 3);
  assert!(s.list_ghost_ids(None).await.unwrap().is_empty());
}

// ─── Archive cascades ────────────────────────────────────────────────────────

#[tokio::test]
async fn company_archive_cascades_to_all_descendants() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let f1 = facility(&s, c.id, "First").await;
  let f2 = facility(&s, c.id, "Second").await;
  let apps = [
    s.create_application(new_app(&c, &f1, Activity::EnergyEfficiency)).await.unwrap(),
    s.create_application(new_app(&c, &f1, Activity::WorkforceTraining)).await.unwrap(),
    s.create_application(new_app(&c, &f2, Activity::ResearchDevelopment)).await.unwrap(),
  ];
  let user = s.create_user("Pat".into(), Some(c.id)).await.unwrap();

  let outcome = s
    .archive(EntityKind::Company, vec![c.id], "program ended".into(), 1)
    .await
    .unwrap();
  assert_eq!(outcome.succeeded, 1);

  assert!(s.get_company(c.id).await.unwrap().unwrap().is_archived());
  assert!(s.get_facility(f1.id).await.unwrap().unwrap().is_archived());
  assert!(s.get_facility(f2.id).await.unwrap().unwrap().is_archived());
  for app in &apps {
    assert!(s.get_application(app.id).await.unwrap().unwrap().is_archived());
  }
  assert_eq!(s.list_ghost_ids(None).await.unwrap().len(), 3);

  // The account survives; only its association is cleared.
  let user = s.get_user(user.id).await.unwrap().unwrap();
  assert_eq!(user.company_id, None);
}

#[tokio::test]
async fn facility_archive_cascades_to_its_applications_only() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let f1 = facility(&s, c.id, "First").await;
  let f2 = facility(&s, c.id, "Second").await;
  let in_f1 = s.create_application(new_app(&c, &f1, Activity::EnergyEfficiency)).await.unwrap();
  let in_f2 = s.create_application(new_app(&c, &f2, Activity::EnergyEfficiency)).await.unwrap();

  s.archive(EntityKind::Facility, vec![f1.id], "sold".into(), 1)
    .await
    .unwrap();

  assert!(s.get_facility(f1.id).await.unwrap().unwrap().is_archived());
  assert!(s.get_application(in_f1.id).await.unwrap().unwrap().is_archived());
  assert!(!s.get_company(c.id).await.unwrap().unwrap().is_archived());
  assert!(!s.get_application(in_f2.id).await.unwrap().unwrap().is_archived());
  assert_eq!(s.list_ghost_ids(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn archive_is_idempotent_per_id() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();

  let first = s
    .archive(EntityKind::Application, vec![app.id], "once".into(), 1)
    .await
    .unwrap();
  assert_eq!((first.succeeded, first.skipped), (1, 0));

  let second = s
    .archive(EntityKind::Application, vec![app.id], "twice".into(), 1)
    .await
    .unwrap();
  assert_eq!((second.succeeded, second.skipped), (0, 1));
  assert_eq!(s.list_ghost_ids(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn bulk_archive_is_best_effort_per_id() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();

  let outcome = s
    .archive(EntityKind::Application, vec![app.id, 9999], "mixed".into(), 1)
    .await
    .unwrap();
  assert_eq!(outcome.succeeded, 1);
  assert_eq!(outcome.skipped, 1);
  assert!(outcome.failed.is_empty());
  assert!(s.get_application(app.id).await.unwrap().unwrap().is_archived());
}

// ─── Restore ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn restore_clears_flag_and_metadata() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  s.archive(EntityKind::Application, vec![app.id], "oops".into(), 1)
    .await
    .unwrap();

  let outcome = s
    .restore(EntityKind::Application, vec![app.id])
    .await
    .unwrap();
  assert_eq!(outcome.succeeded, 1);

  let restored = s.get_application(app.id).await.unwrap().unwrap();
  assert!(restored.archive.is_none());
}

#[tokio::test]
async fn restore_does_not_cascade() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let f = facility(&s, c.id, "Main plant").await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  s.archive(EntityKind::Company, vec![c.id], "ended".into(), 1)
    .await
    .unwrap();

  // Restoring the company leaves its descendants archived: children are
  // restored individually, by deliberate asymmetry with archive.
  s.restore(EntityKind::Company, vec![c.id]).await.unwrap();

  assert!(!s.get_company(c.id).await.unwrap().unwrap().is_archived());
  assert!(s.get_facility(f.id).await.unwrap().unwrap().is_archived());
  assert!(s.get_application(app.id).await.unwrap().unwrap().is_archived());
}

#[tokio::test]
async fn restore_of_live_or_missing_rows_is_skipped() {
  let (s, c, _f) = setup().await;
  let outcome = s
    .restore(EntityKind::Company, vec![c.id, 424242])
    .await
    .unwrap();
  assert_eq!(outcome.succeeded, 0);
  assert_eq!(outcome.skipped, 2);
}

// ─── Permanent delete ────────────────────────────────────────────────────────

#[tokio::test]
async fn purge_rejects_non_archived_targets() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();

  let outcome = s.purge(EntityKind::Application, vec![app.id]).await.unwrap();
  assert_eq!(outcome.succeeded, 0);
  assert_eq!(outcome.failed.len(), 1);
  assert!(outcome.failed[0].message.contains("non-archived"));

  // The row is untouched.
  assert!(s.get_application(app.id).await.unwrap().is_some());
}

#[tokio::test]
async fn purge_removes_dependents_before_the_application() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  s.attach_document(app.id, "quote.pdf".into()).await.unwrap();
  s.record_submission(app.id, "initial filing".into()).await.unwrap();
  s.assign_contractor(app.id, "Wrench & Co".into()).await.unwrap();
  assert_eq!(s.count_dependents(app.id).await.unwrap(), 3);

  s.archive(EntityKind::Application, vec![app.id], "done".into(), 1)
    .await
    .unwrap();
  let outcome = s.purge(EntityKind::Application, vec![app.id]).await.unwrap();
  assert_eq!(outcome.succeeded, 1);

  assert!(s.get_application(app.id).await.unwrap().is_none());
  assert_eq!(s.count_dependents(app.id).await.unwrap(), 0);

  // The ghost row outlives the purge, and keeps the identifier blocked.
  assert_eq!(s.list_ghost_ids(None).await.unwrap().len(), 1);
  let next = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  assert_eq!(next.application_id, "ACME-001-102");
}

#[tokio::test]
async fn purge_company_removes_the_archived_closure() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let f = facility(&s, c.id, "Main plant").await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();

  s.archive(EntityKind::Company, vec![c.id], "gone".into(), 1)
    .await
    .unwrap();
  let outcome = s.purge(EntityKind::Company, vec![c.id]).await.unwrap();
  assert_eq!(outcome.succeeded, 1);

  assert!(s.get_company(c.id).await.unwrap().is_none());
  assert!(s.get_facility(f.id).await.unwrap().is_none());
  assert!(s.get_application(app.id).await.unwrap().is_none());
  assert_eq!(s.list_ghost_ids(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn purge_rejects_archived_parents_with_live_children() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let f = facility(&s, c.id, "Main plant").await;
  s.archive(EntityKind::Company, vec![c.id], "ended".into(), 1)
    .await
    .unwrap();
  s.restore(EntityKind::Facility, vec![f.id]).await.unwrap();

  let outcome = s.purge(EntityKind::Company, vec![c.id]).await.unwrap();
  assert_eq!(outcome.succeeded, 0);
  assert_eq!(outcome.failed.len(), 1);
  assert!(outcome.failed[0].message.contains("live descendant"));

  // Nothing was deleted.
  assert!(s.get_company(c.id).await.unwrap().is_some());
  assert!(s.get_facility(f.id).await.unwrap().is_some());
}

#[tokio::test]
async fn purge_of_missing_ids_is_skipped() {
  let s = store().await;
  let outcome = s.purge(EntityKind::Company, vec![31337]).await.unwrap();
  assert_eq!((outcome.succeeded, outcome.skipped), (0, 1));
}

// ─── Archived listings ───────────────────────────────────────────────────────

#[tokio::test]
async fn list_archived_nests_descendants_under_archived_parents() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let f = facility(&s, c.id, "Main plant").await;
  s.create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  s.archive(EntityKind::Company, vec![c.id], "ended".into(), 1)
    .await
    .unwrap();

  let tree = s.list_archived().await.unwrap();
  assert_eq!(tree.companies.len(), 1);
  assert!(tree.facilities.is_empty());
  assert!(tree.applications.is_empty());

  let node = &tree.companies[0];
  assert_eq!(node.company.id, c.id);
  assert_eq!(node.facilities.len(), 1);
  assert_eq!(node.facilities[0].applications.len(), 1);
}

#[tokio::test]
async fn list_archived_reports_orphans_at_top_level() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();

  // Only the application is archived; its parents stay live.
  s.archive(EntityKind::Application, vec![app.id], "solo".into(), 1)
    .await
    .unwrap();

  let tree = s.list_archived().await.unwrap();
  assert!(tree.companies.is_empty());
  assert!(tree.facilities.is_empty());
  assert_eq!(tree.applications.len(), 1);
  assert_eq!(tree.applications[0].id, app.id);
}

// ─── Short-name rename cascade ───────────────────────────────────────────────

#[tokio::test]
async fn rename_rewrites_live_and_ghost_identifiers() {
  let (s, c, f) = setup().await;
  let kept = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  let dropped = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  s.archive(EntityKind::Application, vec![dropped.id], "old".into(), 1)
    .await
    .unwrap();

  let renamed = s.rename_short_name(c.id, "APEX".into()).await.unwrap();
  assert_eq!(renamed.short_name, "APEX");

  let kept = s.get_application(kept.id).await.unwrap().unwrap();
  assert_eq!(kept.application_id, "APEX-001-101");

  let ghosts = s.list_ghost_ids(Some(c.id)).await.unwrap();
  assert_eq!(ghosts.len(), 1);
  assert_eq!(ghosts[0].application_id, "APEX-001-102");

  // Allocation continues in the renamed bucket.
  let next = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();
  assert_eq!(next.application_id, "APEX-001-103");
}

#[tokio::test]
async fn rename_rejects_collisions_and_bad_names() {
  let s = store().await;
  let a = company(&s, "Acme Corp").await;
  let b = company(&s, "Globex International").await;

  let err = s
    .rename_short_name(a.id, b.short_name.clone())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::ShortNameTaken(_))
  ));

  let err = s.rename_short_name(a.id, "nope!".into()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::InvalidShortName(_))
  ));
}

// ─── Status and users ────────────────────────────────────────────────────────

#[tokio::test]
async fn update_status_round_trips() {
  let (s, c, f) = setup().await;
  let app = s
    .create_application(new_app(&c, &f, Activity::EnergyEfficiency))
    .await
    .unwrap();

  let updated = s
    .update_status(app.id, ApplicationStatus::Submitted)
    .await
    .unwrap();
  assert_eq!(updated.status, ApplicationStatus::Submitted);

  let err = s
    .update_status(5555, ApplicationStatus::Approved)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(bursar_core::Error::EntityNotFound { .. })
  ));
}

#[tokio::test]
async fn users_round_trip() {
  let s = store().await;
  let c = company(&s, "Acme Corp").await;
  let user = s.create_user("Sam".into(), Some(c.id)).await.unwrap();

  let fetched = s.get_user(user.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Sam");
  assert_eq!(fetched.company_id, Some(c.id));
  assert!(s.get_user(999).await.unwrap().is_none());
}
