//! SQL schema for the Bursar SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS companies (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    short_name     TEXT NOT NULL UNIQUE,  -- purge frees it by removing the row
    facility_seq   INTEGER NOT NULL DEFAULT 0,  -- monotonic facility-code counter
    is_archived    INTEGER NOT NULL DEFAULT 0,
    archived_at    TEXT,
    archived_by    INTEGER,
    archive_reason TEXT,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS facilities (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id     INTEGER NOT NULL REFERENCES companies(id),
    name           TEXT NOT NULL,
    code           TEXT NOT NULL,  -- immutable 3-digit code, assigned at creation
    is_archived    INTEGER NOT NULL DEFAULT 0,
    archived_at    TEXT,
    archived_by    INTEGER,
    archive_reason TEXT,
    created_at     TEXT NOT NULL,
    UNIQUE (company_id, code)
);

CREATE TABLE IF NOT EXISTS applications (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id TEXT NOT NULL,  -- unique among live rows, see index below
    company_id     INTEGER NOT NULL REFERENCES companies(id),
    facility_id    INTEGER NOT NULL REFERENCES facilities(id),
    activity       TEXT NOT NULL,
    title          TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'draft',
    is_archived    INTEGER NOT NULL DEFAULT 0,
    archived_at    TEXT,
    archived_by    INTEGER,
    archive_reason TEXT,
    created_at     TEXT NOT NULL
);

-- Identifiers that must never be reissued. Written when an application is
-- archived; survives purge; removed only by an explicit admin clearing.
CREATE TABLE IF NOT EXISTS ghost_application_ids (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id TEXT NOT NULL UNIQUE,
    company_id     INTEGER NOT NULL,
    facility_id    INTEGER NOT NULL,
    activity       TEXT NOT NULL,
    original_title TEXT NOT NULL,
    deleted_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    company_id INTEGER REFERENCES companies(id)
);

-- Dependent rows, purged before their application.
CREATE TABLE IF NOT EXISTS documents (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL REFERENCES applications(id),
    file_name      TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL REFERENCES applications(id),
    note           TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assignments (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL REFERENCES applications(id),
    contractor     TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

-- Backstop for the transactional allocation scan. Unique among live rows
-- only: an archived row keeps its identifier even after its ghost entry is
-- cleared and the identifier string is reissued to a new application.
CREATE UNIQUE INDEX IF NOT EXISTS applications_live_id
    ON applications(application_id) WHERE is_archived = 0;

CREATE INDEX IF NOT EXISTS facilities_company_idx    ON facilities(company_id);
CREATE INDEX IF NOT EXISTS applications_company_idx  ON applications(company_id);
CREATE INDEX IF NOT EXISTS applications_facility_idx ON applications(facility_id);
CREATE INDEX IF NOT EXISTS ghost_ids_company_idx     ON ghost_application_ids(company_id);
CREATE INDEX IF NOT EXISTS users_company_idx         ON users(company_id);
CREATE INDEX IF NOT EXISTS documents_app_idx         ON documents(application_id);
CREATE INDEX IF NOT EXISTS submissions_app_idx       ON submissions(application_id);
CREATE INDEX IF NOT EXISTS assignments_app_idx       ON assignments(application_id);

PRAGMA user_version = 1;
";
