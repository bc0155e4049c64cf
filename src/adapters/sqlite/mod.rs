//! SQLite datastore
//!
//! One [`SqliteStore`] implements every persistence port. The connection
//! sits behind a mutex so the store can be cloned into the HTTP loop and the
//! background worker.
//!
//! # Schema Versioning
//!
//! `schema_version` tracks the applied version. To change the schema, bump
//! `CURRENT_SCHEMA_VERSION` and add a step to `run_migrations()`.

mod code;
mod composition;
mod feedback;
mod jobs;
mod webhooks;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context as _;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, params};

use crate::core::models::CodeLabel;

/// Current schema version
const CURRENT_SCHEMA_VERSION: i64 = 1;

/// SQLite-backed store for repositories, attestations, webhooks, and jobs
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// `:memory:` gives a private in-memory database.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy();

        if path_str != ":memory:" {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;

        if path_str != ":memory:" {
            let _: String = conn
                .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
                .context("failed to set journal_mode")?;
        }
        conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            ",
        )
        .context("failed to configure database")?;

        let current: i64 = conn
            .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| row.get(0))
            .optional()
            .context("failed to read schema version")?
            .unwrap_or(0);

        Self::run_migrations(&conn, current)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database
    pub fn in_memory() -> anyhow::Result<Self> {
        Self::open(":memory:")
    }

    fn run_migrations(conn: &Connection, from_version: i64) -> anyhow::Result<()> {
        if from_version > CURRENT_SCHEMA_VERSION {
            anyhow::bail!(
                "database schema version {from_version} is newer than supported version \
                 {CURRENT_SCHEMA_VERSION}"
            );
        }
        if from_version == CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        if from_version < 1 {
            conn.execute_batch(
                r"
                CREATE TABLE organizations (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL
                );

                CREATE TABLE repositories (
                    id INTEGER PRIMARY KEY,
                    public_id TEXT NOT NULL UNIQUE,
                    full_name TEXT NOT NULL UNIQUE,
                    organization_id INTEGER NOT NULL REFERENCES organizations(id)
                );

                CREATE TABLE commits (
                    id INTEGER PRIMARY KEY,
                    repository_id INTEGER NOT NULL REFERENCES repositories(id),
                    sha TEXT NOT NULL,
                    last_attested_at TEXT,
                    ai_composition TEXT,
                    needs_composition_recalculation INTEGER NOT NULL DEFAULT 0,
                    UNIQUE (repository_id, sha)
                );

                CREATE TABLE files (
                    id INTEGER PRIMARY KEY,
                    commit_id INTEGER NOT NULL REFERENCES commits(id),
                    file_path TEXT NOT NULL,
                    last_attested_at TEXT,
                    UNIQUE (commit_id, file_path)
                );

                CREATE TABLE code_attestations (
                    id INTEGER PRIMARY KEY,
                    repository_id INTEGER NOT NULL REFERENCES repositories(id),
                    code_hash TEXT NOT NULL,
                    label TEXT NOT NULL,
                    attested_by TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE (repository_id, code_hash)
                );

                CREATE TABLE chunks (
                    id INTEGER PRIMARY KEY,
                    file_id INTEGER NOT NULL REFERENCES files(id),
                    code_hash TEXT NOT NULL,
                    code_line_start INTEGER NOT NULL,
                    code_line_end INTEGER NOT NULL,
                    label TEXT,
                    attestation_id INTEGER REFERENCES code_attestations(id)
                );
                CREATE INDEX idx_chunks_code_hash ON chunks(code_hash);
                CREATE INDEX idx_chunks_file ON chunks(file_id);

                CREATE TABLE pull_requests (
                    id INTEGER PRIMARY KEY,
                    repository_id INTEGER NOT NULL REFERENCES repositories(id),
                    pr_number INTEGER NOT NULL,
                    head_commit_sha TEXT NOT NULL,
                    last_attested_at TEXT,
                    UNIQUE (repository_id, pr_number)
                );
                CREATE INDEX idx_pull_requests_head ON pull_requests(head_commit_sha);

                CREATE TABLE webhook_requests (
                    id INTEGER PRIMARY KEY,
                    provider TEXT NOT NULL,
                    integration TEXT,
                    data_file_path TEXT NOT NULL,
                    response_status_code INTEGER,
                    response_message TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE jobs (
                    id INTEGER PRIMARY KEY,
                    kind TEXT NOT NULL,
                    payload TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending',
                    attempts INTEGER NOT NULL DEFAULT 0,
                    last_error TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX idx_jobs_pending ON jobs(kind, id) WHERE status = 'pending';

                CREATE TABLE feedback (
                    id INTEGER PRIMARY KEY,
                    user TEXT NOT NULL,
                    file_path TEXT NOT NULL,
                    code_line_start INTEGER NOT NULL,
                    code_line_end INTEGER NOT NULL,
                    status TEXT NOT NULL DEFAULT 'open',
                    vote TEXT NOT NULL,
                    comment TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL
                );
                ",
            )
            .context("migration v1 failed")?;
        }

        conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
            params![CURRENT_SCHEMA_VERSION],
        )
        .context("failed to update schema version")?;

        Ok(())
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))
    }
}

// =============================================================================
// ROW HELPERS
// =============================================================================

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_ts(idx, &s)).transpose()
}

fn parse_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

fn parse_opt_label(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<CodeLabel>> {
    raw.map(|s| parse_enum::<CodeLabel>(idx, &s)).transpose()
}

/// `?, ?, ?` for `n` parameters starting at `?{first}`
fn placeholders(first: usize, n: usize) -> String {
    (first..first + n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

fn id_values(ids: &[i64]) -> impl Iterator<Item = Value> + '_ {
    ids.iter().map(|&id| Value::Integer(id))
}
