//! Repositories, commits, files, chunks, pull requests, and attestations

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::core::models::{
    AttestedTargets, CodeAttestation, CodeChunk, CodeLabel, Commit, NewChunk, Organization,
    PullRequest, Repository, RepositoryFile, Upserted, ValidAttestation, normalize_code_hash,
};
use crate::core::ports::CodeRepository;

use super::{
    SqliteStore, format_ts, id_values, parse_enum, parse_opt_label, parse_opt_ts, parse_ts,
    placeholders,
};

const CHUNK_COLUMNS: &str = "ch.id, ch.file_id, ch.code_hash, ch.code_line_start, \
                             ch.code_line_end, ch.label, ch.attestation_id, a.label";

const ATTESTATION_COLUMNS: &str =
    "id, repository_id, code_hash, label, attested_by, created_at, updated_at";

fn row_to_repository(row: &Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        public_id: row.get(1)?,
        full_name: row.get(2)?,
        organization_id: row.get(3)?,
    })
}

fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<CodeChunk> {
    Ok(CodeChunk {
        id: row.get(0)?,
        file_id: row.get(1)?,
        code_hash: row.get(2)?,
        code_line_start: row.get(3)?,
        code_line_end: row.get(4)?,
        label: parse_opt_label(5, row.get(5)?)?,
        attestation_id: row.get(6)?,
        attested_label: parse_opt_label(7, row.get(7)?)?,
    })
}

fn row_to_attestation(row: &Row<'_>) -> rusqlite::Result<CodeAttestation> {
    let label: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(CodeAttestation {
        id: row.get(0)?,
        repository_id: row.get(1)?,
        code_hash: row.get(2)?,
        label: parse_enum(3, &label)?,
        attested_by: row.get(4)?,
        created_at: parse_ts(5, &created_at)?,
        updated_at: parse_ts(6, &updated_at)?,
    })
}

pub(super) fn row_to_commit(row: &Row<'_>) -> rusqlite::Result<Commit> {
    let composition: Option<String> = row.get(4)?;
    let ai_composition = composition
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(Commit {
        id: row.get(0)?,
        repository_id: row.get(1)?,
        sha: row.get(2)?,
        last_attested_at: parse_opt_ts(3, row.get(3)?)?,
        ai_composition,
        needs_composition_recalculation: row.get(5)?,
    })
}

pub(super) const COMMIT_COLUMNS: &str = "id, repository_id, sha, last_attested_at, \
                                         ai_composition, needs_composition_recalculation";

fn row_to_pull_request(row: &Row<'_>) -> rusqlite::Result<PullRequest> {
    Ok(PullRequest {
        id: row.get(0)?,
        repository_id: row.get(1)?,
        pr_number: row.get(2)?,
        head_commit_sha: row.get(3)?,
        last_attested_at: parse_opt_ts(4, row.get(4)?)?,
    })
}

/// Distinct integer column values for rows whose `key` is in `ids`
fn distinct_ids(
    conn: &Connection,
    column: &str,
    table: &str,
    key: &str,
    ids: &[i64],
) -> rusqlite::Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT DISTINCT {column} FROM {table} WHERE {key} IN ({}) ORDER BY {column}",
        placeholders(1, ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(id_values(ids)), |row| row.get(0))?;
    rows.collect()
}

/// `UPDATE {table} SET {column} = ?1 WHERE id IN (...)`
fn set_where_ids(
    conn: &Connection,
    table: &str,
    assignment: &str,
    value: Value,
    ids: &[i64],
) -> rusqlite::Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "UPDATE {table} SET {assignment} WHERE id IN ({})",
        placeholders(2, ids.len())
    );
    conn.execute(&sql, params_from_iter(std::iter::once(value).chain(id_values(ids))))
}

impl CodeRepository for SqliteStore {
    fn repository_by_public_id(&self, public_id: &str) -> anyhow::Result<Option<Repository>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, public_id, full_name, organization_id FROM repositories
             WHERE public_id = ?1",
            params![public_id],
            row_to_repository,
        )
        .optional()
        .context("failed to look up repository")
    }

    fn repository_by_full_name(&self, full_name: &str) -> anyhow::Result<Option<Repository>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, public_id, full_name, organization_id FROM repositories
             WHERE full_name = ?1 COLLATE NOCASE",
            params![full_name],
            row_to_repository,
        )
        .optional()
        .context("failed to look up repository")
    }

    fn upsert_attestation(
        &self,
        repository: &Repository,
        attestation: &ValidAttestation,
    ) -> anyhow::Result<Upserted> {
        let conn = self.conn()?;
        let now = format_ts(Utc::now());

        // a row created by this statement carries this statement's timestamp
        let (row, created) = conn
            .query_row(
                &format!(
                    "INSERT INTO code_attestations
                        (repository_id, code_hash, label, attested_by, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                     ON CONFLICT (repository_id, code_hash) DO UPDATE SET
                        label = excluded.label,
                        attested_by = excluded.attested_by,
                        updated_at = excluded.updated_at
                     RETURNING {ATTESTATION_COLUMNS}, created_at = ?5"
                ),
                params![
                    repository.id,
                    attestation.code_hash,
                    attestation.label.as_str(),
                    attestation.attested_by,
                    now
                ],
                |row| Ok((row_to_attestation(row)?, row.get::<_, bool>(7)?)),
            )
            .context("failed to upsert attestation")?;

        Ok(if created {
            Upserted::Created(row)
        } else {
            Upserted::Updated(row)
        })
    }

    fn attestation(
        &self,
        repository_id: i64,
        code_hash: &str,
    ) -> anyhow::Result<Option<CodeAttestation>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {ATTESTATION_COLUMNS} FROM code_attestations
                 WHERE repository_id = ?1 AND code_hash = ?2"
            ),
            params![repository_id, code_hash],
            row_to_attestation,
        )
        .optional()
        .context("failed to look up attestation")
    }

    fn chunks_with_hash(
        &self,
        organization_id: i64,
        code_hash: &str,
    ) -> anyhow::Result<Vec<CodeChunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHUNK_COLUMNS}
             FROM chunks ch
             JOIN files f ON f.id = ch.file_id
             JOIN commits c ON c.id = f.commit_id
             JOIN repositories r ON r.id = c.repository_id
             LEFT JOIN code_attestations a ON a.id = ch.attestation_id
             WHERE r.organization_id = ?1 AND ch.code_hash = ?2
             ORDER BY ch.id"
        ))?;
        let rows = stmt.query_map(params![organization_id, code_hash], row_to_chunk)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load chunks")
    }

    fn assign_attestation(
        &self,
        attestation_id: i64,
        chunk_ids: &[i64],
        attested_at: DateTime<Utc>,
    ) -> anyhow::Result<AttestedTargets> {
        if chunk_ids.is_empty() {
            return Ok(AttestedTargets::default());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let at = Value::Text(format_ts(attested_at));

        set_where_ids(
            &tx,
            "chunks",
            "attestation_id = ?1",
            Value::Integer(attestation_id),
            chunk_ids,
        )
        .context("failed to assign attestation to chunks")?;

        let file_ids = distinct_ids(&tx, "file_id", "chunks", "id", chunk_ids)?;
        let commit_ids = distinct_ids(&tx, "commit_id", "files", "id", &file_ids)?;

        let pull_request_ids: Vec<i64> = if commit_ids.is_empty() {
            Vec::new()
        } else {
            let sql = format!(
                "SELECT DISTINCT pr.id FROM pull_requests pr
                 JOIN commits c
                   ON c.repository_id = pr.repository_id AND c.sha = pr.head_commit_sha
                 WHERE c.id IN ({})
                 ORDER BY pr.id",
                placeholders(1, commit_ids.len())
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(id_values(&commit_ids)), |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        set_where_ids(&tx, "files", "last_attested_at = ?1", at.clone(), &file_ids)?;
        set_where_ids(&tx, "commits", "last_attested_at = ?1", at.clone(), &commit_ids)?;
        set_where_ids(&tx, "pull_requests", "last_attested_at = ?1", at, &pull_request_ids)?;

        tx.commit().context("failed to commit attestation broadcast")?;

        Ok(AttestedTargets {
            chunk_ids: chunk_ids.to_vec(),
            file_ids,
            commit_ids,
            pull_request_ids,
        })
    }

    fn mark_needs_recalculation(&self, commit_ids: &[i64]) -> anyhow::Result<()> {
        let conn = self.conn()?;
        set_where_ids(
            &conn,
            "commits",
            "needs_composition_recalculation = ?1",
            Value::Integer(1),
            commit_ids,
        )
        .context("failed to flag commits for recalculation")?;
        Ok(())
    }

    fn pull_request(
        &self,
        repository_id: i64,
        pr_number: i64,
    ) -> anyhow::Result<Option<PullRequest>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, repository_id, pr_number, head_commit_sha, last_attested_at
             FROM pull_requests WHERE repository_id = ?1 AND pr_number = ?2",
            params![repository_id, pr_number],
            row_to_pull_request,
        )
        .optional()
        .context("failed to look up pull request")
    }

    fn upsert_pull_request(
        &self,
        repository_id: i64,
        pr_number: i64,
        head_commit_sha: &str,
    ) -> anyhow::Result<PullRequest> {
        let conn = self.conn()?;
        conn.query_row(
            "INSERT INTO pull_requests (repository_id, pr_number, head_commit_sha)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (repository_id, pr_number)
             DO UPDATE SET head_commit_sha = excluded.head_commit_sha
             RETURNING id, repository_id, pr_number, head_commit_sha, last_attested_at",
            params![repository_id, pr_number, head_commit_sha],
            row_to_pull_request,
        )
        .context("failed to upsert pull request")
    }
}

// =============================================================================
// INGESTION
// =============================================================================

impl SqliteStore {
    /// Create an organization
    pub fn create_organization(&self, name: &str) -> anyhow::Result<Organization> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO organizations (name) VALUES (?1)", params![name])?;
        Ok(Organization {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    /// Connect a repository to an organization
    pub fn create_repository(
        &self,
        organization_id: i64,
        public_id: &str,
        full_name: &str,
    ) -> anyhow::Result<Repository> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO repositories (public_id, full_name, organization_id) VALUES (?1, ?2, ?3)",
            params![public_id, full_name, organization_id],
        )
        .with_context(|| format!("failed to create repository {full_name}"))?;
        Ok(Repository {
            id: conn.last_insert_rowid(),
            public_id: public_id.to_string(),
            full_name: full_name.to_string(),
            organization_id,
        })
    }

    /// Get or create a commit
    pub fn insert_commit(&self, repository_id: i64, sha: &str) -> anyhow::Result<Commit> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "INSERT INTO commits (repository_id, sha) VALUES (?1, ?2)
                 ON CONFLICT (repository_id, sha) DO UPDATE SET sha = excluded.sha
                 RETURNING {COMMIT_COLUMNS}"
            ),
            params![repository_id, sha],
            row_to_commit,
        )
        .context("failed to insert commit")
    }

    /// Get or create a file within a commit
    pub fn insert_file(&self, commit_id: i64, file_path: &str) -> anyhow::Result<RepositoryFile> {
        let conn = self.conn()?;
        conn.query_row(
            "INSERT INTO files (commit_id, file_path) VALUES (?1, ?2)
             ON CONFLICT (commit_id, file_path) DO UPDATE SET file_path = excluded.file_path
             RETURNING id, commit_id, file_path, last_attested_at",
            params![commit_id, file_path],
            |row| {
                Ok(RepositoryFile {
                    id: row.get(0)?,
                    commit_id: row.get(1)?,
                    file_path: row.get(2)?,
                    last_attested_at: parse_opt_ts(3, row.get(3)?)?,
                })
            },
        )
        .context("failed to insert file")
    }

    /// Insert a chunk.
    ///
    /// The hash is stored in canonical form. If the organization already
    /// attested this hash, the newest such attestation is applied right away.
    pub fn insert_chunk(&self, chunk: &NewChunk) -> anyhow::Result<CodeChunk> {
        if chunk.code_line_start == 0 || chunk.code_line_end < chunk.code_line_start {
            anyhow::bail!(
                "invalid chunk line range {}-{}",
                chunk.code_line_start,
                chunk.code_line_end
            );
        }
        let code_hash = normalize_code_hash(&chunk.code_hash);

        let conn = self.conn()?;
        let existing: Option<i64> = conn
            .query_row(
                "SELECT a.id FROM code_attestations a
                 JOIN repositories ar ON ar.id = a.repository_id
                 WHERE a.code_hash = ?1 AND ar.organization_id = (
                     SELECT r.organization_id FROM files f
                     JOIN commits c ON c.id = f.commit_id
                     JOIN repositories r ON r.id = c.repository_id
                     WHERE f.id = ?2
                 )
                 ORDER BY a.updated_at DESC, a.id DESC LIMIT 1",
                params![code_hash, chunk.file_id],
                |row| row.get(0),
            )
            .optional()?;

        conn.execute(
            "INSERT INTO chunks
                (file_id, code_hash, code_line_start, code_line_end, label, attestation_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                chunk.file_id,
                code_hash,
                chunk.code_line_start,
                chunk.code_line_end,
                chunk.label.map(CodeLabel::as_str),
                existing
            ],
        )
        .context("failed to insert chunk")?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.chunk(id)?.context("inserted chunk could not be read back")
    }

    /// Get a chunk by id
    pub fn chunk(&self, id: i64) -> anyhow::Result<Option<CodeChunk>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {CHUNK_COLUMNS} FROM chunks ch
                 LEFT JOIN code_attestations a ON a.id = ch.attestation_id
                 WHERE ch.id = ?1"
            ),
            params![id],
            row_to_chunk,
        )
        .optional()
        .context("failed to look up chunk")
    }

    /// Get a file by id
    pub fn file(&self, id: i64) -> anyhow::Result<Option<RepositoryFile>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, commit_id, file_path, last_attested_at FROM files WHERE id = ?1",
            params![id],
            |row| {
                Ok(RepositoryFile {
                    id: row.get(0)?,
                    commit_id: row.get(1)?,
                    file_path: row.get(2)?,
                    last_attested_at: parse_opt_ts(3, row.get(3)?)?,
                })
            },
        )
        .optional()
        .context("failed to look up file")
    }

    /// Get a commit by id
    pub fn commit(&self, id: i64) -> anyhow::Result<Option<Commit>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {COMMIT_COLUMNS} FROM commits WHERE id = ?1"),
            params![id],
            row_to_commit,
        )
        .optional()
        .context("failed to look up commit")
    }

    /// Number of attestations stored for (repository, hash)
    pub fn attestation_count(&self, repository_id: i64, code_hash: &str) -> anyhow::Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM code_attestations WHERE repository_id = ?1 AND code_hash = ?2",
            params![repository_id, code_hash],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(n).unwrap_or_default())
    }
}
