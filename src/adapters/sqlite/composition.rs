//! Composition reads and writes

use anyhow::Context as _;
use rusqlite::{OptionalExtension, params};

use crate::core::models::{CodeLabel, Commit, Composition};
use crate::core::ports::CompositionStore;

use super::SqliteStore;
use super::code::{COMMIT_COLUMNS, row_to_commit};

impl CompositionStore for SqliteStore {
    fn commit_line_counts(&self, commit_id: i64) -> anyhow::Result<Vec<(Option<CodeLabel>, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT COALESCE(a.label, ch.label),
                    ch.code_line_end - ch.code_line_start + 1
             FROM chunks ch
             JOIN files f ON f.id = ch.file_id
             LEFT JOIN code_attestations a ON a.id = ch.attestation_id
             WHERE f.commit_id = ?1
             ORDER BY ch.id",
        )?;
        let rows = stmt.query_map(params![commit_id], |row| {
            let label = super::parse_opt_label(0, row.get(0)?)?;
            let lines: i64 = row.get(1)?;
            Ok((label, u64::try_from(lines).unwrap_or(0)))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load chunk line counts")
    }

    fn save_composition(&self, commit_id: i64, composition: &Composition) -> anyhow::Result<()> {
        let json = serde_json::to_string(composition)?;
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE commits SET ai_composition = ?1, needs_composition_recalculation = 0
                 WHERE id = ?2",
                params![json, commit_id],
            )
            .context("failed to save composition")?;
        if updated == 0 {
            anyhow::bail!("commit {commit_id} not found");
        }
        Ok(())
    }

    fn commit_by_sha(&self, repository_id: i64, sha: &str) -> anyhow::Result<Option<Commit>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {COMMIT_COLUMNS} FROM commits WHERE repository_id = ?1 AND sha = ?2"),
            params![repository_id, sha],
            row_to_commit,
        )
        .optional()
        .context("failed to look up commit")
    }
}
