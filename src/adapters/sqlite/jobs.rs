//! Persistent job queue

use anyhow::Context as _;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::core::models::{Job, JobKind, QueuedJob};
use crate::core::ports::JobQueue;

use super::{SqliteStore, format_ts, placeholders};

impl JobQueue for SqliteStore {
    fn enqueue(&self, job: &Job) -> anyhow::Result<i64> {
        let payload = serde_json::to_string(job)?;
        let now = format_ts(Utc::now());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO jobs (kind, payload, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![job.kind().as_str(), payload, now],
        )
        .context("failed to enqueue job")?;
        Ok(conn.last_insert_rowid())
    }

    fn claim(&self, kinds: &[JobKind]) -> anyhow::Result<Option<QueuedJob>> {
        if kinds.is_empty() {
            return Ok(None);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let sql = format!(
            "SELECT id, payload, attempts FROM jobs
             WHERE status = 'pending' AND kind IN ({})
             ORDER BY id LIMIT 1",
            placeholders(1, kinds.len())
        );
        let kind_values = kinds.iter().map(|k| Value::Text(k.as_str().to_string()));
        let row: Option<(i64, String, u32)> = tx
            .query_row(&sql, params_from_iter(kind_values), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .optional()?;

        let Some((id, payload, attempts)) = row else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE jobs SET status = 'running', attempts = attempts + 1, updated_at = ?1
             WHERE id = ?2",
            params![format_ts(Utc::now()), id],
        )?;
        tx.commit().context("failed to claim job")?;

        let job: Job = serde_json::from_str(&payload)
            .with_context(|| format!("job {id} has an unreadable payload"))?;

        Ok(Some(QueuedJob { id, job, attempts }))
    }

    fn complete(&self, id: i64) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE jobs SET status = 'done', updated_at = ?1 WHERE id = ?2",
            params![format_ts(Utc::now()), id],
        )
        .context("failed to complete job")?;
        Ok(())
    }

    fn fail(&self, id: i64, error: &str) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE jobs SET status = 'failed', last_error = ?1, updated_at = ?2 WHERE id = ?3",
            params![error, format_ts(Utc::now()), id],
        )
        .context("failed to mark job failed")?;
        Ok(())
    }

    fn pending(&self, kind: JobKind) -> anyhow::Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = 'pending' AND kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(n).unwrap_or_default())
    }
}
