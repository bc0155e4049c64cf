//! Detection feedback

use anyhow::Context as _;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Row, params, params_from_iter};

use crate::core::models::{Feedback, FeedbackFilter, FeedbackStatus, NewFeedback};
use crate::core::ports::FeedbackRepository;

use super::{SqliteStore, format_ts, parse_enum, parse_ts};

const FEEDBACK_COLUMNS: &str =
    "id, user, file_path, code_line_start, code_line_end, status, vote, comment, created_at";

fn row_to_feedback(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    let status: String = row.get(5)?;
    let vote: String = row.get(6)?;
    let created_at: String = row.get(8)?;
    Ok(Feedback {
        id: row.get(0)?,
        user: row.get(1)?,
        file_path: row.get(2)?,
        code_line_start: row.get(3)?,
        code_line_end: row.get(4)?,
        status: parse_enum(5, &status)?,
        vote: parse_enum(6, &vote)?,
        comment: row.get(7)?,
        created_at: parse_ts(8, &created_at)?,
    })
}

impl FeedbackRepository for SqliteStore {
    fn create(&self, feedback: &NewFeedback) -> anyhow::Result<Feedback> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "INSERT INTO feedback
                    (user, file_path, code_line_start, code_line_end, status, vote, comment,
                     created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING {FEEDBACK_COLUMNS}"
            ),
            params![
                feedback.user,
                feedback.file_path,
                feedback.code_line_start,
                feedback.code_line_end,
                FeedbackStatus::default().as_str(),
                feedback.vote.as_str(),
                feedback.comment,
                format_ts(Utc::now())
            ],
            row_to_feedback,
        )
        .context("failed to save feedback")
    }

    fn list(&self, filter: FeedbackFilter) -> anyhow::Result<Vec<Feedback>> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(vote) = filter.vote {
            values.push(Value::Text(vote.as_str().to_string()));
            clauses.push(format!("vote = ?{}", values.len()));
        }
        if let Some(status) = filter.status {
            values.push(Value::Text(status.as_str().to_string()));
            clauses.push(format!("status = ?{}", values.len()));
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback {where_clause}
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params_from_iter(values), row_to_feedback)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to list feedback")
    }
}
