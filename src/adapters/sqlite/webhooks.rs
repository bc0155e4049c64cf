//! Webhook request records

use anyhow::Context as _;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use crate::core::models::{NewWebhookRequest, WebhookRequest};
use crate::core::ports::WebhookRequestRepository;

use super::{SqliteStore, format_ts, parse_ts};

fn row_to_request(row: &Row<'_>) -> rusqlite::Result<WebhookRequest> {
    let created_at: String = row.get(6)?;
    Ok(WebhookRequest {
        id: row.get(0)?,
        provider: row.get(1)?,
        integration: row.get(2)?,
        data_file_path: row.get(3)?,
        response_status_code: row.get(4)?,
        response_message: row.get(5)?,
        created_at: parse_ts(6, &created_at)?,
    })
}

impl WebhookRequestRepository for SqliteStore {
    fn insert(&self, request: &NewWebhookRequest) -> anyhow::Result<WebhookRequest> {
        let conn = self.conn()?;
        conn.query_row(
            "INSERT INTO webhook_requests (provider, integration, data_file_path, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, provider, integration, data_file_path,
                       response_status_code, response_message, created_at",
            params![
                request.provider,
                request.integration,
                request.data_file_path,
                format_ts(Utc::now())
            ],
            row_to_request,
        )
        .context("failed to insert webhook request")
    }

    fn record_response(&self, id: i64, status: u16, message: &str) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE webhook_requests SET response_status_code = ?1, response_message = ?2
                 WHERE id = ?3",
                params![status, message, id],
            )
            .context("failed to record webhook response")?;
        if updated == 0 {
            anyhow::bail!("webhook request {id} not found");
        }
        Ok(())
    }

    fn get(&self, id: i64) -> anyhow::Result<Option<WebhookRequest>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, provider, integration, data_file_path,
                    response_status_code, response_message, created_at
             FROM webhook_requests WHERE id = ?1",
            params![id],
            row_to_request,
        )
        .optional()
        .context("failed to look up webhook request")
    }
}
