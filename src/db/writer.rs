use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use crate::db::models::code;
use crate::error::Result;
use crate::state::match_session::ArchiveBatch;

/// One sync request from the API. The reply carries how many events were stored
/// so the caller can advance its archive cursor only on success.
pub struct ArchiveRequest {
    pub batch: ArchiveBatch,
    pub reply: oneshot::Sender<Result<usize>>,
}

/// Receives archive batches and persists them to SQLite.
/// Runs as a dedicated background task so HTTP handlers never hold the session
/// lock across a database round trip.
pub struct ArchiveWriter {
    pool: sqlx::SqlitePool,
    rx: mpsc::Receiver<ArchiveRequest>,
}

impl ArchiveWriter {
    pub fn new(pool: sqlx::SqlitePool, rx: mpsc::Receiver<ArchiveRequest>) -> Self {
        Self { pool, rx }
    }

    pub async fn run(mut self) {
        while let Some(req) = self.rx.recv().await {
            let result = write_batch(&self.pool, &req.batch).await;
            if let Err(e) = &result {
                error!("Archive write error: {e}");
            }
            // The requester may have timed out; nothing to do then.
            let _ = req.reply.send(result);
        }
    }
}

/// Appends the batch under its match label in one transaction.
pub async fn write_batch(pool: &sqlx::SqlitePool, batch: &ArchiveBatch) -> Result<usize> {
    if batch.events.is_empty() {
        return Ok(0);
    }
    let label = batch.info.archive_label();
    let created_at = chrono::Utc::now().timestamp();

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO matches (label, title, match_date, opponent, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&label)
    .bind(&batch.info.title)
    .bind(&batch.info.date)
    .bind(&batch.info.opponent_name)
    .bind(created_at)
    .execute(&mut *tx)
    .await?;

    for e in &batch.events {
        sqlx::query(
            r#"
            INSERT INTO events (
                match_label, time_label, team, player, zone,
                outcome, context, period, opposing_goalkeeper
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&label)
        .bind(&e.time_label)
        .bind(code(&e.team))
        .bind(&e.player)
        .bind(i64::from(e.zone.get()))
        .bind(code(&e.outcome))
        .bind(code(&e.context))
        .bind(code(&e.period))
        .bind(e.opposing_goalkeeper.as_deref())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(label = %label, events = batch.events.len(), "Archived events");
    Ok(batch.events.len())
}
