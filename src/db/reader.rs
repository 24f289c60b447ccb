use std::collections::HashMap;

use tracing::info;

use crate::db::models::{EventRow, MatchRow};
use crate::error::Result;
use crate::state::ArchivedMatch;

/// Reads every archived match with its events, in insertion order.
pub async fn load_all(pool: &sqlx::SqlitePool) -> Result<Vec<ArchivedMatch>> {
    let matches: Vec<MatchRow> = sqlx::query_as(
        "SELECT label, title, match_date, opponent, created_at FROM matches ORDER BY created_at, label",
    )
    .fetch_all(pool)
    .await?;

    let rows: Vec<EventRow> = sqlx::query_as(
        r#"
        SELECT id, match_label, time_label, team, player, zone,
               outcome, context, period, opposing_goalkeeper
        FROM events
        ORDER BY match_label, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_label: HashMap<String, ArchivedMatch> = matches
        .into_iter()
        .map(|m| {
            let archived = ArchivedMatch {
                label: m.label.clone(),
                title: m.title,
                date: m.match_date,
                opponent: m.opponent,
                events: Vec::new(),
            };
            (m.label, archived)
        })
        .collect();

    let mut skipped = 0usize;
    for row in rows {
        let Some(m) = by_label.get_mut(&row.match_label) else {
            skipped += 1;
            continue;
        };
        let next_id = m.events.len() as u64;
        match row.into_event(next_id) {
            Some(event) => m.events.push(event),
            None => skipped += 1,
        }
    }

    let mut out: Vec<ArchivedMatch> = by_label.into_values().collect();
    out.sort_by(|a, b| a.label.cmp(&b.label));
    info!(matches = out.len(), skipped, "Archive loaded");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::writer::{write_batch, ArchiveRequest, ArchiveWriter};
    use crate::state::match_session::ArchiveBatch;
    use crate::stats::MatchReport;
    use crate::types::{Context, MatchInfo, Outcome, Period, ShotEvent, Team, ZoneId};
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::{mpsc, oneshot};

    async fn pool() -> sqlx::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn info() -> MatchInfo {
        MatchInfo {
            title: "League R4".to_string(),
            date: "2026-10-19".to_string(),
            ally_name: "Us".to_string(),
            opponent_name: "Harbor".to_string(),
        }
    }

    fn event(id: u64, team: Team, zone: u8, outcome: Outcome, context: Context) -> ShotEvent {
        ShotEvent {
            id,
            team,
            player: "8".to_string(),
            zone: ZoneId::new(zone).unwrap(),
            outcome,
            context,
            period: Period::First,
            opposing_goalkeeper: Some("1".to_string()),
            time_label: "10:00".to_string(),
        }
    }

    fn batch(events: Vec<ShotEvent>) -> ArchiveBatch {
        ArchiveBatch { info: info(), generation: 0, events }
    }

    #[tokio::test]
    async fn sync_is_incremental_and_replays_identically() {
        let pool = pool().await;
        let first = vec![
            event(0, Team::Ally, 3, Outcome::Goal, Context::SetOffense),
            event(1, Team::Opponent, 9, Outcome::Saved, Context::SevenMeter),
        ];
        let second = vec![event(2, Team::Ally, 7, Outcome::OffTarget, Context::FastBreak)];

        assert_eq!(write_batch(&pool, &batch(first.clone())).await.unwrap(), 2);
        assert_eq!(write_batch(&pool, &batch(second.clone())).await.unwrap(), 1);

        let loaded = load_all(&pool).await.unwrap();
        assert_eq!(loaded.len(), 1);
        let m = &loaded[0];
        assert_eq!(m.label, "2026-10-19 | League R4 (vs Harbor)");
        assert_eq!(m.opponent, "Harbor");

        let live: Vec<ShotEvent> = first.into_iter().chain(second).collect();
        assert_eq!(m.events, live);
        let a = serde_json::to_value(MatchReport::build(&m.events)).unwrap();
        let b = serde_json::to_value(MatchReport::build(&live)).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let pool = pool().await;
        assert_eq!(write_batch(&pool, &batch(Vec::new())).await.unwrap(), 0);
        assert!(load_all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped_on_load() {
        let pool = pool().await;
        write_batch(&pool, &batch(vec![event(0, Team::Ally, 2, Outcome::Goal, Context::SetOffense)]))
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO events (match_label, time_label, team, player, zone, outcome, context, period) \
             VALUES (?, '00:10', 'ally', '5', 42, 'G', 'Set', 'first')",
        )
        .bind(info().archive_label())
        .execute(&pool)
        .await
        .unwrap();

        let loaded = load_all(&pool).await.unwrap();
        assert_eq!(loaded[0].events.len(), 1);
    }

    #[tokio::test]
    async fn writer_task_replies_with_count() {
        let pool = pool().await;
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(ArchiveWriter::new(pool.clone(), rx).run());

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(ArchiveRequest {
            batch: batch(vec![event(0, Team::Ally, 4, Outcome::Goal, Context::SetOffense)]),
            reply: reply_tx,
        })
        .await
        .unwrap();
        assert_eq!(reply_rx.await.unwrap().unwrap(), 1);
        assert_eq!(load_all(&pool).await.unwrap()[0].events.len(), 1);
    }
}
