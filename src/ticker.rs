use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::health::{now_ms, HealthState};
use crate::config::SESSION_TICK_MS;
use crate::state::MatchSession;

/// Periodic housekeeping for the live session: drops served suspensions and
/// publishes clock and log counters to the health endpoint.
pub struct SessionTicker {
    session: Arc<Mutex<MatchSession>>,
    health: Arc<HealthState>,
}

impl SessionTicker {
    pub fn new(session: Arc<Mutex<MatchSession>>, health: Arc<HealthState>) -> Self {
        Self { session, health }
    }

    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_millis(SESSION_TICK_MS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.tick(Instant::now()).await;
        }
    }

    pub async fn tick(&self, now: Instant) {
        let mut session = self.session.lock().await;
        for served in session.prune_suspensions(now) {
            info!(team = %served.team, player = %served.player, "Suspension served");
        }
        let active = session.active_suspensions(now).len();
        self.health
            .record_tick(now_ms(), session.clock_running(), session.events().len(), active);
        debug!(active, events = session.events().len(), "Session tick");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchInfo, PenaltyKind, Position, Team};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn tick_prunes_served_suspensions_and_updates_health() {
        let mut session = MatchSession::new(MatchInfo {
            title: "T".to_string(),
            date: "2026-10-19".to_string(),
            ally_name: "Us".to_string(),
            opponent_name: "Them".to_string(),
        });
        let t0 = Instant::now();
        session.register_player(Team::Ally, "5", "Pivot", Position::PV).unwrap();
        session.toggle_clock(t0);
        session.register_penalty(Team::Ally, "5", PenaltyKind::TwoMinutes, t0).unwrap();

        let session = Arc::new(Mutex::new(session));
        let health = Arc::new(HealthState::new());
        let ticker = SessionTicker::new(Arc::clone(&session), Arc::clone(&health));

        ticker.tick(t0 + Duration::from_secs(60)).await;
        assert_eq!(health.active_suspensions.load(Ordering::Relaxed), 1);
        assert!(health.clock_running.load(Ordering::Relaxed));
        assert_eq!(health.snapshot().status, "ok");

        ticker.tick(t0 + Duration::from_secs(121)).await;
        assert_eq!(health.active_suspensions.load(Ordering::Relaxed), 0);
        assert!(!session.lock().await.has_active_suspensions(t0 + Duration::from_secs(121)));
    }
}
