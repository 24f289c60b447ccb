use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::court::CourtGeometry;
use crate::error::{AppError, Result};
use crate::state::event_log::EventLog;
use crate::stats::aggregator::MetricEntry;
use crate::stats::{compute_stats, project, Heatmap, MatchReport, StatsTarget, TeamStats};
use crate::types::{
    format_clock, normalize_number, number_sort_key, Context, MatchInfo, NewShot, Outcome,
    PenaltyKind, Period, Player, Position, ShotEvent, Suspension, Team, ZoneId,
};

const OPPONENT_DEFAULT_NAME: &str = "Opponent player";

// ---------------------------------------------------------------------------
// MatchClock
// ---------------------------------------------------------------------------

/// Stopwatch with pause. Time is always read against a caller-supplied `now`.
#[derive(Debug, Clone, Default)]
pub struct MatchClock {
    running_since: Option<Instant>,
    banked: Duration,
}

impl MatchClock {
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.banked + now.saturating_duration_since(since),
            None => self.banked,
        }
    }

    /// Starts or stops the clock; returns whether it is running afterwards.
    pub fn toggle(&mut self, now: Instant) -> bool {
        match self.running_since.take() {
            Some(since) => {
                self.banked += now.saturating_duration_since(since);
                false
            }
            None => {
                self.running_since = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.running_since = None;
        self.banked = Duration::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ClockView {
    pub elapsed_secs: f64,
    pub label: String,
    pub running: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuspensionView {
    pub team: Team,
    pub player: String,
    pub remaining_secs: f64,
    pub remaining_label: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActiveGoalkeepers {
    pub ally: Option<String>,
    pub opponent: Option<String>,
}

impl ActiveGoalkeepers {
    fn slot(&mut self, team: Team) -> &mut Option<String> {
        match team {
            Team::Ally => &mut self.ally,
            Team::Opponent => &mut self.opponent,
        }
    }

    pub fn get(&self, team: Team) -> Option<&str> {
        match team {
            Team::Ally => self.ally.as_deref(),
            Team::Opponent => self.opponent.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub info: MatchInfo,
    pub clock: ClockView,
    pub period: Period,
    pub selected_zone: Option<ZoneId>,
    pub selected_label: Option<String>,
    pub allowed_contexts: Vec<Context>,
    pub active_goalkeepers: ActiveGoalkeepers,
    pub suspensions: Vec<SuspensionView>,
    pub event_count: usize,
    pub unarchived: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub team: Team,
    pub target: StatsTarget,
    pub stats: TeamStats,
    pub entries: Vec<MetricEntry>,
}

/// Operator's confirmation of an event for the currently selected zone.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordRequest {
    pub team: Team,
    pub player: String,
    pub outcome: Outcome,
    pub context: Context,
}

/// Events not yet in the archive, tagged with the log generation they came from.
#[derive(Debug, Clone)]
pub struct ArchiveBatch {
    pub info: MatchInfo,
    pub generation: u64,
    pub events: Vec<ShotEvent>,
}

// ---------------------------------------------------------------------------
// MatchSession
// ---------------------------------------------------------------------------

/// Everything the operator mutates during one match. Handlers get it by
/// reference; the geometry and stats functions it calls only see plain data.
pub struct MatchSession {
    info: MatchInfo,
    geometry: CourtGeometry,
    clock: MatchClock,
    period: Period,
    ally_roster: Vec<Player>,
    opponent_roster: Vec<Player>,
    keepers: ActiveGoalkeepers,
    suspensions: Vec<Suspension>,
    selected_zone: Option<ZoneId>,
    log: EventLog,
}

impl MatchSession {
    pub fn new(info: MatchInfo) -> Self {
        Self {
            info,
            geometry: CourtGeometry::new(),
            clock: MatchClock::default(),
            period: Period::First,
            ally_roster: Vec::new(),
            opponent_roster: Vec::new(),
            keepers: ActiveGoalkeepers::default(),
            suspensions: Vec::new(),
            selected_zone: None,
            log: EventLog::new(),
        }
    }

    pub fn info(&self) -> &MatchInfo {
        &self.info
    }

    pub fn update_info(&mut self, info: MatchInfo) {
        info!(title = %info.title, date = %info.date, "Match info updated");
        self.info = info;
    }

    pub fn geometry(&self) -> &CourtGeometry {
        &self.geometry
    }

    // --- clock -------------------------------------------------------------

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        self.clock.elapsed(now).as_secs_f64()
    }

    pub fn clock_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn toggle_clock(&mut self, now: Instant) -> bool {
        let running = self.clock.toggle(now);
        info!(running, clock = %format_clock(self.elapsed_secs(now)), "Match clock toggled");
        running
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn set_period(&mut self, period: Period) {
        self.period = period;
    }

    // --- rosters -----------------------------------------------------------

    fn roster_mut(&mut self, team: Team) -> &mut Vec<Player> {
        match team {
            Team::Ally => &mut self.ally_roster,
            Team::Opponent => &mut self.opponent_roster,
        }
    }

    fn roster_ref(&self, team: Team) -> &[Player] {
        match team {
            Team::Ally => &self.ally_roster,
            Team::Opponent => &self.opponent_roster,
        }
    }

    /// Roster in shirt-number order.
    pub fn roster(&self, team: Team) -> Vec<Player> {
        let mut players = self.roster_ref(team).to_vec();
        players.sort_by_key(|p| number_sort_key(&p.number));
        players
    }

    pub fn register_player(
        &mut self,
        team: Team,
        number: &str,
        name: &str,
        position: Position,
    ) -> Result<Player> {
        let number = normalize_number(number);
        if number.is_empty() {
            return Err(AppError::InvalidInput("player number is required".to_string()));
        }
        let name = match name.trim() {
            "" if team == Team::Opponent => OPPONENT_DEFAULT_NAME.to_string(),
            n => n.to_string(),
        };
        if self.roster_ref(team).iter().any(|p| p.number == number) {
            warn!(team = %team, number = %number, "Registering a duplicate shirt number");
        }
        let player = Player {
            number,
            name,
            position,
            warnings: String::new(),
            suspensions: String::new(),
            disqualifications: String::new(),
        };
        info!(team = %team, number = %player.number, position = ?player.position, "Player registered");
        self.roster_mut(team).push(player.clone());
        Ok(player)
    }

    /// Replaces the roster entry for `number` with an edited copy.
    pub fn update_player(&mut self, team: Team, number: &str, mut updated: Player) -> Result<Player> {
        let number = normalize_number(number);
        updated.number = normalize_number(&updated.number);
        if updated.number.is_empty() {
            return Err(AppError::InvalidInput("player number is required".to_string()));
        }
        let slot = self
            .roster_mut(team)
            .iter_mut()
            .find(|p| p.number == number)
            .ok_or_else(|| AppError::NotFound(format!("{team} player {number}")))?;
        *slot = updated.clone();

        let still_keeper = updated.is_goalkeeper() && updated.number == number;
        if self.keepers.get(team) == Some(number.as_str()) && !still_keeper {
            warn!(team = %team, number = %number, "Active goalkeeper edited away, clearing selection");
            *self.keepers.slot(team) = None;
        }
        Ok(updated)
    }

    pub fn remove_player(&mut self, team: Team, number: &str) -> Result<Player> {
        let number = normalize_number(number);
        let roster = self.roster_mut(team);
        let idx = roster
            .iter()
            .position(|p| p.number == number)
            .ok_or_else(|| AppError::NotFound(format!("{team} player {number}")))?;
        let removed = roster.remove(idx);
        if self.keepers.get(team) == Some(number.as_str()) {
            *self.keepers.slot(team) = None;
        }
        info!(team = %team, number = %number, "Player removed");
        Ok(removed)
    }

    // --- goalkeepers -------------------------------------------------------

    pub fn active_goalkeeper(&self, team: Team) -> Option<&str> {
        self.keepers.get(team)
    }

    /// Sets the keeper currently on court. `None` clears the selection.
    pub fn set_active_goalkeeper(&mut self, team: Team, number: Option<&str>) -> Result<()> {
        let number = number.map(normalize_number).filter(|n| !n.is_empty());
        if let Some(n) = &number {
            let is_keeper = self
                .roster_ref(team)
                .iter()
                .any(|p| &p.number == n && p.is_goalkeeper());
            if !is_keeper {
                return Err(AppError::InvalidInput(format!(
                    "{team} player {n} is not a registered goalkeeper"
                )));
            }
        }
        info!(team = %team, keeper = ?number, "Active goalkeeper set");
        *self.keepers.slot(team) = number;
        Ok(())
    }

    // --- penalties ---------------------------------------------------------

    /// Appends `"<period> MM:SS"` to the player's history for `kind`; two-minute
    /// and disqualification penalties also start a suspension.
    pub fn register_penalty(
        &mut self,
        team: Team,
        number: &str,
        kind: PenaltyKind,
        now: Instant,
    ) -> Result<()> {
        let number = normalize_number(number);
        let elapsed = self.elapsed_secs(now);
        let label = format!("{} {}", self.period, format_clock(elapsed));

        let player = self
            .roster_mut(team)
            .iter_mut()
            .find(|p| p.number == number)
            .ok_or_else(|| AppError::NotFound(format!("{team} player {number}")))?;
        let history = player.penalty_history_mut(kind);
        if history.is_empty() {
            *history = label.clone();
        } else {
            history.push_str(", ");
            history.push_str(&label);
        }

        if kind.starts_suspension() {
            self.suspensions.push(Suspension {
                team,
                player: number.clone(),
                started_at_secs: elapsed,
            });
        }
        info!(team = %team, number = %number, kind = %kind, at = %label, "Penalty registered");
        Ok(())
    }

    pub fn active_suspensions(&self, now: Instant) -> Vec<SuspensionView> {
        let elapsed = self.elapsed_secs(now);
        self.suspensions
            .iter()
            .filter(|s| s.is_active(elapsed))
            .map(|s| {
                let remaining = s.remaining_secs(elapsed);
                SuspensionView {
                    team: s.team,
                    player: s.player.clone(),
                    remaining_secs: remaining,
                    remaining_label: format_clock(remaining),
                }
            })
            .collect()
    }

    /// Drops served suspensions and returns them.
    pub fn prune_suspensions(&mut self, now: Instant) -> Vec<Suspension> {
        let elapsed = self.elapsed_secs(now);
        let (active, served): (Vec<_>, Vec<_>) = std::mem::take(&mut self.suspensions)
            .into_iter()
            .partition(|s| s.is_active(elapsed));
        self.suspensions = active;
        served
    }

    pub fn has_active_suspensions(&self, now: Instant) -> bool {
        let elapsed = self.elapsed_secs(now);
        self.suspensions.iter().any(|s| s.is_active(elapsed))
    }

    // --- zone selection ----------------------------------------------------

    /// Classifies a court-space click. A miss leaves the previous selection in place.
    pub fn select_zone_at(&mut self, x: f64, y: f64) -> Option<ZoneId> {
        if let Some(zone) = self.geometry.classify(x, y) {
            self.selected_zone = Some(zone);
        }
        self.selected_zone
    }

    pub fn select_zone(&mut self, zone: ZoneId) {
        self.selected_zone = Some(zone);
    }

    pub fn selected_zone(&self) -> Option<ZoneId> {
        self.selected_zone
    }

    // --- recording ---------------------------------------------------------

    pub fn record(&mut self, req: RecordRequest, now: Instant) -> Result<ShotEvent> {
        let zone = self
            .selected_zone
            .ok_or_else(|| AppError::InvalidInput("select a zone before recording".to_string()))?;
        let player = normalize_number(&req.player);
        if !self.roster_ref(req.team).iter().any(|p| p.number == player) {
            return Err(AppError::InvalidInput(format!(
                "{} player {player} is not registered",
                req.team
            )));
        }
        if !zone.allowed_contexts().contains(&req.context) {
            return Err(AppError::InvalidInput(format!(
                "context {} is not allowed in zone {}",
                req.context,
                zone.label()
            )));
        }

        let shot = NewShot {
            team: req.team,
            player,
            zone,
            outcome: req.outcome,
            context: req.context,
            period: self.period,
            opposing_goalkeeper: self.keepers.get(req.team.other()).map(str::to_string),
            time_label: format_clock(self.elapsed_secs(now)),
        };
        let event = self.log.append(shot).clone();
        info!(
            id = event.id,
            team = %event.team,
            player = %event.player,
            zone = %event.zone,
            outcome = %event.outcome,
            context = %event.context,
            "Event recorded"
        );
        Ok(event)
    }

    pub fn events(&self) -> &[ShotEvent] {
        self.log.events()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    // --- archive -----------------------------------------------------------

    pub fn archive_batch(&self) -> ArchiveBatch {
        ArchiveBatch {
            info: self.info.clone(),
            generation: self.log.generation(),
            events: self.log.unarchived().to_vec(),
        }
    }

    pub fn mark_archived(&mut self, generation: u64, count: usize) -> bool {
        self.log.mark_archived(generation, count)
    }

    /// Next match: clears the log, archive cursor, clock and running suspensions.
    /// Rosters, keepers and match info stay.
    pub fn reset(&mut self) {
        let dropped = self.log.len();
        self.log.clear();
        self.clock.reset();
        self.suspensions.clear();
        self.selected_zone = None;
        info!(dropped, "Session reset");
    }

    // --- derived views -----------------------------------------------------

    pub fn report(&self) -> MatchReport {
        MatchReport::build(self.log.events())
    }

    pub fn stats(&self, team: Team, player: Option<&str>) -> StatsView {
        let target = StatsTarget::resolve(player, self.roster_ref(team));
        let events = self.log.events();
        let stats = compute_stats(events, team, events, &target);
        let entries = stats.entries(!matches!(target, StatsTarget::Player(_)));
        StatsView { team, target, stats, entries }
    }

    pub fn heatmap(&self, team: Team) -> Heatmap {
        project(&self.geometry, team, self.log.events())
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        let elapsed = self.elapsed_secs(now);
        SessionSnapshot {
            info: self.info.clone(),
            clock: ClockView {
                elapsed_secs: elapsed,
                label: format_clock(elapsed),
                running: self.clock.is_running(),
            },
            period: self.period,
            selected_zone: self.selected_zone,
            selected_label: self.selected_zone.map(ZoneId::label),
            allowed_contexts: self
                .selected_zone
                .map(|z| z.allowed_contexts().to_vec())
                .unwrap_or_default(),
            active_goalkeepers: self.keepers.clone(),
            suspensions: self.active_suspensions(now),
            event_count: self.log.len(),
            unarchived: self.log.unarchived().len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
