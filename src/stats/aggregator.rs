//! Rate metrics derived from the event log.
//!
//! Everything here is a pure function of its inputs: the same event slice
//! always produces the same numbers, so callers recompute from scratch on every
//! refresh, live or archived alike.

use serde::Serialize;

use crate::types::{Context, Outcome, Period, Player, ShotEvent, Team};

/// Whose numbers to compute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum StatsTarget {
    Team,
    /// Offense restricted to one player.
    Player(String),
    /// Offense stays team-wide; save rates use only shots faced by this keeper.
    Goalkeeper(String),
}

impl StatsTarget {
    /// Resolves an optional player number against a roster. Blank or missing
    /// numbers fall back to the whole team; registered keepers become
    /// goalkeeper targets.
    pub fn resolve(number: Option<&str>, roster: &[Player]) -> Self {
        let Some(number) = number.map(str::trim).filter(|n| !n.is_empty()) else {
            return StatsTarget::Team;
        };
        let is_keeper = roster
            .iter()
            .any(|p| p.number == number && p.is_goalkeeper());
        if is_keeper {
            StatsTarget::Goalkeeper(number.to_string())
        } else {
            StatsTarget::Player(number.to_string())
        }
    }

    pub fn is_goalkeeper(&self) -> bool {
        matches!(self, StatsTarget::Goalkeeper(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamStats {
    #[serde(rename = "atk_suc")]
    pub attack_success: f64,
    #[serde(rename = "sht_suc")]
    pub shot_success: f64,
    #[serde(rename = "fb_suc")]
    pub fast_break_success: f64,
    #[serde(rename = "fb_sht_suc")]
    pub fast_break_shot_success: f64,
    #[serde(rename = "m7_cnt")]
    pub seven_meter_count: u32,
    #[serde(rename = "m7_sht_suc")]
    pub seven_meter_shot_success: f64,
    #[serde(rename = "tf")]
    pub turnovers: u32,
    #[serde(rename = "rtf")]
    pub regained_turnovers: u32,
    #[serde(rename = "sht_sav")]
    pub shot_save: f64,
    #[serde(rename = "fb_sav")]
    pub fast_break_save: f64,
    #[serde(rename = "m7_sav")]
    pub seven_meter_save: f64,
}

/// Percentage with one decimal, ties to even; 0.0 for an empty denominator.
pub fn rate(num: u32, den: u32) -> f64 {
    if den == 0 {
        return 0.0;
    }
    (f64::from(num) / f64::from(den) * 1000.0).round_ties_even() / 10.0
}

/// Counts over one bucket of events.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    events: u32,
    attempts: u32,
    goals: u32,
    saves: u32,
}

impl Tally {
    fn of<'a>(events: impl Iterator<Item = &'a ShotEvent>) -> Self {
        events.fold(Tally::default(), |mut t, e| {
            t.events += 1;
            if e.is_shot_attempt() {
                t.attempts += 1;
                match e.outcome {
                    Outcome::Goal => t.goals += 1,
                    Outcome::Saved => t.saves += 1,
                    _ => {}
                }
            }
            t
        })
    }

    fn save_rate(&self) -> f64 {
        rate(self.saves, self.attempts)
    }
}

pub fn compute_stats(
    logs_to_calc: &[ShotEvent],
    team: Team,
    all_logs: &[ShotEvent],
    target: &StatsTarget,
) -> TeamStats {
    let offense: Vec<&ShotEvent> = logs_to_calc
        .iter()
        .filter(|e| e.team == team)
        .filter(|e| match target {
            StatsTarget::Player(number) => &e.player == number,
            _ => true,
        })
        .collect();

    let field = Tally::of(offense.iter().copied().filter(|e| e.is_field()));
    let fast_break = Tally::of(
        offense
            .iter()
            .copied()
            .filter(|e| e.is_field() && e.context == Context::FastBreak),
    );
    let seven_meter = Tally::of(offense.iter().copied().filter(|e| e.is_seven_meter()));
    let turnovers = offense
        .iter()
        .filter(|e| e.outcome == Outcome::TurnedOver)
        .count() as u32;
    let regained_turnovers = offense
        .iter()
        .filter(|e| e.outcome == Outcome::RegainedTurnover)
        .count() as u32;

    let defense: Vec<&ShotEvent> = all_logs
        .iter()
        .filter(|e| e.team != team)
        .filter(|e| match target {
            StatsTarget::Goalkeeper(number) => e.opposing_goalkeeper.as_deref() == Some(number.as_str()),
            _ => true,
        })
        .collect();
    let faced_field = Tally::of(defense.iter().copied().filter(|e| e.is_field()));
    let faced_fast_break = Tally::of(
        defense
            .iter()
            .copied()
            .filter(|e| e.is_field() && e.context == Context::FastBreak),
    );
    let faced_seven_meter = Tally::of(defense.iter().copied().filter(|e| e.is_seven_meter()));

    TeamStats {
        attack_success: rate(field.attempts, field.events),
        shot_success: rate(field.goals, field.attempts),
        fast_break_success: rate(fast_break.attempts, fast_break.events),
        fast_break_shot_success: rate(fast_break.goals, fast_break.attempts),
        seven_meter_count: seven_meter.events,
        seven_meter_shot_success: rate(seven_meter.goals, seven_meter.attempts),
        turnovers,
        regained_turnovers,
        shot_save: faced_field.save_rate(),
        fast_break_save: faced_fast_break.save_rate(),
        seven_meter_save: faced_seven_meter.save_rate(),
    }
}

// ---------------------------------------------------------------------------
// Stat catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    AtkSuc,
    ShtSuc,
    FbSuc,
    FbShtSuc,
    M7Cnt,
    M7ShtSuc,
    Tf,
    Rtf,
    ShtSav,
    FbSav,
    M7Sav,
}

impl StatKey {
    /// Report order.
    pub const ALL: [StatKey; 11] = [
        StatKey::AtkSuc,
        StatKey::ShtSuc,
        StatKey::FbSuc,
        StatKey::FbShtSuc,
        StatKey::M7Cnt,
        StatKey::M7ShtSuc,
        StatKey::Tf,
        StatKey::Rtf,
        StatKey::ShtSav,
        StatKey::FbSav,
        StatKey::M7Sav,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatKey::AtkSuc => "Attack success",
            StatKey::ShtSuc => "Shot success",
            StatKey::FbSuc => "FB success",
            StatKey::FbShtSuc => "FB shot success",
            StatKey::M7Cnt => "7m count",
            StatKey::M7ShtSuc => "7m shot success",
            StatKey::Tf => "TF count",
            StatKey::Rtf => "RTF count",
            StatKey::ShtSav => "Shot save",
            StatKey::FbSav => "FB save",
            StatKey::M7Sav => "7m save",
        }
    }

    pub fn is_save_rate(self) -> bool {
        matches!(self, StatKey::ShtSav | StatKey::FbSav | StatKey::M7Sav)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Rate(f64),
    Count(u32),
}

impl MetricValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Rate(v) => v,
            MetricValue::Count(c) => f64::from(c),
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Rate(v) => write!(f, "{v:.1}%"),
            MetricValue::Count(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricEntry {
    pub key: StatKey,
    pub label: &'static str,
    pub value: MetricValue,
    pub display: String,
}

impl TeamStats {
    pub fn value(&self, key: StatKey) -> MetricValue {
        match key {
            StatKey::AtkSuc => MetricValue::Rate(self.attack_success),
            StatKey::ShtSuc => MetricValue::Rate(self.shot_success),
            StatKey::FbSuc => MetricValue::Rate(self.fast_break_success),
            StatKey::FbShtSuc => MetricValue::Rate(self.fast_break_shot_success),
            StatKey::M7Cnt => MetricValue::Count(self.seven_meter_count),
            StatKey::M7ShtSuc => MetricValue::Rate(self.seven_meter_shot_success),
            StatKey::Tf => MetricValue::Count(self.turnovers),
            StatKey::Rtf => MetricValue::Count(self.regained_turnovers),
            StatKey::ShtSav => MetricValue::Rate(self.shot_save),
            StatKey::FbSav => MetricValue::Rate(self.fast_break_save),
            StatKey::M7Sav => MetricValue::Rate(self.seven_meter_save),
        }
    }

    /// Catalogue rows for display. Individual field players have no save rates.
    pub fn entries(&self, include_save_rates: bool) -> Vec<MetricEntry> {
        StatKey::ALL
            .iter()
            .filter(|k| include_save_rates || !k.is_save_rate())
            .map(|&key| {
                let value = self.value(key);
                MetricEntry { key, label: key.label(), value, display: value.to_string() }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Scoreboard & report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub first: u32,
    pub second: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub ally: Score,
    pub opponent: Score,
}

impl Scoreboard {
    pub fn from_events(events: &[ShotEvent]) -> Self {
        let mut board = Scoreboard::default();
        for e in events.iter().filter(|e| e.is_goal()) {
            let score = match e.team {
                Team::Ally => &mut board.ally,
                Team::Opponent => &mut board.opponent,
            };
            match e.period {
                Period::First => score.first += 1,
                Period::Second => score.second += 1,
            }
            score.total += 1;
        }
        board
    }
}

/// Score plus both sides' team-wide numbers, as shown after a match or live.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub scoreboard: Scoreboard,
    pub ally: TeamStats,
    pub opponent: TeamStats,
}

impl MatchReport {
    pub fn build(events: &[ShotEvent]) -> Self {
        Self {
            scoreboard: Scoreboard::from_events(events),
            ally: compute_stats(events, Team::Ally, events, &StatsTarget::Team),
            opponent: compute_stats(events, Team::Opponent, events, &StatsTarget::Team),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
