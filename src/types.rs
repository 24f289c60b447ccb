use serde::{Deserialize, Serialize};

use crate::config::NON_NUMERIC_SORT_KEY;

// ---------------------------------------------------------------------------
// Sides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// The side being analysed.
    Ally,
    Opponent,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::Ally, Team::Opponent];

    pub fn other(self) -> Team {
        match self {
            Team::Ally => Team::Opponent,
            Team::Opponent => Team::Ally,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Team::Ally => "ally",
            Team::Opponent => "opponent",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// One of the nine court zones. 1–5 sit between the 6m and 9m lines, 6–8 beyond
/// the 9m line, 9 is the 7-meter throw box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ZoneId(u8);

impl ZoneId {
    pub const SEVEN_METER: ZoneId = ZoneId(9);

    pub fn new(id: u8) -> Option<Self> {
        (1..=9).contains(&id).then_some(ZoneId(id))
    }

    /// All zones in lookup priority order.
    pub fn all() -> impl Iterator<Item = ZoneId> {
        (1..=9).map(ZoneId)
    }

    /// Zones 1–8: everything the heatmap covers.
    pub fn field_zones() -> impl Iterator<Item = ZoneId> {
        (1..=8).map(ZoneId)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_seven_meter(self) -> bool {
        self == Self::SEVEN_METER
    }

    /// Contexts an operator may log for a shot from this zone.
    pub fn allowed_contexts(self) -> &'static [Context] {
        if self.is_seven_meter() {
            &[Context::SevenMeter]
        } else {
            &[Context::SetOffense, Context::FastBreak]
        }
    }

    /// Operator-facing label: "7m" for the throw box, the number otherwise.
    pub fn label(self) -> String {
        if self.is_seven_meter() {
            "7m".to_string()
        } else {
            self.0.to_string()
        }
    }
}

impl TryFrom<u8> for ZoneId {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        ZoneId::new(id).ok_or_else(|| format!("zone id {id} out of range 1..=9"))
    }
}

impl From<ZoneId> for u8 {
    fn from(zone: ZoneId) -> u8 {
        zone.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Event tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "G")]
    Goal,
    #[serde(rename = "O")]
    OffTarget,
    #[serde(rename = "Save")]
    Saved,
    /// Technical fault: possession lost without a shot.
    #[serde(rename = "TF")]
    TurnedOver,
    #[serde(rename = "RTF")]
    RegainedTurnover,
}

impl Outcome {
    /// Goal, miss or save. Turnovers never count towards shot denominators.
    pub fn is_shot_attempt(self) -> bool {
        matches!(self, Outcome::Goal | Outcome::OffTarget | Outcome::Saved)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Goal => "G",
            Outcome::OffTarget => "O",
            Outcome::Saved => "Save",
            Outcome::TurnedOver => "TF",
            Outcome::RegainedTurnover => "RTF",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Context {
    #[serde(rename = "Set")]
    SetOffense,
    #[serde(rename = "FB")]
    FastBreak,
    #[serde(rename = "7m")]
    SevenMeter,
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Context::SetOffense => "Set",
            Context::FastBreak => "FB",
            Context::SevenMeter => "7m",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    First,
    Second,
}

impl Period {
    pub const BOTH: [Period; 2] = [Period::First, Period::Second];
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::First => write!(f, "1st half"),
            Period::Second => write!(f, "2nd half"),
        }
    }
}

// ---------------------------------------------------------------------------
// ShotEvent
// ---------------------------------------------------------------------------

/// One logged action. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEvent {
    pub id: u64,
    pub team: Team,
    pub player: String,
    pub zone: ZoneId,
    pub outcome: Outcome,
    pub context: Context,
    pub period: Period,
    /// Number of the keeper the shot was taken against, if one was active.
    pub opposing_goalkeeper: Option<String>,
    /// Match clock at confirmation, `MM:SS`.
    pub time_label: String,
}

impl ShotEvent {
    /// Not a 7-meter throw: outside zone 9 and not tagged as one.
    pub fn is_field(&self) -> bool {
        !self.zone.is_seven_meter() && self.context != Context::SevenMeter
    }

    /// From zone 9 or tagged as a 7-meter throw.
    pub fn is_seven_meter(&self) -> bool {
        self.zone.is_seven_meter() || self.context == Context::SevenMeter
    }

    pub fn is_shot_attempt(&self) -> bool {
        self.outcome.is_shot_attempt()
    }

    pub fn is_goal(&self) -> bool {
        self.outcome == Outcome::Goal
    }
}

/// Everything an append needs; the log assigns the id.
#[derive(Debug, Clone)]
pub struct NewShot {
    pub team: Team,
    pub player: String,
    pub zone: ZoneId,
    pub outcome: Outcome,
    pub context: Context,
    pub period: Period,
    pub opposing_goalkeeper: Option<String>,
    pub time_label: String,
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    GK,
    LB,
    CB,
    RB,
    LW,
    RW,
    PV,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub number: String,
    pub name: String,
    pub position: Position,
    /// Comma-separated `"<period> MM:SS"` labels, one per penalty.
    #[serde(default)]
    pub warnings: String,
    #[serde(default)]
    pub suspensions: String,
    #[serde(default)]
    pub disqualifications: String,
}

impl Player {
    pub fn is_goalkeeper(&self) -> bool {
        self.position == Position::GK
    }

    pub fn penalty_history_mut(&mut self, kind: PenaltyKind) -> &mut String {
        match kind {
            PenaltyKind::Warning => &mut self.warnings,
            PenaltyKind::TwoMinutes => &mut self.suspensions,
            PenaltyKind::Disqualification => &mut self.disqualifications,
        }
    }
}

/// Digit-only numbers lose their leading zeros ("07" → "7"); anything else is kept trimmed.
pub fn normalize_number(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

/// Numeric order for digit-only numbers, non-numeric ones after.
pub fn number_sort_key(number: &str) -> u32 {
    if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
        number.parse::<u32>().unwrap_or(NON_NUMERIC_SORT_KEY)
    } else {
        NON_NUMERIC_SORT_KEY
    }
}

// ---------------------------------------------------------------------------
// Penalties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    Warning,
    TwoMinutes,
    Disqualification,
}

impl PenaltyKind {
    /// Both a 2-minute and a disqualification send the team short-handed.
    pub fn starts_suspension(self) -> bool {
        matches!(self, PenaltyKind::TwoMinutes | PenaltyKind::Disqualification)
    }
}

impl std::fmt::Display for PenaltyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PenaltyKind::Warning => "warning",
            PenaltyKind::TwoMinutes => "two_minutes",
            PenaltyKind::Disqualification => "disqualification",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspension {
    pub team: Team,
    pub player: String,
    /// Match clock (seconds) when the suspension started.
    pub started_at_secs: f64,
}

impl Suspension {
    /// Seconds left at `elapsed_secs`; non-positive once served.
    pub fn remaining_secs(&self, elapsed_secs: f64) -> f64 {
        crate::config::SUSPENSION_SECS - (elapsed_secs - self.started_at_secs)
    }

    pub fn is_active(&self, elapsed_secs: f64) -> bool {
        self.remaining_secs(elapsed_secs) > 0.0
    }
}

// ---------------------------------------------------------------------------
// Match metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub ally_name: String,
    pub opponent_name: String,
}

impl MatchInfo {
    pub fn team_name(&self, team: Team) -> &str {
        match team {
            Team::Ally => &self.ally_name,
            Team::Opponent => &self.opponent_name,
        }
    }

    /// Key under which the match is archived: `"<date> | <title> (vs <opponent>)"`.
    pub fn archive_label(&self) -> String {
        archive_label(&self.date, &self.title, &self.opponent_name)
    }
}

pub fn archive_label(date: &str, title: &str, opponent: &str) -> String {
    let opponent = if opponent.trim().is_empty() { "unknown" } else { opponent };
    format!("{date} | {title} (vs {opponent})")
}

/// `MM:SS` of a match clock, minutes wrapping at the hour like a stopwatch face.
pub fn format_clock(elapsed_secs: f64) -> String {
    let secs = elapsed_secs.max(0.0) as u64;
    format!("{:02}:{:02}", (secs / 60) % 60, secs % 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event(zone: u8, context: Context) -> ShotEvent {
        ShotEvent {
            id: 0,
            team: Team::Ally,
            player: "7".to_string(),
            zone: ZoneId::new(zone).unwrap(),
            outcome: Outcome::Goal,
            context,
            period: Period::First,
            opposing_goalkeeper: None,
            time_label: "00:00".to_string(),
        }
    }

    #[test]
    fn zone_id_range() {
        assert!(ZoneId::new(0).is_none());
        assert!(ZoneId::new(10).is_none());
        assert_eq!(ZoneId::all().count(), 9);
        assert_eq!(ZoneId::field_zones().count(), 8);
        assert_eq!(ZoneId::SEVEN_METER.label(), "7m");
        assert_eq!(ZoneId::new(3).unwrap().label(), "3");
    }

    #[test]
    fn zone_nine_forces_seven_meter_context() {
        assert_eq!(ZoneId::SEVEN_METER.allowed_contexts(), &[Context::SevenMeter]);
        assert_eq!(
            ZoneId::new(2).unwrap().allowed_contexts(),
            &[Context::SetOffense, Context::FastBreak]
        );
    }

    #[test]
    fn field_and_seven_meter_are_complementary() {
        for zone in 1..=9 {
            for context in [Context::SetOffense, Context::FastBreak, Context::SevenMeter] {
                let e = event(zone, context);
                assert_ne!(e.is_field(), e.is_seven_meter(), "zone={zone} context={context}");
            }
        }
        // 7m context outside zone 9 still counts as a 7-meter event.
        assert!(event(3, Context::SevenMeter).is_seven_meter());
    }

    #[test]
    fn wire_codes_round_trip_through_json() {
        let e = event(9, Context::SevenMeter);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["zone"], 9);
        assert_eq!(json["outcome"], "G");
        assert_eq!(json["context"], "7m");
        assert_eq!(json["team"], "ally");
        assert_eq!(json["period"], "first");
        let back: ShotEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn out_of_range_zone_rejected_on_deserialize() {
        let raw = r#"{"id":1,"team":"ally","player":"4","zone":12,"outcome":"G","context":"Set","period":"first","opposing_goalkeeper":null,"time_label":"01:00"}"#;
        assert!(serde_json::from_str::<ShotEvent>(raw).is_err());
    }

    #[test]
    fn numbers_normalize_and_sort() {
        assert_eq!(normalize_number(" 07 "), "7");
        assert_eq!(normalize_number("00"), "0");
        assert_eq!(normalize_number("A1"), "A1");
        assert_eq!(number_sort_key("12"), 12);
        assert_eq!(number_sort_key("A1"), NON_NUMERIC_SORT_KEY);
    }

    #[test]
    fn suspension_expires_after_two_minutes() {
        let s = Suspension { team: Team::Opponent, player: "5".to_string(), started_at_secs: 30.0 };
        assert!(s.is_active(30.0));
        assert!((s.remaining_secs(90.0) - 60.0).abs() < 1e-9);
        assert!(s.is_active(149.9));
        assert!(!s.is_active(150.0));
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(125.7), "02:05");
        assert_eq!(format_clock(3_605.0), "00:05");
    }

    #[test]
    fn archive_label_format() {
        let info = MatchInfo {
            title: "League R3".to_string(),
            date: "2026-10-19".to_string(),
            ally_name: "Us".to_string(),
            opponent_name: "North HS".to_string(),
        };
        assert_eq!(info.archive_label(), "2026-10-19 | League R3 (vs North HS)");
        assert_eq!(archive_label("d", "t", " "), "d | t (vs unknown)");
    }
}
