//! Row types for the archive tables in `migrations/`, plus conversion between
//! stored rows and in-memory events.

use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Serialize;
use tracing::warn;

use crate::types::{ShotEvent, ZoneId};

#[derive(Debug, sqlx::FromRow)]
pub struct MatchRow {
    pub label: String,
    pub title: String,
    pub match_date: String,
    pub opponent: String,
    pub created_at: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub match_label: String,
    pub time_label: String,
    pub team: String,
    pub player: String,
    pub zone: i64,
    pub outcome: String,
    pub context: String,
    pub period: String,
    pub opposing_goalkeeper: Option<String>,
}

/// Wire code of a tag enum ("ally", "Save", "7m", "first", ...), as serde writes it.
pub fn code<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

/// Inverse of [`code`].
pub fn parse_code<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let de: StrDeserializer<'_, ValueError> = raw.trim().into_deserializer();
    T::deserialize(de).ok()
}

impl EventRow {
    /// Rebuilds the event, or None (with a warning) when any tag fails to parse.
    pub fn into_event(self, id: u64) -> Option<ShotEvent> {
        let zone = u8::try_from(self.zone).ok().and_then(ZoneId::new);
        let parsed = (
            zone,
            parse_code(&self.team),
            parse_code(&self.outcome),
            parse_code(&self.context),
            parse_code(&self.period),
        );
        match parsed {
            (Some(zone), Some(team), Some(outcome), Some(context), Some(period)) => Some(ShotEvent {
                id,
                team,
                player: self.player,
                zone,
                outcome,
                context,
                period,
                opposing_goalkeeper: self.opposing_goalkeeper.filter(|g| !g.trim().is_empty()),
                time_label: self.time_label,
            }),
            _ => {
                warn!(row = self.id, label = %self.match_label, "Skipping malformed archived event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Context, Outcome, Period, Team};

    fn row(zone: i64, outcome: &str) -> EventRow {
        EventRow {
            id: 1,
            match_label: "2026-10-19 | Friendly (vs Them)".to_string(),
            time_label: "04:12".to_string(),
            team: "opponent".to_string(),
            player: "11".to_string(),
            zone,
            outcome: outcome.to_string(),
            context: "FB".to_string(),
            period: "second".to_string(),
            opposing_goalkeeper: Some("1".to_string()),
        }
    }

    #[test]
    fn codes_match_wire_format() {
        assert_eq!(code(&Team::Ally), "ally");
        assert_eq!(code(&Outcome::Saved), "Save");
        assert_eq!(code(&Context::SevenMeter), "7m");
        assert_eq!(code(&Period::Second), "second");
        assert_eq!(parse_code::<Outcome>("RTF"), Some(Outcome::RegainedTurnover));
        assert_eq!(parse_code::<Context>("Set"), Some(Context::SetOffense));
        assert_eq!(parse_code::<Team>("nobody"), None);
    }

    #[test]
    fn row_converts_to_event() {
        let e = row(7, "Save").into_event(3).unwrap();
        assert_eq!(e.id, 3);
        assert_eq!(e.team, Team::Opponent);
        assert_eq!(e.zone, ZoneId::new(7).unwrap());
        assert_eq!(e.outcome, Outcome::Saved);
        assert_eq!(e.context, Context::FastBreak);
        assert_eq!(e.period, Period::Second);
        assert_eq!(e.opposing_goalkeeper.as_deref(), Some("1"));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        assert!(row(12, "G").into_event(0).is_none());
        assert!(row(3, "Goal").into_event(0).is_none());
    }
}
