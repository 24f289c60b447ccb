//! Per-zone shot density and conversion for the court heatmap.

use serde::Serialize;

use crate::court::classifier::label_anchor;
use crate::court::{CourtGeometry, Point, Polygon};
use crate::stats::aggregator::rate;
use crate::types::{ShotEvent, Team, ZoneId};

/// Number of discrete colour steps across share ∈ [0, 1).
pub const INTENSITY_BUCKETS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "bucket", rename_all = "snake_case")]
pub enum ZoneFill {
    /// No events in the zone: drawn with the neutral court colour, not the bottom of the scale.
    NoData,
    /// Colour step 0..INTENSITY_BUCKETS.
    Intensity(u8),
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    pub zone: ZoneId,
    pub polygon: Polygon,
    pub anchor: Point,
    pub events: u32,
    pub share: f64,
    pub fill: ZoneFill,
    /// Goals / attempts in this zone, one decimal; None without attempts.
    pub conversion: Option<f64>,
    /// Text drawn at the anchor, the rounded conversion percentage.
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Heatmap {
    pub team: Team,
    /// Team events outside zone 9.
    pub total: u32,
    pub cells: Vec<HeatmapCell>,
}

/// Share → colour step. Integer arithmetic so 3/10 lands in bucket 3, not 2.
pub fn intensity_bucket(count: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let bucket = u64::from(count) * u64::from(INTENSITY_BUCKETS) / u64::from(total);
    bucket.min(u64::from(INTENSITY_BUCKETS - 1)) as u8
}

pub fn project(geometry: &CourtGeometry, team: Team, events: &[ShotEvent]) -> Heatmap {
    let team_events: Vec<&ShotEvent> = events
        .iter()
        .filter(|e| e.team == team && !e.zone.is_seven_meter())
        .collect();
    let total = team_events.len() as u32;

    let cells = ZoneId::field_zones()
        .map(|zone| {
            let in_zone: Vec<&ShotEvent> = team_events
                .iter()
                .copied()
                .filter(|e| e.zone == zone)
                .collect();
            let count = in_zone.len() as u32;
            let share = if total == 0 { 0.0 } else { f64::from(count) / f64::from(total) };
            let fill = if in_zone.is_empty() {
                ZoneFill::NoData
            } else {
                ZoneFill::Intensity(intensity_bucket(count, total))
            };

            let attempts = in_zone.iter().filter(|e| e.is_shot_attempt()).count() as u32;
            let goals = in_zone.iter().filter(|e| e.is_goal()).count() as u32;
            let conversion = (attempts > 0).then(|| rate(goals, attempts));
            let label = (attempts > 0)
                .then(|| format!("{:.0}", f64::from(goals) / f64::from(attempts) * 100.0));

            HeatmapCell {
                zone,
                polygon: geometry.polygon(zone).clone(),
                anchor: label_anchor(zone),
                events: count,
                share,
                fill,
                conversion,
                label,
            }
        })
        .collect();

    Heatmap { team, total, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Context, Outcome, Period};

    fn ev(team: Team, zone: u8, outcome: Outcome) -> ShotEvent {
        let zone = ZoneId::new(zone).unwrap();
        let context = if zone.is_seven_meter() { Context::SevenMeter } else { Context::SetOffense };
        ShotEvent {
            id: 0,
            team,
            player: "5".to_string(),
            zone,
            outcome,
            context,
            period: Period::First,
            opposing_goalkeeper: None,
            time_label: "00:00".to_string(),
        }
    }

    fn cell(map: &Heatmap, zone: u8) -> &HeatmapCell {
        &map.cells[usize::from(zone - 1)]
    }

    #[test]
    fn empty_log_is_all_no_data() {
        let map = project(&CourtGeometry::new(), Team::Ally, &[]);
        assert_eq!(map.total, 0);
        assert_eq!(map.cells.len(), 8);
        for c in &map.cells {
            assert_eq!(c.fill, ZoneFill::NoData);
            assert_eq!(c.share, 0.0);
            assert!(c.label.is_none());
        }
    }

    #[test]
    fn sparse_zone_is_lowest_bucket_not_no_data() {
        // 1 of 11 events: share < 0.1 still renders on the scale.
        let mut events = vec![ev(Team::Ally, 2, Outcome::Goal)];
        events.extend((0..10).map(|_| ev(Team::Ally, 3, Outcome::OffTarget)));
        let map = project(&CourtGeometry::new(), Team::Ally, &events);
        assert_eq!(cell(&map, 2).fill, ZoneFill::Intensity(0));
        assert_eq!(cell(&map, 3).fill, ZoneFill::Intensity(9));
        assert_eq!(cell(&map, 4).fill, ZoneFill::NoData);
    }

    #[test]
    fn shares_conversion_and_labels() {
        let events = vec![
            ev(Team::Ally, 3, Outcome::Goal),
            ev(Team::Ally, 3, Outcome::Goal),
            ev(Team::Ally, 3, Outcome::Saved),
            ev(Team::Ally, 6, Outcome::TurnedOver),
            // Zone 9 and the other side are excluded.
            ev(Team::Ally, 9, Outcome::Goal),
            ev(Team::Opponent, 3, Outcome::Goal),
        ];
        let map = project(&CourtGeometry::new(), Team::Ally, &events);
        assert_eq!(map.total, 4);

        let z3 = cell(&map, 3);
        assert_eq!(z3.events, 3);
        assert!((z3.share - 0.75).abs() < 1e-9);
        assert_eq!(z3.fill, ZoneFill::Intensity(7));
        assert_eq!(z3.conversion, Some(66.7));
        assert_eq!(z3.label.as_deref(), Some("67"));

        // Events but no attempts: coloured, unlabelled.
        let z6 = cell(&map, 6);
        assert_eq!(z6.fill, ZoneFill::Intensity(2));
        assert!(z6.conversion.is_none());
        assert!(z6.label.is_none());
    }

    #[test]
    fn bucket_edges() {
        assert_eq!(intensity_bucket(3, 10), 3);
        assert_eq!(intensity_bucket(7, 10), 7);
        assert_eq!(intensity_bucket(1, 1), 9);
        assert_eq!(intensity_bucket(0, 5), 0);
        assert_eq!(intensity_bucket(0, 0), 0);
    }

    #[test]
    fn cells_carry_geometry() {
        let geometry = CourtGeometry::new();
        let map = project(&geometry, Team::Opponent, &[]);
        for c in &map.cells {
            assert_eq!(&c.polygon, geometry.polygon(c.zone));
            assert_eq!(c.anchor, label_anchor(c.zone));
        }
    }
}
