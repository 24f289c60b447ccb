use crate::types::{NewShot, Period, ShotEvent, Team};

/// Append-only record of the current match.
///
/// `archived` is the cursor of events already written to the archive; only
/// events past it are sent on the next sync. `generation` bumps on every
/// clear so an acknowledgement for a batch taken before a reset cannot move
/// the cursor of the new match.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<ShotEvent>,
    next_id: u64,
    archived: usize,
    generation: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, shot: NewShot) -> &ShotEvent {
        let event = ShotEvent {
            id: self.next_id,
            team: shot.team,
            player: shot.player,
            zone: shot.zone,
            outcome: shot.outcome,
            context: shot.context,
            period: shot.period,
            opposing_goalkeeper: shot.opposing_goalkeeper,
            time_label: shot.time_label,
        };
        self.next_id += 1;
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[ShotEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// One side's events in one period, in logging order.
    pub fn filtered(&self, team: Option<Team>, period: Option<Period>) -> Vec<ShotEvent> {
        self.events
            .iter()
            .filter(|e| team.map_or(true, |t| e.team == t))
            .filter(|e| period.map_or(true, |p| e.period == p))
            .cloned()
            .collect()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn archived_count(&self) -> usize {
        self.archived
    }

    pub fn unarchived(&self) -> &[ShotEvent] {
        &self.events[self.archived.min(self.events.len())..]
    }

    /// Advances the archive cursor by `count` events written under `generation`.
    /// Returns false when the log was cleared since the batch was taken.
    pub fn mark_archived(&mut self, generation: u64, count: usize) -> bool {
        if generation != self.generation {
            return false;
        }
        self.archived = (self.archived + count).min(self.events.len());
        true
    }

    /// Drops every event and restarts ids and the archive cursor.
    pub fn clear(&mut self) {
        self.events.clear();
        self.next_id = 0;
        self.archived = 0;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Context, Outcome, ZoneId};

    fn shot(team: Team, period: Period) -> NewShot {
        NewShot {
            team,
            player: "3".to_string(),
            zone: ZoneId::new(4).unwrap(),
            outcome: Outcome::Goal,
            context: Context::SetOffense,
            period,
            opposing_goalkeeper: Some("1".to_string()),
            time_label: "03:10".to_string(),
        }
    }

    #[test]
    fn ids_are_monotonic() {
        let mut log = EventLog::new();
        assert_eq!(log.append(shot(Team::Ally, Period::First)).id, 0);
        assert_eq!(log.append(shot(Team::Opponent, Period::First)).id, 1);
        assert_eq!(log.append(shot(Team::Ally, Period::Second)).id, 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn clear_restarts_ids() {
        let mut log = EventLog::new();
        log.append(shot(Team::Ally, Period::First));
        log.append(shot(Team::Ally, Period::First));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.append(shot(Team::Ally, Period::First)).id, 0);
    }

    #[test]
    fn filtered_by_team_and_period() {
        let mut log = EventLog::new();
        log.append(shot(Team::Ally, Period::First));
        log.append(shot(Team::Opponent, Period::First));
        log.append(shot(Team::Ally, Period::Second));
        assert_eq!(log.filtered(Some(Team::Ally), None).len(), 2);
        assert_eq!(log.filtered(Some(Team::Ally), Some(Period::Second)).len(), 1);
        assert_eq!(log.filtered(None, Some(Period::First)).len(), 2);
        assert_eq!(log.filtered(None, None).len(), 3);
    }

    #[test]
    fn archive_cursor_only_exposes_new_events() {
        let mut log = EventLog::new();
        log.append(shot(Team::Ally, Period::First));
        log.append(shot(Team::Ally, Period::First));
        let generation = log.generation();
        let batch = log.unarchived().len();
        assert_eq!(batch, 2);

        // Logged while the batch was being written.
        log.append(shot(Team::Opponent, Period::First));
        assert!(log.mark_archived(generation, batch));
        assert_eq!(log.unarchived().len(), 1);
        assert_eq!(log.unarchived()[0].id, 2);
    }

    #[test]
    fn stale_ack_after_reset_is_ignored() {
        let mut log = EventLog::new();
        log.append(shot(Team::Ally, Period::First));
        let generation = log.generation();
        log.clear();
        log.append(shot(Team::Ally, Period::First));
        assert!(!log.mark_archived(generation, 1));
        assert_eq!(log.unarchived().len(), 1);
        assert_eq!(log.archived_count(), 0);
    }
}
