use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::types::{archive_label, MatchInfo, ShotEvent};

/// One past match as read back from the archive or a CSV import.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedMatch {
    pub label: String,
    pub title: String,
    pub date: String,
    pub opponent: String,
    pub events: Vec<ShotEvent>,
}

impl ArchivedMatch {
    pub fn new(title: &str, date: &str, opponent: &str) -> Self {
        Self {
            label: archive_label(date, title, opponent),
            title: title.to_string(),
            date: date.to_string(),
            opponent: opponent.to_string(),
            events: Vec::new(),
        }
    }

    pub fn from_info(info: &MatchInfo) -> Self {
        Self::new(&info.title, &info.date, &info.opponent_name)
    }

    /// Appends with ids continuing after the last stored event.
    pub fn push(&mut self, mut event: ShotEvent) {
        event.id = self.events.len() as u64;
        self.events.push(event);
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            label: self.label.clone(),
            title: self.title.clone(),
            date: self.date.clone(),
            opponent: self.opponent.clone(),
            events: self.events.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub label: String,
    pub title: String,
    pub date: String,
    pub opponent: String,
    pub events: usize,
}

// ---------------------------------------------------------------------------
// ArchiveCache
// ---------------------------------------------------------------------------

/// label → archived match. Readers get an `Arc` snapshot and never hold a shard lock
/// while computing stats.
pub struct ArchiveCache {
    matches: DashMap<String, Arc<ArchivedMatch>>,
}

impl ArchiveCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            matches: DashMap::new(),
        })
    }

    /// Swaps in a full reload from storage.
    pub fn replace_all(&self, matches: Vec<ArchivedMatch>) {
        self.matches.clear();
        for m in matches {
            self.matches.insert(m.label.clone(), Arc::new(m));
        }
    }

    /// Inserts or replaces one match.
    pub fn insert(&self, m: ArchivedMatch) {
        self.matches.insert(m.label.clone(), Arc::new(m));
    }

    /// Adds freshly synced events to the match under `info`'s label.
    pub fn append(&self, info: &MatchInfo, events: &[ShotEvent]) {
        let label = info.archive_label();
        let mut entry = self
            .matches
            .entry(label)
            .or_insert_with(|| Arc::new(ArchivedMatch::from_info(info)));
        let m = Arc::make_mut(entry.value_mut());
        for e in events {
            m.push(e.clone());
        }
    }

    pub fn get(&self, label: &str) -> Option<Arc<ArchivedMatch>> {
        self.matches.get(label).map(|m| Arc::clone(m.value()))
    }

    /// Newest first: labels start with the ISO date.
    pub fn summaries(&self) -> Vec<MatchSummary> {
        let mut out: Vec<MatchSummary> = self.matches.iter().map(|m| m.summary()).collect();
        out.sort_by(|a, b| b.label.cmp(&a.label));
        out
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Context, Outcome, Period, Team, ZoneId};

    fn event(id: u64) -> ShotEvent {
        ShotEvent {
            id,
            team: Team::Ally,
            player: "7".to_string(),
            zone: ZoneId::new(2).unwrap(),
            outcome: Outcome::Goal,
            context: Context::SetOffense,
            period: Period::First,
            opposing_goalkeeper: None,
            time_label: "01:00".to_string(),
        }
    }

    fn info(date: &str) -> MatchInfo {
        MatchInfo {
            title: "League".to_string(),
            date: date.to_string(),
            ally_name: "Us".to_string(),
            opponent_name: "Them".to_string(),
        }
    }

    #[test]
    fn append_creates_then_extends() {
        let cache = ArchiveCache::new();
        cache.append(&info("2026-10-01"), &[event(0), event(1)]);
        cache.append(&info("2026-10-01"), &[event(0)]);
        let m = cache.get("2026-10-01 | League (vs Them)").unwrap();
        assert_eq!(m.events.len(), 3);
        let ids: Vec<u64> = m.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, [0, 1, 2]);
    }

    #[test]
    fn snapshot_survives_later_appends() {
        let cache = ArchiveCache::new();
        cache.append(&info("2026-10-01"), &[event(0)]);
        let before = cache.get("2026-10-01 | League (vs Them)").unwrap();
        cache.append(&info("2026-10-01"), &[event(1)]);
        assert_eq!(before.events.len(), 1);
    }

    #[test]
    fn summaries_newest_first() {
        let cache = ArchiveCache::new();
        cache.append(&info("2026-09-12"), &[event(0)]);
        cache.append(&info("2026-10-03"), &[event(0), event(1)]);
        let list = cache.summaries();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].date, "2026-10-03");
        assert_eq!(list[0].events, 2);
    }

    #[test]
    fn replace_all_drops_stale_entries() {
        let cache = ArchiveCache::new();
        cache.append(&info("2026-09-12"), &[event(0)]);
        cache.replace_all(vec![ArchivedMatch::new("Cup", "2026-10-10", "")]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("2026-10-10 | Cup (vs unknown)").is_some());
    }
}
