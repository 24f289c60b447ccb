use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::state::ArchivedMatch;
use crate::types::{archive_label, Context, MatchInfo, Outcome, Period, ShotEvent, Team, ZoneId};

/// Spreadsheet apps need the byte-order mark to open UTF-8 correctly.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One exported line. The event id is not exported; imports renumber.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    title: String,
    date: String,
    opponent: String,
    time: String,
    team: Team,
    no: String,
    zone: ZoneId,
    outcome: Outcome,
    context: Context,
    period: Period,
    #[serde(default)]
    vs_gk: Option<String>,
}

impl CsvRow {
    fn new(info: &MatchInfo, e: &ShotEvent) -> Self {
        Self {
            title: info.title.clone(),
            date: info.date.clone(),
            opponent: info.opponent_name.clone(),
            time: e.time_label.clone(),
            team: e.team,
            no: e.player.clone(),
            zone: e.zone,
            outcome: e.outcome,
            context: e.context,
            period: e.period,
            vs_gk: e.opposing_goalkeeper.clone(),
        }
    }

    fn into_event(self, id: u64) -> ShotEvent {
        ShotEvent {
            id,
            team: self.team,
            player: self.no,
            zone: self.zone,
            outcome: self.outcome,
            context: self.context,
            period: self.period,
            opposing_goalkeeper: self.vs_gk.filter(|g| !g.trim().is_empty()),
            time_label: self.time,
        }
    }
}

pub fn write_csv(info: &MatchInfo, events: &[ShotEvent]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(UTF8_BOM.to_vec());
    for e in events {
        wtr.serialize(CsvRow::new(info, e))?;
    }
    wtr.into_inner().map_err(|e| AppError::Io(e.into_error()))
}

/// Parses an export back into matches grouped by label, in first-seen order.
/// Rows that do not parse are skipped with a warning.
pub fn read_csv(data: &[u8]) -> Result<Vec<ArchivedMatch>> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut rdr = csv::Reader::from_reader(data);

    let mut matches: Vec<ArchivedMatch> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for (line, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line + 2, "Skipping CSV row: {e}");
                skipped += 1;
                continue;
            }
        };
        let label = archive_label(&row.date, &row.title, &row.opponent);
        let idx = *index.entry(label).or_insert_with(|| {
            matches.push(ArchivedMatch::new(&row.title, &row.date, &row.opponent));
            matches.len() - 1
        });
        let m = &mut matches[idx];
        let id = m.events.len() as u64;
        m.events.push(row.into_event(id));
    }

    if matches.is_empty() && skipped > 0 {
        return Err(AppError::InvalidInput(format!("no readable rows ({skipped} skipped)")));
    }
    info!(matches = matches.len(), skipped, "CSV imported");
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> MatchInfo {
        MatchInfo {
            title: "Cup QF".to_string(),
            date: "2026-10-19".to_string(),
            ally_name: "Us".to_string(),
            opponent_name: "Valley".to_string(),
        }
    }

    fn events() -> Vec<ShotEvent> {
        vec![
            ShotEvent {
                id: 4,
                team: Team::Ally,
                player: "7".to_string(),
                zone: ZoneId::new(1).unwrap(),
                outcome: Outcome::Goal,
                context: Context::FastBreak,
                period: Period::First,
                opposing_goalkeeper: Some("16".to_string()),
                time_label: "03:41".to_string(),
            },
            ShotEvent {
                id: 9,
                team: Team::Opponent,
                player: "A2".to_string(),
                zone: ZoneId::SEVEN_METER,
                outcome: Outcome::Saved,
                context: Context::SevenMeter,
                period: Period::Second,
                opposing_goalkeeper: None,
                time_label: "41:07".to_string(),
            },
        ]
    }

    #[test]
    fn export_has_bom_and_header() {
        let bytes = write_csv(&info(), &events()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("title,date,opponent,time,team,no,zone,outcome,context,period,vs_gk")
        );
        assert_eq!(
            lines.next(),
            Some("Cup QF,2026-10-19,Valley,03:41,ally,7,1,G,FB,first,16")
        );
        assert_eq!(
            lines.next(),
            Some("Cup QF,2026-10-19,Valley,41:07,opponent,A2,9,Save,7m,second,")
        );
    }

    #[test]
    fn import_reproduces_event_fields() {
        let bytes = write_csv(&info(), &events()).unwrap();
        let matches = read_csv(&bytes).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].label, info().archive_label());

        let mut expected = events();
        for (i, e) in expected.iter_mut().enumerate() {
            e.id = i as u64;
        }
        assert_eq!(matches[0].events, expected);
    }

    #[test]
    fn import_groups_by_label_and_skips_bad_rows() {
        let raw = "title,date,opponent,time,team,no,zone,outcome,context,period,vs_gk\n\
                   A,2026-10-01,X,00:10,ally,3,2,G,Set,first,\n\
                   B,2026-10-02,Y,00:20,opponent,4,3,O,Set,first,1\n\
                   A,2026-10-01,X,00:30,ally,3,14,G,Set,first,\n\
                   A,2026-10-01,X,00:40,ally,5,9,G,7m,second,\n";
        let matches = read_csv(raw.as_bytes()).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].title, "A");
        assert_eq!(matches[0].events.len(), 2);
        assert_eq!(matches[0].events[1].id, 1);
        assert_eq!(matches[1].events[0].opposing_goalkeeper.as_deref(), Some("1"));
    }

    #[test]
    fn unreadable_file_is_rejected() {
        let raw = "title,date\nonly,two\n";
        assert!(matches!(read_csv(raw.as_bytes()), Err(AppError::InvalidInput(_))));
    }
}
