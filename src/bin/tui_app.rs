use serde::de::DeserializeOwned;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror routes.rs shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MatchInfoResponse {
    pub title: String,
    pub date: String,
    pub ally_name: String,
    pub opponent_name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClockResponse {
    pub elapsed_secs: f64,
    pub label: String,
    pub running: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct KeepersResponse {
    pub ally: Option<String>,
    pub opponent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuspensionResponse {
    pub team: String,
    pub player: String,
    pub remaining_label: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SessionResponse {
    pub info: MatchInfoResponse,
    pub clock: ClockResponse,
    pub period: String,
    pub selected_label: Option<String>,
    pub active_goalkeepers: KeepersResponse,
    pub suspensions: Vec<SuspensionResponse>,
    pub event_count: usize,
    pub unarchived: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct ScoreResponse {
    pub first: u32,
    pub second: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct ScoreboardResponse {
    pub ally: ScoreResponse,
    pub opponent: ScoreResponse,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReportResponse {
    pub scoreboard: ScoreboardResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricResponse {
    pub key: String,
    pub label: String,
    pub display: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StatsResponse {
    pub entries: Vec<MetricResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", content = "bucket", rename_all = "snake_case")]
pub enum FillResponse {
    NoData,
    Intensity(u8),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CellResponse {
    pub zone: u8,
    pub events: u32,
    pub share: f64,
    pub fill: FillResponse,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct HeatmapResponse {
    pub total: u32,
    pub cells: Vec<CellResponse>,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub session: SessionResponse,
    pub report: ReportResponse,
    pub ally_stats: StatsResponse,
    pub opponent_stats: StatsResponse,
    pub ally_heatmap: HeatmapResponse,
    pub opponent_heatmap: HeatmapResponse,
    pub last_refresh: std::time::Instant,
    pub base_url: String,
}

async fn fetch<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T, String> {
    let resp = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("{url}: HTTP {}", resp.status()));
    }
    resp.json::<T>().await.map_err(|e| format!("parse error: {e}"))
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            session: SessionResponse::default(),
            report: ReportResponse::default(),
            ally_stats: StatsResponse::default(),
            opponent_stats: StatsResponse::default(),
            ally_heatmap: HeatmapResponse::default(),
            opponent_heatmap: HeatmapResponse::default(),
            last_refresh: std::time::Instant::now(),
            base_url,
        }
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let session_url = format!("{}/session", self.base_url);
        let report_url = format!("{}/stats/report", self.base_url);
        let ally_stats_url = format!("{}/stats/ally", self.base_url);
        let opp_stats_url = format!("{}/stats/opponent", self.base_url);
        let ally_map_url = format!("{}/heatmap/ally", self.base_url);
        let opp_map_url = format!("{}/heatmap/opponent", self.base_url);

        let (session, report, ally_stats, opp_stats, ally_map, opp_map) = tokio::join!(
            fetch::<SessionResponse>(client, &session_url),
            fetch::<ReportResponse>(client, &report_url),
            fetch::<StatsResponse>(client, &ally_stats_url),
            fetch::<StatsResponse>(client, &opp_stats_url),
            fetch::<HeatmapResponse>(client, &ally_map_url),
            fetch::<HeatmapResponse>(client, &opp_map_url),
        );

        match (session, report) {
            (Ok(s), Ok(r)) => {
                self.session = s;
                self.report = r;
                self.status = ConnectionStatus::Connected;
                self.last_refresh = std::time::Instant::now();
            }
            (Err(e), _) | (_, Err(e)) => {
                self.status = ConnectionStatus::Error(e);
                return;
            }
        }

        if let Ok(s) = ally_stats {
            self.ally_stats = s;
        }
        if let Ok(s) = opp_stats {
            self.opponent_stats = s;
        }
        if let Ok(m) = ally_map {
            self.ally_heatmap = m;
        }
        if let Ok(m) = opp_map {
            self.opponent_heatmap = m;
        }
    }

    /// POST /clock/toggle, then refresh so the header reflects it at once.
    pub async fn toggle_clock(&mut self, client: &reqwest::Client) {
        let url = format!("{}/clock/toggle", self.base_url);
        match client.post(&url).send().await {
            Ok(resp) if resp.status().is_success() => self.refresh(client).await,
            Ok(resp) => self.status = ConnectionStatus::Error(format!("clock toggle: HTTP {}", resp.status())),
            Err(e) => self.status = ConnectionStatus::Error(e.to_string()),
        }
    }

    /// Stat catalogue rows side by side: (label, ally, opponent).
    pub fn comparison_rows(&self) -> Vec<(String, String, String)> {
        comparison_rows(&self.ally_stats, &self.opponent_stats)
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn comparison_rows(ally: &StatsResponse, opponent: &StatsResponse) -> Vec<(String, String, String)> {
    ally.entries
        .iter()
        .map(|a| {
            let other = opponent
                .entries
                .iter()
                .find(|o| o.key == a.key)
                .map_or("—".to_string(), |o| o.display.clone());
            (a.label.clone(), a.display.clone(), other)
        })
        .collect()
}

/// Ten-step bar for a heatmap bucket; blank for zones without events.
pub fn intensity_bar(fill: FillResponse) -> String {
    match fill {
        FillResponse::NoData => "·".to_string(),
        FillResponse::Intensity(b) => "█".repeat(usize::from(b) + 1),
    }
}

pub fn format_share(share: f64) -> String {
    format!("{:.0}%", share * 100.0)
}

pub fn zone_name(zone: u8) -> String {
    if zone == 9 {
        "7m".to_string()
    } else {
        zone.to_string()
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[allow(dead_code)]
fn main() {
    // Entry point lives in src/bin/tui.rs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(entries: &[(&str, &str, &str)]) -> StatsResponse {
        StatsResponse {
            entries: entries
                .iter()
                .map(|(k, l, d)| MetricResponse {
                    key: k.to_string(),
                    label: l.to_string(),
                    display: d.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn comparison_pairs_by_key() {
        let ally = stats(&[("atk_suc", "Attack success", "80.0%"), ("tf", "TF count", "2")]);
        let opp = stats(&[("tf", "TF count", "5")]);
        let rows = comparison_rows(&ally, &opp);
        assert_eq!(rows[0], ("Attack success".to_string(), "80.0%".to_string(), "—".to_string()));
        assert_eq!(rows[1].2, "5");
    }

    #[test]
    fn heatmap_fill_parses_and_renders() {
        let cell: CellResponse = serde_json::from_str(
            r#"{"zone":3,"events":4,"share":0.5,"fill":{"kind":"intensity","bucket":5},"label":"75"}"#,
        )
        .unwrap();
        assert_eq!(cell.fill, FillResponse::Intensity(5));
        assert_eq!(intensity_bar(cell.fill).chars().count(), 6);
        let empty: FillResponse = serde_json::from_str(r#"{"kind":"no_data"}"#).unwrap();
        assert_eq!(intensity_bar(empty), "·");
    }

    #[test]
    fn small_formatters() {
        assert_eq!(format_share(0.25), "25%");
        assert_eq!(zone_name(9), "7m");
        assert_eq!(truncate("Opponent player", 8), "Opponen…");
    }
}
