use crate::error::{AppError, Result};
use crate::types::MatchInfo;

/// Samples taken along each biarc curve when building a zone polygon.
/// Higher values tighten the polygon against the true arc near zone
/// boundaries at the cost of more edges per point-in-polygon test.
pub const CURVE_SAMPLES: usize = 60;

/// A two-minute suspension (or the bench time of a disqualification).
pub const SUSPENSION_SECS: f64 = 120.0;

/// How often the session ticker prunes suspensions and refreshes health (ms).
pub const SESSION_TICK_MS: u64 = 100;

/// Channel capacity for archive write requests.
pub const CHANNEL_CAPACITY: usize = 64;

/// Sort key for player numbers that are not plain digits.
pub const NON_NUMERIC_SORT_KEY: u32 = 999;

/// Court dimensions in meters. Goal centred at x=0 on the goal line y=20.
pub mod court_dims {
    pub const GOAL_Y: f64 = 20.0;
    /// Half the goal width: the posts stand at x = ±HALF_GOAL.
    pub const HALF_GOAL: f64 = 1.5;
    pub const HALF_WIDTH: f64 = 10.0;
    /// Goal-area line.
    pub const INNER_RADIUS: f64 = 6.0;
    /// Free-throw line.
    pub const OUTER_RADIUS: f64 = 9.0;
    /// Far edge of the outer zones.
    pub const OUTER_BASELINE_Y: f64 = 8.0;
    /// The 7-meter throw box.
    pub const PENALTY_BOX_HALF_WIDTH: f64 = 1.5;
    pub const PENALTY_BOX_NEAR_Y: f64 = 17.5;
    pub const PENALTY_BOX_FAR_Y: f64 = 19.5;
}

/// Court window shown to the operator: what a click on the rendered image maps back to.
pub mod court_view {
    pub const X_MIN: f64 = -10.5;
    pub const WIDTH: f64 = 21.0;
    pub const Y_MAX: f64 = 20.5;
    pub const HEIGHT: f64 = 13.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Display name of the recorded side (ALLY_NAME)
    pub ally_name: String,
    /// Display name of the opposing side, also the archive's opponent label (OPPONENT_NAME)
    pub opponent_name: String,
    /// MATCH_TITLE, defaults to `Match_MMDD_HHMM` in local time
    pub match_title: String,
    /// MATCH_DATE as `YYYY-MM-DD`, defaults to today
    pub match_date: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let now = chrono::Local::now();
        let match_date = std::env::var("MATCH_DATE")
            .unwrap_or_else(|_| now.format("%Y-%m-%d").to_string());
        chrono::NaiveDate::parse_from_str(&match_date, "%Y-%m-%d")
            .map_err(|_| AppError::Config("MATCH_DATE must be formatted YYYY-MM-DD".to_string()))?;

        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "analyst.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            ally_name: non_blank_var("ALLY_NAME").unwrap_or_else(|| "Ally".to_string()),
            opponent_name: non_blank_var("OPPONENT_NAME").unwrap_or_else(|| "Opponent".to_string()),
            match_title: non_blank_var("MATCH_TITLE")
                .unwrap_or_else(|| format!("Match_{}", now.format("%m%d_%H%M"))),
            match_date,
        })
    }

    pub fn match_info(&self) -> MatchInfo {
        MatchInfo {
            title: self.match_title.clone(),
            date: self.match_date.clone(),
            ally_name: self.ally_name.clone(),
            opponent_name: self.opponent_name.clone(),
        }
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
