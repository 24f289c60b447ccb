use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{info, warn};

use crate::api::health::{now_ms, HealthSnapshot, HealthState};
use crate::config::court_view;
use crate::court::classifier::ZoneOutline;
use crate::db::reader::load_all;
use crate::db::writer::ArchiveRequest;
use crate::error::AppError;
use crate::export::{read_csv, write_csv};
use crate::state::archive_cache::MatchSummary;
use crate::state::match_session::{ClockView, RecordRequest, SessionSnapshot, StatsView};
use crate::state::{ArchiveCache, MatchSession};
use crate::stats::{project, Heatmap, MatchReport};
use crate::types::{MatchInfo, PenaltyKind, Period, Player, Position, ShotEvent, Team, ZoneId};

#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<Mutex<MatchSession>>,
    pub pool: sqlx::SqlitePool,
    pub archive_tx: mpsc::Sender<ArchiveRequest>,
    pub cache: Arc<ArchiveCache>,
    pub health: Arc<HealthState>,
    /// Held for a whole archive sync so two syncs never take the same batch.
    pub sync_lock: Arc<Mutex<()>>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/session", get(get_session).put(put_session_info))
        .route("/clock/toggle", post(toggle_clock))
        .route("/period", put(put_period))
        .route("/roster/:team", get(get_roster).post(post_player))
        .route("/roster/:team/:number", put(put_player).delete(delete_player))
        .route("/penalties", post(post_penalty))
        .route("/goalkeepers/:team", put(put_goalkeeper))
        .route("/court/zones", get(get_zones))
        .route("/zone/click", post(post_zone_click))
        .route("/zone", post(post_zone))
        .route("/events", get(get_events).post(post_event))
        .route("/stats/report", get(get_report))
        .route("/stats/:team", get(get_team_stats))
        .route("/heatmap/:team", get(get_heatmap))
        .route("/reset", post(post_reset))
        .route("/export.csv", get(get_export))
        .route("/archive/sync", post(post_archive_sync))
        .route("/archive/reload", post(post_archive_reload))
        .route("/archive/import", post(post_archive_import))
        .route("/archive/matches", get(get_archived_matches))
        .route("/archive/matches/:label", get(get_archived_match))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct PeriodRequest {
    pub period: Period,
}

#[derive(Deserialize)]
pub struct NewPlayerRequest {
    pub number: String,
    #[serde(default)]
    pub name: String,
    pub position: Position,
}

#[derive(Deserialize)]
pub struct PenaltyRequest {
    pub team: Team,
    pub number: String,
    pub kind: PenaltyKind,
}

#[derive(Deserialize)]
pub struct GoalkeeperRequest {
    pub number: Option<String>,
}

/// A click on the rendered court image, in pixels from its top-left corner.
#[derive(Deserialize)]
pub struct ClickRequest {
    pub px: f64,
    pub py: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Deserialize)]
pub struct ZoneRequest {
    pub zone: ZoneId,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub team: Option<Team>,
    pub period: Option<Period>,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub player: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ZoneSelection {
    /// Court coordinates the click mapped to.
    pub x: f64,
    pub y: f64,
    /// Whether the click landed inside a zone.
    pub hit: bool,
    pub selected: Option<ZoneId>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub written: usize,
    /// False when the session was reset while the batch was being written.
    pub acknowledged: bool,
}

#[derive(Debug, Serialize)]
pub struct ArchivedMatchResponse {
    pub summary: MatchSummary,
    pub report: MatchReport,
    pub ally_heatmap: Heatmap,
    pub opponent_heatmap: Heatmap,
}

/// Maps a pixel on the court image to court meters.
pub fn pixel_to_court(px: f64, py: f64, width: f64, height: f64) -> (f64, f64) {
    let x = px / width * court_view::WIDTH + court_view::X_MIN;
    let y = court_view::Y_MAX - py / height * court_view::HEIGHT;
    (x, y)
}

// ---------------------------------------------------------------------------
// Handlers: live session
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot())
}

async fn get_session(State(state): State<ApiState>) -> Json<SessionSnapshot> {
    let session = state.session.lock().await;
    Json(session.snapshot(Instant::now()))
}

async fn put_session_info(
    State(state): State<ApiState>,
    Json(info): Json<MatchInfo>,
) -> Result<Json<SessionSnapshot>, AppError> {
    chrono::NaiveDate::parse_from_str(&info.date, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput("date must be formatted YYYY-MM-DD".to_string()))?;
    if info.title.trim().is_empty() {
        return Err(AppError::InvalidInput("match title is required".to_string()));
    }
    let mut session = state.session.lock().await;
    session.update_info(info);
    Ok(Json(session.snapshot(Instant::now())))
}

async fn toggle_clock(State(state): State<ApiState>) -> Json<ClockView> {
    let now = Instant::now();
    let mut session = state.session.lock().await;
    session.toggle_clock(now);
    Json(session.snapshot(now).clock)
}

async fn put_period(
    State(state): State<ApiState>,
    Json(req): Json<PeriodRequest>,
) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.set_period(req.period);
    Json(session.snapshot(Instant::now()))
}

async fn get_roster(
    State(state): State<ApiState>,
    Path(team): Path<Team>,
) -> Json<Vec<Player>> {
    Json(state.session.lock().await.roster(team))
}

async fn post_player(
    State(state): State<ApiState>,
    Path(team): Path<Team>,
    Json(req): Json<NewPlayerRequest>,
) -> Result<Json<Player>, AppError> {
    let mut session = state.session.lock().await;
    let player = session.register_player(team, &req.number, &req.name, req.position)?;
    Ok(Json(player))
}

async fn put_player(
    State(state): State<ApiState>,
    Path((team, number)): Path<(Team, String)>,
    Json(player): Json<Player>,
) -> Result<Json<Player>, AppError> {
    let mut session = state.session.lock().await;
    Ok(Json(session.update_player(team, &number, player)?))
}

async fn delete_player(
    State(state): State<ApiState>,
    Path((team, number)): Path<(Team, String)>,
) -> Result<Json<Player>, AppError> {
    let mut session = state.session.lock().await;
    Ok(Json(session.remove_player(team, &number)?))
}

async fn post_penalty(
    State(state): State<ApiState>,
    Json(req): Json<PenaltyRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let now = Instant::now();
    let mut session = state.session.lock().await;
    session.register_penalty(req.team, &req.number, req.kind, now)?;
    Ok(Json(session.snapshot(now)))
}

async fn put_goalkeeper(
    State(state): State<ApiState>,
    Path(team): Path<Team>,
    Json(req): Json<GoalkeeperRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let mut session = state.session.lock().await;
    session.set_active_goalkeeper(team, req.number.as_deref())?;
    Ok(Json(session.snapshot(Instant::now())))
}

async fn get_zones(State(state): State<ApiState>) -> Json<Vec<ZoneOutline>> {
    Json(state.session.lock().await.geometry().outlines())
}

async fn post_zone_click(
    State(state): State<ApiState>,
    Json(req): Json<ClickRequest>,
) -> Result<Json<ZoneSelection>, AppError> {
    if !(req.width > 0.0 && req.height > 0.0) {
        return Err(AppError::InvalidInput("image width and height must be positive".to_string()));
    }
    let (x, y) = pixel_to_court(req.px, req.py, req.width, req.height);
    let mut session = state.session.lock().await;
    let hit = session.geometry().classify(x, y).is_some();
    let selected = session.select_zone_at(x, y);
    Ok(Json(ZoneSelection { x, y, hit, selected }))
}

async fn post_zone(
    State(state): State<ApiState>,
    Json(req): Json<ZoneRequest>,
) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.select_zone(req.zone);
    Json(session.snapshot(Instant::now()))
}

async fn get_events(
    State(state): State<ApiState>,
    Query(params): Query<EventsQuery>,
) -> Json<Vec<ShotEvent>> {
    let session = state.session.lock().await;
    Json(session.log().filtered(params.team, params.period))
}

async fn post_event(
    State(state): State<ApiState>,
    Json(req): Json<RecordRequest>,
) -> Result<Json<ShotEvent>, AppError> {
    let mut session = state.session.lock().await;
    Ok(Json(session.record(req, Instant::now())?))
}

async fn get_report(State(state): State<ApiState>) -> Json<MatchReport> {
    Json(state.session.lock().await.report())
}

async fn get_team_stats(
    State(state): State<ApiState>,
    Path(team): Path<Team>,
    Query(params): Query<StatsQuery>,
) -> Json<StatsView> {
    let session = state.session.lock().await;
    Json(session.stats(team, params.player.as_deref()))
}

async fn get_heatmap(
    State(state): State<ApiState>,
    Path(team): Path<Team>,
) -> Json<Heatmap> {
    Json(state.session.lock().await.heatmap(team))
}

async fn post_reset(State(state): State<ApiState>) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.reset();
    Json(session.snapshot(Instant::now()))
}

async fn get_export(State(state): State<ApiState>) -> Result<impl IntoResponse, AppError> {
    let session = state.session.lock().await;
    let info = session.info();
    let body = write_csv(info, session.events())?;
    let disposition = format!(
        "attachment; filename=\"{}_{}.csv\"",
        info.date,
        info.title.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

// ---------------------------------------------------------------------------
// Handlers: archive
// ---------------------------------------------------------------------------

/// Hands the not-yet-archived events to the writer task. The session lock is
/// released while the write is in flight; the cursor moves only on success.
/// `sync_lock` is held throughout, so a concurrent sync waits and then sees
/// only what is still unarchived.
async fn post_archive_sync(State(state): State<ApiState>) -> Result<Json<SyncResponse>, AppError> {
    let _sync = state.sync_lock.lock().await;
    let batch = state.session.lock().await.archive_batch();
    if batch.events.is_empty() {
        return Ok(Json(SyncResponse { written: 0, acknowledged: true }));
    }
    let info = batch.info.clone();
    let events = batch.events.clone();
    let generation = batch.generation;

    let (reply_tx, reply_rx) = oneshot::channel();
    state.health.inc_archive_pending();
    let sent = state
        .archive_tx
        .send(ArchiveRequest { batch, reply: reply_tx })
        .await;
    let result = match sent {
        Ok(()) => reply_rx
            .await
            .unwrap_or_else(|_| Err(AppError::ArchiveUnavailable("archive writer dropped the request".to_string()))),
        Err(_) => Err(AppError::ArchiveUnavailable("archive writer is not running".to_string())),
    };
    state.health.dec_archive_pending();
    let written = result?;

    Ok(Json(acknowledge_sync(&state, &info, &events[..written.min(events.len())], generation).await))
}

/// Records a committed archive write: the rows are in storage whatever happened
/// to the session since, so the cache always gets them; the cursor only moves
/// if the log was not reset meanwhile.
async fn acknowledge_sync(
    state: &ApiState,
    info: &MatchInfo,
    written: &[ShotEvent],
    generation: u64,
) -> SyncResponse {
    state.health.set_last_archive_at_ms(now_ms());
    state.cache.append(info, written);
    let acknowledged = state.session.lock().await.mark_archived(generation, written.len());
    if !acknowledged {
        warn!(written = written.len(), "Session was reset during archive sync, cursor left unchanged");
    }
    SyncResponse { written: written.len(), acknowledged }
}

async fn post_archive_reload(
    State(state): State<ApiState>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    let matches = load_all(&state.pool).await?;
    state.cache.replace_all(matches);
    Ok(Json(state.cache.summaries()))
}

/// Body is a CSV export, as produced by `/export.csv`.
async fn post_archive_import(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    let matches = read_csv(&body)?;
    for m in matches {
        info!(label = %m.label, events = m.events.len(), "Imported match into archive cache");
        state.cache.insert(m);
    }
    Ok(Json(state.cache.summaries()))
}

async fn get_archived_matches(State(state): State<ApiState>) -> Json<Vec<MatchSummary>> {
    Json(state.cache.summaries())
}

async fn get_archived_match(
    State(state): State<ApiState>,
    Path(label): Path<String>,
) -> Result<Json<ArchivedMatchResponse>, AppError> {
    let m = state
        .cache
        .get(&label)
        .ok_or_else(|| AppError::NotFound(format!("archived match '{label}'")))?;
    let geometry = state.session.lock().await.geometry().clone();
    Ok(Json(ArchivedMatchResponse {
        summary: m.summary(),
        report: MatchReport::build(&m.events),
        ally_heatmap: project(&geometry, Team::Ally, &m.events),
        opponent_heatmap: project(&geometry, Team::Opponent, &m.events),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
