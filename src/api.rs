use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;

use crate::aggregate::{AggregateTable, ChartSeries};
use crate::config::Sector;
use crate::records::{RecordFilter, SentimentRecord};
use crate::runner::Runner;
use crate::session::RunSnapshot;

#[derive(Clone)]
pub struct AppState {
    runner: Arc<Runner>,
}

impl AppState {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self { runner }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/sectors", get(sectors))
        .route("/run", post(run))
        .route("/records", get(records))
        .route("/instruments", get(instruments))
        .route("/aggregate", get(aggregate))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiError = (StatusCode, String);

fn no_run_yet() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        "no completed run yet; POST /run first".to_string(),
    )
}

fn current(state: &AppState) -> Result<Arc<RunSnapshot>, ApiError> {
    state.runner.session().current().ok_or_else(no_run_yet)
}

#[derive(serde::Serialize)]
struct SectorsOut {
    sectors: Vec<Sector>,
    article_limit_min: usize,
    article_limit_max: usize,
    article_limit_default: usize,
}

async fn sectors(State(state): State<AppState>) -> Json<SectorsOut> {
    let s = state.runner.settings();
    Json(SectorsOut {
        sectors: state.runner.sectors().sectors().to_vec(),
        article_limit_min: s.article_limit_min,
        article_limit_max: s.article_limit_max,
        article_limit_default: s.article_limit_default,
    })
}

#[derive(serde::Deserialize)]
struct RunReq {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(serde::Serialize)]
struct RunOut {
    sector: String,
    feed_url: String,
    completed_at: DateTime<Utc>,
    entries_seen: usize,
    records: usize,
    extraction_failures: usize,
    model_failures: usize,
    approx_tokens: u64,
    estimated_cost_usd: f64,
    csv_path: Option<PathBuf>,
}

impl From<&RunSnapshot> for RunOut {
    fn from(s: &RunSnapshot) -> Self {
        Self {
            sector: s.sector.clone(),
            feed_url: s.report.feed_url.clone(),
            completed_at: s.completed_at,
            entries_seen: s.report.entries_seen,
            records: s.report.records.len(),
            extraction_failures: s.report.extraction_failures,
            model_failures: s.report.model_failures,
            approx_tokens: s.report.approx_tokens as u64,
            estimated_cost_usd: s.report.estimated_cost_usd,
            csv_path: s.csv_path.clone(),
        }
    }
}

async fn run(
    State(state): State<AppState>,
    Json(body): Json<RunReq>,
) -> Result<Json<RunOut>, ApiError> {
    let (sector, limit) = state
        .runner
        .resolve(body.sector.as_deref(), body.limit)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let snapshot = state.runner.run(&sector, limit).await;
    Ok(Json(RunOut::from(snapshot.as_ref())))
}

async fn records(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> Result<Json<Vec<SentimentRecord>>, ApiError> {
    let snap = current(&state)?;
    Ok(Json(snap.filtered(&filter)))
}

async fn instruments(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let snap = current(&state)?;
    Ok(Json(snap.instruments()))
}

#[derive(serde::Serialize)]
struct AggregateOut {
    instruments: Vec<String>,
    table: AggregateTable,
    series: Vec<ChartSeries>,
}

async fn aggregate(State(state): State<AppState>) -> Result<Json<AggregateOut>, ApiError> {
    let snap = current(&state)?;
    let table = snap.aggregate();
    Ok(Json(AggregateOut {
        instruments: table.instruments().into_iter().map(str::to_string).collect(),
        series: table.series(),
        table,
    }))
}
