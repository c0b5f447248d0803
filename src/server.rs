// src/server.rs
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;
use crate::group_assigner::{GroupColors, GroupRules};
use crate::schedule_state::{current_day_label, status_message, ScheduleState, StatusOutcome};
use crate::storage::KeyValueStore;
use crate::views::{
    compare_view, daily_summary, individual_view, table_rows, CompareRow, DailySummary,
    IndividualView, TableRow,
};

// --- Shared Application State ---

struct Inner {
    schedule: ScheduleState,
    store: Box<dyn KeyValueStore + Send>,
}

/// One lock around the schedule and its store; handlers run to completion
/// under it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<Inner>>,
}

impl AppState {
    pub fn new(schedule: ScheduleState, store: Box<dyn KeyValueStore + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { schedule, store })),
        }
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

// --- Request / Response Bodies ---

#[derive(Deserialize, Debug, Default)]
pub struct RosterParams {
    #[serde(default)]
    filter: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ImportParams {
    filename: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CompareRequest {
    names: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct StatusResponse {
    employees: usize,
    year: i32,
    month: u32,
    days_in_month: u32,
    selected_day: u32,
    theme: &'static str,
    current_day: String,
}

#[derive(Serialize, Debug)]
pub struct ImportResponse {
    imported: usize,
    message: String,
}

#[derive(Serialize, Debug)]
pub struct GroupsResponse {
    rules: GroupRules,
    colors: GroupColors,
}

// --- Routes ---

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/roster", get(handle_roster))
        .route("/day/{day}", get(handle_day))
        .route("/employee/{name}", get(handle_employee))
        .route("/compare", post(handle_compare))
        .route("/import", post(handle_import))
        .route("/groups", get(handle_groups));

    Router::new()
        .nest("/api", api_routes)
        .route("/status", get(handle_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting server on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// --- Web Handlers ---

async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let guard = state.inner.lock().await;
    let schedule = &guard.schedule;
    let month = schedule.month();
    Json(StatusResponse {
        employees: schedule.roster().len(),
        year: month.year,
        month: month.month,
        days_in_month: month.days_in_month,
        selected_day: schedule.selected_day(),
        theme: schedule.theme().as_str(),
        current_day: current_day_label(now()),
    })
}

async fn handle_roster(
    State(state): State<AppState>,
    Query(params): Query<RosterParams>,
) -> Json<Vec<TableRow>> {
    let guard = state.inner.lock().await;
    let schedule = &guard.schedule;
    Json(table_rows(
        schedule.roster(),
        schedule.month(),
        schedule.rules(),
        &params.filter,
    ))
}

async fn handle_day(
    State(state): State<AppState>,
    Path(day): Path<u32>,
) -> Result<Json<DailySummary>> {
    let guard = state.inner.lock().await;
    let schedule = &guard.schedule;
    let summary = daily_summary(schedule.roster(), day, schedule.month(), schedule.rules())?;
    Ok(Json(summary))
}

async fn handle_employee(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<IndividualView>> {
    let guard = state.inner.lock().await;
    let schedule = &guard.schedule;
    let view = individual_view(schedule.roster(), &name, schedule.month())?;
    Ok(Json(view))
}

async fn handle_compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<Vec<CompareRow>>> {
    let guard = state.inner.lock().await;
    let schedule = &guard.schedule;
    let rows = compare_view(
        schedule.roster(),
        &request.names,
        schedule.month(),
        schedule.rules(),
    )?;
    Ok(Json(rows))
}

async fn handle_import(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: String,
) -> Result<Json<ImportResponse>> {
    let mut guard = state.inner.lock().await;
    let Inner { schedule, store } = &mut *guard;

    let imported = schedule.import(store.as_mut(), &body, params.filename.as_deref(), now())?;
    info!("Import via HTTP: {} employees", imported);
    Ok(Json(ImportResponse {
        imported,
        message: status_message(&StatusOutcome::Imported(imported)),
    }))
}

async fn handle_groups(State(state): State<AppState>) -> Json<GroupsResponse> {
    let guard = state.inner.lock().await;
    Json(GroupsResponse {
        rules: guard.schedule.rules().clone(),
        colors: guard.schedule.colors().clone(),
    })
}
