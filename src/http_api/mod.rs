use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::persistence::PersistenceError;
use crate::service::{RegenerationReport, SharedPlanner};
use crate::task::{DaySchedule, Task};

mod refresh;

pub use refresh::spawn_daily_refresh;

pub const DEFAULT_RANGE_DAYS: u32 = 7;

#[derive(Clone)]
pub struct AppState {
    planner: Arc<SharedPlanner>,
}

impl AppState {
    pub fn new(planner: SharedPlanner) -> Self {
        Self {
            planner: Arc::new(planner),
        }
    }

    pub fn with_shared(planner: Arc<SharedPlanner>) -> Self {
        Self { planner }
    }

    fn planner(&self) -> Arc<SharedPlanner> {
        self.planner.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::TaskNotFound(_) => ApiError::NotFound(value.to_string()),
            PersistenceError::InvalidData(_) => ApiError::Invalid(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct UpcomingQuery {
    days: Option<u32>,
    start_date: Option<String>,
}

/// Used both as `?days=` and as the optional JSON body of `/regenerate`.
#[derive(Debug, Default, Deserialize)]
struct RegenerateParams {
    days: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schedule/today", get(today_schedule))
        .route("/schedule/date/:date", get(schedule_for_date))
        .route("/schedule/upcoming", get(upcoming_schedules))
        .route("/tasks/:id/complete", post(complete_task))
        .route("/tasks/:id/uncomplete", post(uncomplete_task))
        .route("/regenerate", post(regenerate))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, planner: Arc<SharedPlanner>) -> std::io::Result<()> {
    let app = router(AppState::with_shared(planner));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::invalid(format!("invalid date '{value}' (expected YYYY-MM-DD)"))
    })
}

fn day_response(date: NaiveDate, day: Option<DaySchedule>) -> Response {
    match day {
        Some(schedule) => Json(schedule).into_response(),
        None => Json(json!({
            "message": format!("No schedule found for {date}"),
            "date": date,
            "tasks": [],
        }))
        .into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn today_schedule(State(state): State<AppState>) -> Result<Response, ApiError> {
    let planner = state.planner();
    let today = planner.today();
    let day = planner.day(today)?;
    Ok(day_response(today, day))
}

async fn schedule_for_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Response, ApiError> {
    let date = parse_date(&date)?;
    let day = state.planner().day(date)?;
    Ok(day_response(date, day))
}

async fn upcoming_schedules(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<DaySchedule>>, ApiError> {
    let planner = state.planner();
    let start = match query.start_date.as_deref() {
        Some(value) => parse_date(value)?,
        None => planner.today(),
    };
    let days = query.days.unwrap_or(DEFAULT_RANGE_DAYS);
    Ok(Json(planner.upcoming(start, days)?))
}

async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.planner().complete_task(task_id)?))
}

async fn uncomplete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.planner().uncomplete_task(task_id)?))
}

/// `days` comes from the query string, then the JSON body, then the default.
async fn regenerate(
    State(state): State<AppState>,
    Query(query): Query<RegenerateParams>,
    payload: Option<Json<RegenerateParams>>,
) -> Result<Json<RegenerationReport>, ApiError> {
    let days = query
        .days
        .or_else(|| payload.and_then(|Json(payload)| payload.days))
        .unwrap_or(DEFAULT_RANGE_DAYS);
    let planner = state.planner();
    let start = planner.today();
    Ok(Json(planner.regenerate(start, days)?))
}
