// src/server.rs
//
// Thin HTTP surface over the engine. Handlers translate between wire DTOs
// and engine calls; every decision stays inside the engine.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::adjustment::AdjustmentRequest;
use crate::engine::AttendanceEngine;
use crate::error::{EngineError, ErrorKind};
use crate::evaluator::{ClockEventKind, GeoPoint};
use crate::late_notice::LateNotice;
use crate::schedule::{DepartmentSchedule, DepartmentShift, Employee, WeekOverrides};

pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("Request failed: {}", self.0);
        let (status, kind) = match self.0.kind() {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::InvalidState => (StatusCode::CONFLICT, "invalid_state"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
        };
        let body = serde_json::json!({
            "error": kind,
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router(engine: Arc<AttendanceEngine>) -> Router {
    Router::new()
        .route("/api/v1/employees", put(upsert_employee))
        .route(
            "/api/v1/employees/{id}/schedule/{date}",
            get(resolved_schedule),
        )
        .route(
            "/api/v1/employees/{id}/attendance/{date}",
            get(attendance_facts),
        )
        .route("/api/v1/departments/{dept}/schedules", put(upsert_schedule))
        .route(
            "/api/v1/departments/{dept}/schedules/{name}",
            delete(remove_schedule),
        )
        .route("/api/v1/departments/{dept}/shifts", put(upsert_shift))
        .route("/api/v1/shifts/{id}", delete(remove_shift))
        .route("/api/v1/shift-assignments", post(assign_shift_range))
        .route("/api/v1/clock-events", post(record_clock_event))
        .route("/api/v1/clock-events/{id}", delete(remove_clock_event))
        .route(
            "/api/v1/employees/{id}/adjustments",
            get(list_adjustments),
        )
        .route(
            "/api/v1/employees/{id}/late-notices",
            get(list_notices),
        )
        .route("/api/v1/adjustments", post(create_adjustment))
        .route("/api/v1/adjustments/{id}/approve", post(approve_adjustment))
        .route("/api/v1/adjustments/{id}/reject", post(reject_adjustment))
        .route("/api/v1/late-notices", post(raise_late_notice))
        .route("/api/v1/late-notices/{id}/justify", post(justify_notice))
        .route("/api/v1/late-notices/{id}/read", post(mark_notice_read))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(engine)
}

// --- Reads ---

async fn resolved_schedule(
    State(engine): State<Arc<AttendanceEngine>>,
    Path((employee_id, date)): Path<(String, NaiveDate)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.resolved_schedule(&employee_id, date)?))
}

async fn attendance_facts(
    State(engine): State<Arc<AttendanceEngine>>,
    Path((employee_id, date)): Path<(String, NaiveDate)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.attendance_facts(&employee_id, date)?))
}

// --- Catalog intake ---

async fn upsert_employee(
    State(engine): State<Arc<AttendanceEngine>>,
    Json(employee): Json<Employee>,
) -> StatusCode {
    engine.configure_employee(employee);
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
struct ScheduleBody {
    name: String,
    entry_time: NaiveTime,
    exit_time: NaiveTime,
    tolerance_minutes: u32,
    #[serde(default)]
    flexible: bool,
    #[serde(default)]
    overrides: WeekOverrides,
}

async fn upsert_schedule(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(department): Path<String>,
    Json(body): Json<ScheduleBody>,
) -> StatusCode {
    engine.upsert_schedule(DepartmentSchedule {
        department,
        name: body.name,
        entry_time: body.entry_time,
        exit_time: body.exit_time,
        tolerance_minutes: body.tolerance_minutes,
        flexible: body.flexible,
        overrides: body.overrides,
    });
    StatusCode::NO_CONTENT
}

async fn remove_schedule(
    State(engine): State<Arc<AttendanceEngine>>,
    Path((department, name)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    engine.remove_schedule(&department, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct ShiftBody {
    id: String,
    name: String,
    entry_time: NaiveTime,
    exit_time: NaiveTime,
    #[serde(default)]
    exit_time_morning: Option<NaiveTime>,
    #[serde(default)]
    entry_time_afternoon: Option<NaiveTime>,
    tolerance_minutes: u32,
    #[serde(default)]
    flexible: bool,
    active_weekdays: HashSet<Weekday>,
}

async fn upsert_shift(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(department): Path<String>,
    Json(body): Json<ShiftBody>,
) -> StatusCode {
    engine.upsert_shift(DepartmentShift {
        id: body.id,
        department,
        name: body.name,
        entry_time: body.entry_time,
        exit_time: body.exit_time,
        exit_time_morning: body.exit_time_morning,
        entry_time_afternoon: body.entry_time_afternoon,
        tolerance_minutes: body.tolerance_minutes,
        flexible: body.flexible,
        active_weekdays: body.active_weekdays,
    });
    StatusCode::NO_CONTENT
}

async fn remove_shift(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(shift_id): Path<String>,
) -> ApiResult<StatusCode> {
    engine.remove_shift(&shift_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct AssignRangeBody {
    employee_id: String,
    shift_id: String,
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Serialize)]
struct AssignRangeResponse {
    assigned: usize,
}

async fn assign_shift_range(
    State(engine): State<Arc<AttendanceEngine>>,
    Json(body): Json<AssignRangeBody>,
) -> ApiResult<impl IntoResponse> {
    let assigned =
        engine.assign_shift_range(&body.employee_id, &body.shift_id, body.from, body.to)?;
    Ok(Json(AssignRangeResponse { assigned }))
}

// --- Clock events ---

#[derive(Deserialize)]
struct ClockEventBody {
    employee_id: String,
    kind: ClockEventKind,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    location: Option<GeoPoint>,
}

async fn record_clock_event(
    State(engine): State<Arc<AttendanceEngine>>,
    Json(body): Json<ClockEventBody>,
) -> ApiResult<impl IntoResponse> {
    let event =
        engine.record_clock_event(&body.employee_id, body.kind, body.timestamp, body.location)?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn remove_clock_event(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(event_id): Path<String>,
) -> ApiResult<StatusCode> {
    if engine.remove_clock_event(&event_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(EngineError::ClockEventNotFound(event_id).into())
    }
}

// --- Adjustment workflow ---

async fn list_adjustments(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(employee_id): Path<String>,
) -> Json<Vec<AdjustmentRequest>> {
    Json(engine.adjustments_for_employee(&employee_id))
}

#[derive(Deserialize)]
struct CreateAdjustmentBody {
    employee_id: String,
    clock_event_id: String,
    requested_timestamp: DateTime<Utc>,
    reason: String,
}

async fn create_adjustment(
    State(engine): State<Arc<AttendanceEngine>>,
    Json(body): Json<CreateAdjustmentBody>,
) -> ApiResult<impl IntoResponse> {
    let request = engine.create_adjustment(
        &body.employee_id,
        &body.clock_event_id,
        body.requested_timestamp,
        &body.reason,
    )?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Deserialize)]
struct ApproveBody {
    supervisor_id: String,
}

async fn approve_adjustment(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(request_id): Path<String>,
    Json(body): Json<ApproveBody>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        engine.approve_adjustment(&request_id, &body.supervisor_id)?,
    ))
}

#[derive(Deserialize)]
struct RejectBody {
    supervisor_id: String,
    rejection_reason: String,
}

async fn reject_adjustment(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(request_id): Path<String>,
    Json(body): Json<RejectBody>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.reject_adjustment(
        &request_id,
        &body.supervisor_id,
        &body.rejection_reason,
    )?))
}

// --- Late-notice ledger ---

async fn list_notices(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(employee_id): Path<String>,
) -> Json<Vec<LateNotice>> {
    Json(engine.notices_for_employee(&employee_id))
}

#[derive(Deserialize)]
struct RaiseNoticeBody {
    supervisor_id: String,
    employee_id: String,
    clock_event_id: String,
    date: NaiveDate,
}

async fn raise_late_notice(
    State(engine): State<Arc<AttendanceEngine>>,
    Json(body): Json<RaiseNoticeBody>,
) -> ApiResult<impl IntoResponse> {
    let notice = engine.raise_late_notice(
        &body.supervisor_id,
        &body.employee_id,
        &body.clock_event_id,
        body.date,
    )?;
    Ok((StatusCode::CREATED, Json(notice)))
}

#[derive(Deserialize)]
struct JustifyBody {
    employee_id: String,
    text: String,
}

async fn justify_notice(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(notice_id): Path<String>,
    Json(body): Json<JustifyBody>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.justify_late_notice(
        &notice_id,
        &body.employee_id,
        &body.text,
    )?))
}

async fn mark_notice_read(
    State(engine): State<Arc<AttendanceEngine>>,
    Path(notice_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.mark_notice_read(&notice_id)?))
}
