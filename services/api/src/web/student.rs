//! services/api/src/web/student.rs
//!
//! The student agenda and its three actions: presence wave, check-in, and
//! check-out. Handlers consult the eligibility gate before recording, so the
//! time-window rules are enforced server-side, not just hinted to the UI.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use here_core::domain::{DayStatus, GeoPoint, Role, Section};
use here_core::eligibility::{check_action, Action, Eligibility};

use crate::web::identity::{ApiRole, Identity};
use crate::web::rest::{infra_error, section_type_label, ActionHint, ActionResponse};
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
pub struct AgendaQuery {
    /// The calendar date to show, e.g. `2026-01-13`.
    pub date: NaiveDate,
}

/// One section card on the student agenda.
#[derive(Serialize, ToSchema)]
pub struct AgendaEntry {
    pub id: Uuid,
    pub name: String,
    pub section_type: String,
    pub start_time: String,
    pub end_time: String,
    pub presence_enabled: bool,
    pub requires_check_in: bool,
    pub has_checked_in: bool,
    pub has_checked_out: bool,
    pub has_waved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plans: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    pub wave: ActionHint,
    pub check_in: ActionHint,
    pub check_out: ActionHint,
}

#[derive(Deserialize, ToSchema)]
pub struct WaveRequest {
    /// Mood emoji to attach to the wave; defaults to a plain wave.
    pub mood: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckInRequest {
    /// What the student plans to work on this session.
    pub plans: String,
    pub location: Option<LocationPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckOutRequest {
    /// What the student got done this session.
    pub progress: String,
}

#[derive(Deserialize, Serialize, Clone, Copy, ToSchema)]
pub struct LocationPayload {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LocationPayload> for GeoPoint {
    fn from(value: LocationPayload) -> Self {
        GeoPoint {
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// The student's schedule for a date, with per-section day status and
/// eligibility hints.
#[utoipa::path(
    get,
    path = "/student/agenda",
    params(AgendaQuery),
    responses(
        (status = 200, description = "Active sections for the date", body = [AgendaEntry]),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn agenda_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<AgendaQuery>,
) -> Result<Json<Vec<AgendaEntry>>, (StatusCode, String)> {
    identity.require(ApiRole::Student)?;

    let sections = state
        .schedule
        .active_sections(identity.user_id, Role::Student, query.date)
        .await
        .map_err(infra_error)?;

    let now = state.clock.now();
    let mut entries = Vec::with_capacity(sections.len());
    for section in sections {
        let status = state
            .attendance
            .get_status(identity.user_id, section.id, query.date)
            .await
            .map_err(infra_error)?;
        entries.push(agenda_entry(&section, &status, now, query.date));
    }
    Ok(Json(entries))
}

fn agenda_entry(
    section: &Section,
    status: &DayStatus,
    now: chrono::DateTime<chrono::FixedOffset>,
    date: NaiveDate,
) -> AgendaEntry {
    let hint = |action| ActionHint::from(check_action(section, action, status, now, date));
    AgendaEntry {
        id: section.id,
        name: section.name.clone(),
        section_type: section_type_label(section.section_type).to_string(),
        start_time: section.start_time.format("%H:%M").to_string(),
        end_time: section.end_time.format("%H:%M").to_string(),
        presence_enabled: section.presence_enabled,
        requires_check_in: section.requires_check_in(),
        has_checked_in: status.has_checked_in,
        has_checked_out: status.has_checked_out,
        has_waved: status.has_waved,
        plans: status.plans.clone(),
        progress: status.progress.clone(),
        wave: hint(Action::Wave),
        check_in: hint(Action::CheckIn),
        check_out: hint(Action::CheckOut),
    }
}

/// Runs the eligibility gate for an action against today's status. Returns
/// the denial as an `ActionResponse` when the gate says no.
async fn gate(
    state: &AppState,
    student_id: Uuid,
    section_id: Uuid,
    action: Action,
) -> Result<Result<(), ActionResponse>, (StatusCode, String)> {
    let Some(section) = state
        .store
        .section_by_id(section_id)
        .await
        .map_err(infra_error)?
    else {
        return Ok(Err(ActionResponse::denied("Section not found")));
    };
    let today = state.clock.today();
    let status = state
        .attendance
        .get_status(student_id, section_id, today)
        .await
        .map_err(infra_error)?;
    match check_action(&section, action, &status, state.clock.now(), today) {
        Eligibility::Allowed => Ok(Ok(())),
        Eligibility::Denied { reason, .. } => Ok(Err(ActionResponse::denied(reason))),
    }
}

/// Record a presence wave for a section.
#[utoipa::path(
    post,
    path = "/student/sections/{id}/wave",
    request_body = WaveRequest,
    params(("id" = Uuid, Path, description = "The section id")),
    responses(
        (status = 200, description = "Outcome of the wave", body = ActionResponse),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn wave_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<WaveRequest>,
) -> Result<Json<ActionResponse>, (StatusCode, String)> {
    identity.require(ApiRole::Student)?;

    if let Err(denied) = gate(&state, identity.user_id, section_id, Action::Wave).await? {
        return Ok(Json(denied));
    }
    let outcome = state
        .attendance
        .record_presence_wave(identity.user_id, section_id, req.mood)
        .await
        .map_err(infra_error)?;
    Ok(Json(outcome.into()))
}

/// Check in to a remote or internship section with today's plans.
#[utoipa::path(
    post,
    path = "/student/sections/{id}/check-in",
    request_body = CheckInRequest,
    params(("id" = Uuid, Path, description = "The section id")),
    responses(
        (status = 200, description = "Outcome of the check-in", body = ActionResponse),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn check_in_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<CheckInRequest>,
) -> Result<Json<ActionResponse>, (StatusCode, String)> {
    identity.require(ApiRole::Student)?;

    if let Err(denied) = gate(&state, identity.user_id, section_id, Action::CheckIn).await? {
        return Ok(Json(denied));
    }
    let outcome = state
        .attendance
        .record_check_in(
            identity.user_id,
            section_id,
            &req.plans,
            req.location.map(GeoPoint::from),
        )
        .await
        .map_err(infra_error)?;
    Ok(Json(outcome.into()))
}

/// Check out of a section with a progress summary. Available any time after
/// check-in, including well past the section end.
#[utoipa::path(
    post,
    path = "/student/sections/{id}/check-out",
    request_body = CheckOutRequest,
    params(("id" = Uuid, Path, description = "The section id")),
    responses(
        (status = 200, description = "Outcome of the check-out", body = ActionResponse),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn check_out_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<CheckOutRequest>,
) -> Result<Json<ActionResponse>, (StatusCode, String)> {
    identity.require(ApiRole::Student)?;

    if let Err(denied) = gate(&state, identity.user_id, section_id, Action::CheckOut).await? {
        return Ok(Json(denied));
    }
    let outcome = state
        .attendance
        .record_check_out(identity.user_id, section_id, &req.progress)
        .await
        .map_err(infra_error)?;
    Ok(Json(outcome.into()))
}
