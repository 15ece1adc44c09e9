//! services/api/src/web/teacher.rs
//!
//! The teacher agenda: which sections meet on a date, each with its full
//! roster and the day's signals, plus the attendance-marking action.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use here_core::domain::{MarkStatus, Role};
use here_core::roster::{MarkEntry, MarkSaveOutcome, RosterEntry};

use crate::web::identity::{ApiRole, Identity};
use crate::web::rest::{infra_error, section_type_label};
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
pub struct TeacherAgendaQuery {
    pub date: NaiveDate,
}

/// One student row in a section's roster, as shown in the marking view.
#[derive(Serialize, ToSchema)]
pub struct RosterStudentPayload {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_mood: Option<String>,
    pub has_checked_in: bool,
    pub has_checked_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plans: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
}

/// One section on the teacher agenda, with roster detail and summary counts.
#[derive(Serialize, ToSchema)]
pub struct TeacherAgendaEntry {
    pub id: Uuid,
    pub name: String,
    pub section_type: String,
    pub start_time: String,
    pub end_time: String,
    pub attendance_enabled: bool,
    pub presence_enabled: bool,
    pub total_students: usize,
    pub marked_students: usize,
    pub presence_count: usize,
    pub checked_in_count: usize,
    pub students: Vec<RosterStudentPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveAttendanceRequest {
    pub date: NaiveDate,
    pub entries: Vec<MarkEntryPayload>,
}

/// A requested mark for one student. An absent or empty `status` clears any
/// existing mark.
#[derive(Deserialize, ToSchema)]
pub struct MarkEntryPayload {
    pub student_id: Uuid,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SaveAttendanceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_count: Option<usize>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// The teacher's sections meeting on a date, each with its roster.
#[utoipa::path(
    get,
    path = "/teacher/agenda",
    params(TeacherAgendaQuery),
    responses(
        (status = 200, description = "Active sections with rosters", body = [TeacherAgendaEntry]),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn agenda_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<TeacherAgendaQuery>,
) -> Result<Json<Vec<TeacherAgendaEntry>>, (StatusCode, String)> {
    identity.require(ApiRole::Teacher)?;

    let sections = state
        .schedule
        .active_sections(identity.user_id, Role::Teacher, query.date)
        .await
        .map_err(infra_error)?;

    let mut entries = Vec::with_capacity(sections.len());
    for section in sections {
        let roster = state
            .roster
            .section_roster(section.id, query.date)
            .await
            .map_err(infra_error)?;
        let students: Vec<RosterStudentPayload> =
            roster.into_iter().map(roster_student).collect();
        entries.push(TeacherAgendaEntry {
            id: section.id,
            name: section.name.clone(),
            section_type: section_type_label(section.section_type).to_string(),
            start_time: section.start_time.format("%H:%M").to_string(),
            end_time: section.end_time.format("%H:%M").to_string(),
            attendance_enabled: section.attendance_enabled,
            presence_enabled: section.presence_enabled,
            total_students: students.len(),
            marked_students: students
                .iter()
                .filter(|s| s.attendance_status.is_some())
                .count(),
            presence_count: students.iter().filter(|s| s.presence_mood.is_some()).count(),
            checked_in_count: students.iter().filter(|s| s.has_checked_in).count(),
            students,
        });
    }
    Ok(Json(entries))
}

fn roster_student(entry: RosterEntry) -> RosterStudentPayload {
    RosterStudentPayload {
        id: entry.student.id,
        first_name: entry.student.first_name,
        last_name: entry.student.last_name,
        email: entry.student.email,
        attendance_status: entry.mark.as_ref().map(|m| mark_label(m.status).to_string()),
        attendance_notes: entry.mark.and_then(|m| m.notes),
        presence_mood: entry.mood,
        has_checked_in: entry.status.has_checked_in,
        has_checked_out: entry.status.has_checked_out,
        check_in_verified: entry.check_in_verified,
        plans: entry.status.plans,
        progress: entry.status.progress,
    }
}

fn mark_label(status: MarkStatus) -> &'static str {
    match status {
        MarkStatus::Present => "present",
        MarkStatus::Absent => "absent",
        MarkStatus::Excused => "excused",
    }
}

fn parse_mark(value: &str) -> Option<MarkStatus> {
    match value {
        "present" => Some(MarkStatus::Present),
        "absent" => Some(MarkStatus::Absent),
        "excused" => Some(MarkStatus::Excused),
        _ => None,
    }
}

/// Save or clear attendance marks for a section on a date.
#[utoipa::path(
    post,
    path = "/teacher/sections/{id}/attendance",
    request_body = SaveAttendanceRequest,
    params(("id" = Uuid, Path, description = "The section id")),
    responses(
        (status = 200, description = "Outcome of the save", body = SaveAttendanceResponse),
        (status = 400, description = "Unrecognized attendance status"),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn save_attendance_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<SaveAttendanceRequest>,
) -> Result<Json<SaveAttendanceResponse>, (StatusCode, String)> {
    identity.require(ApiRole::Teacher)?;

    let mut entries = Vec::with_capacity(req.entries.len());
    for payload in &req.entries {
        let status = match payload.status.as_deref() {
            // An unmarked student clears any existing record.
            None | Some("") => None,
            Some(raw) => Some(parse_mark(raw).ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Unrecognized attendance status '{raw}'"),
                )
            })?),
        };
        entries.push(MarkEntry {
            student_id: payload.student_id,
            status,
            notes: payload.notes.clone(),
        });
    }

    let outcome = state
        .roster
        .save_marks(identity.user_id, section_id, req.date, &entries)
        .await
        .map_err(infra_error)?;
    Ok(Json(match outcome {
        MarkSaveOutcome::Saved { saved } => SaveAttendanceResponse {
            success: true,
            error: None,
            saved_count: Some(saved),
        },
        MarkSaveOutcome::Denied { reason } => SaveAttendanceResponse {
            success: false,
            error: Some(reason),
            saved_count: None,
        },
    }))
}
