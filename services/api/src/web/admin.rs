//! services/api/src/web/admin.rs
//!
//! Administrator endpoints: the calendar (bulk CSV import, single-day
//! overrides, range listing) and section enrollment management.

use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use here_core::calendar::{CalendarImportRow, ImportOutcome};
use here_core::domain::{AbDay, CalendarDay};

use crate::web::identity::{ApiRole, Identity};
use crate::web::rest::{infra_error, ActionResponse};
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
pub struct CalendarRangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct CalendarDayPayload {
    pub date: NaiveDate,
    pub is_school_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ab_designation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<CalendarDay> for CalendarDayPayload {
    fn from(day: CalendarDay) -> Self {
        Self {
            date: day.date,
            is_school_day: day.is_school_day,
            ab_designation: day.ab_designation.map(|ab| {
                match ab {
                    AbDay::ADay => "a_day",
                    AbDay::BDay => "b_day",
                }
                .to_string()
            }),
            notes: day.notes,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct EnrollRequest {
    pub student_ids: Vec<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct EnrollResponse {
    pub success: bool,
    pub enrolled: usize,
    pub reactivated: usize,
    pub skipped: usize,
}

//=========================================================================================
// Calendar Handlers
//=========================================================================================

/// List the stored calendar days in a date range.
#[utoipa::path(
    get,
    path = "/admin/calendar",
    params(CalendarRangeQuery),
    responses(
        (status = 200, description = "Stored calendar days, ascending", body = [CalendarDayPayload]),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn calendar_range_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<CalendarRangeQuery>,
) -> Result<Json<Vec<CalendarDayPayload>>, (StatusCode, String)> {
    identity.require(ApiRole::Admin)?;
    let days = state
        .calendar
        .days_in_range(query.from, query.to)
        .await
        .map_err(infra_error)?;
    Ok(Json(days.into_iter().map(CalendarDayPayload::from).collect()))
}

/// Replace the entire school calendar from an uploaded CSV file.
///
/// The CSV must have a header row with `date` and `day_type` columns
/// (located by name, not position). Every row is validated before any row is
/// applied; on success the existing calendar is fully overwritten.
#[utoipa::path(
    post,
    path = "/admin/calendar/import",
    request_body(content_type = "multipart/form-data", description = "The calendar CSV to upload."),
    responses(
        (status = 200, description = "Calendar replaced", body = ImportResponse),
        (status = 400, description = "Validation failed; nothing applied", body = ImportResponse),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn import_calendar_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportResponse>), (StatusCode, String)> {
    identity.require(ApiRole::Admin)?;

    let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read multipart data: {}", e),
        )
    })?
    else {
        return Ok(rejected(vec!["No file provided".to_string()]));
    };
    let data = field.bytes().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read file bytes: {}", e),
        )
    })?;

    let rows = match parse_calendar_csv(&data) {
        Ok(rows) => rows,
        Err(errors) => return Ok(rejected(errors)),
    };

    let outcome = state.calendar.import(&rows).await.map_err(infra_error)?;
    Ok(match outcome {
        ImportOutcome::Applied { imported } => (
            StatusCode::OK,
            Json(ImportResponse {
                success: true,
                imported,
                errors: Vec::new(),
            }),
        ),
        ImportOutcome::Rejected { errors } => rejected(errors),
    })
}

fn rejected(errors: Vec<String>) -> (StatusCode, Json<ImportResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ImportResponse {
            success: false,
            imported: 0,
            errors,
        }),
    )
}

/// Splits a calendar CSV into raw import rows, locating the `date` and
/// `day_type` columns by header name. Structural problems (missing header,
/// short rows) are reported the same way as validation failures.
fn parse_calendar_csv(data: &[u8]) -> Result<Vec<CalendarImportRow>, Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| vec![format!("CSV file is empty or invalid: {e}")])?;
    let date_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("date"));
    let type_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("day_type"));
    let (Some(date_index), Some(type_index)) = (date_index, type_index) else {
        return Err(vec![
            "CSV must have \"date\" and \"day_type\" columns".to_string()
        ]);
    };

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2; // line 1 is the header
        match record {
            Ok(record) => {
                // Skip blank lines rather than reporting them.
                if record.iter().all(|f| f.is_empty()) {
                    continue;
                }
                match (record.get(date_index), record.get(type_index)) {
                    (Some(date), Some(day_type)) => rows.push(CalendarImportRow {
                        line,
                        date: date.to_string(),
                        day_type: day_type.to_string(),
                    }),
                    _ => errors.push(format!("Row {line}: missing date or day_type value")),
                }
            }
            Err(e) => errors.push(format!("Row {line}: {e}")),
        }
    }
    if rows.is_empty() && errors.is_empty() {
        errors.push("CSV file is empty or invalid".to_string());
    }
    if errors.is_empty() {
        Ok(rows)
    } else {
        Err(errors)
    }
}

/// Mark a single date as a day off.
#[utoipa::path(
    post,
    path = "/admin/calendar/{date}/day-off",
    params(("date" = NaiveDate, Path, description = "The date to mark off")),
    responses(
        (status = 200, description = "Day marked off", body = ActionResponse),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mark_day_off_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ActionResponse>, (StatusCode, String)> {
    identity.require(ApiRole::Admin)?;
    state.calendar.mark_day_off(date).await.map_err(infra_error)?;
    Ok(Json(ActionResponse::ok()))
}

/// Revert a date to the default school-day behavior.
#[utoipa::path(
    delete,
    path = "/admin/calendar/{date}/day-off",
    params(("date" = NaiveDate, Path, description = "The date to unmark")),
    responses(
        (status = 200, description = "Day unmarked", body = ActionResponse),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn unmark_day_off_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ActionResponse>, (StatusCode, String)> {
    identity.require(ApiRole::Admin)?;
    state
        .calendar
        .unmark_day_off(date)
        .await
        .map_err(infra_error)?;
    Ok(Json(ActionResponse::ok()))
}

//=========================================================================================
// Enrollment Handlers
//=========================================================================================

/// Enroll a batch of students into a section. Idempotent: active students
/// are skipped and withdrawn students are reactivated in place.
#[utoipa::path(
    post,
    path = "/admin/sections/{id}/enrollments",
    request_body = EnrollRequest,
    params(("id" = Uuid, Path, description = "The section id")),
    responses(
        (status = 200, description = "Enrollment summary", body = EnrollResponse),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn enroll_students_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<EnrollRequest>,
) -> Result<Json<EnrollResponse>, (StatusCode, String)> {
    identity.require(ApiRole::Admin)?;
    let summary = state
        .enrollment
        .enroll_students(section_id, &req.student_ids)
        .await
        .map_err(infra_error)?;
    Ok(Json(EnrollResponse {
        success: true,
        enrolled: summary.enrolled,
        reactivated: summary.reactivated,
        skipped: summary.skipped,
    }))
}

/// Withdraw a student from a section (soft delete).
#[utoipa::path(
    delete,
    path = "/admin/sections/{id}/enrollments/{student_id}",
    params(
        ("id" = Uuid, Path, description = "The section id"),
        ("student_id" = Uuid, Path, description = "The student to withdraw")
    ),
    responses(
        (status = 200, description = "Student withdrawn", body = ActionResponse),
        (status = 401, description = "Missing identity"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn withdraw_student_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((section_id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ActionResponse>, (StatusCode, String)> {
    identity.require(ApiRole::Admin)?;
    state
        .enrollment
        .withdraw_student(section_id, student_id)
        .await
        .map_err(infra_error)?;
    Ok(Json(ActionResponse::ok()))
}
