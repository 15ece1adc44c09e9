//! services/api/src/web/rest.rs
//!
//! Shared REST plumbing: the structured action response, error conversion at
//! the handler boundary, and the master definition for the OpenAPI
//! specification.

use axum::http::StatusCode;
use serde::Serialize;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

use here_core::attendance::ActionOutcome;
use here_core::domain::SectionType;
use here_core::eligibility::Eligibility;
use here_core::ports::PortError;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::student::agenda_handler,
        crate::web::student::wave_handler,
        crate::web::student::check_in_handler,
        crate::web::student::check_out_handler,
        crate::web::teacher::agenda_handler,
        crate::web::teacher::save_attendance_handler,
        crate::web::admin::calendar_range_handler,
        crate::web::admin::import_calendar_handler,
        crate::web::admin::mark_day_off_handler,
        crate::web::admin::unmark_day_off_handler,
        crate::web::admin::enroll_students_handler,
        crate::web::admin::withdraw_student_handler,
    ),
    components(
        schemas(
            ActionResponse,
            ActionHint,
            crate::web::student::AgendaEntry,
            crate::web::student::WaveRequest,
            crate::web::student::CheckInRequest,
            crate::web::student::CheckOutRequest,
            crate::web::student::LocationPayload,
            crate::web::teacher::TeacherAgendaEntry,
            crate::web::teacher::RosterStudentPayload,
            crate::web::teacher::SaveAttendanceRequest,
            crate::web::teacher::MarkEntryPayload,
            crate::web::teacher::SaveAttendanceResponse,
            crate::web::admin::CalendarDayPayload,
            crate::web::admin::ImportResponse,
            crate::web::admin::EnrollRequest,
            crate::web::admin::EnrollResponse,
        )
    ),
    tags(
        (name = "Here API", description = "Attendance and scheduling endpoints for the Here school app.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Response Types and Helpers
//=========================================================================================

/// The discriminated result every mutating action returns. Expected
/// business-rule denials travel here with HTTP 200; the UI branches on
/// `success` rather than the status code.
#[derive(Serialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

impl From<ActionOutcome> for ActionResponse {
    fn from(outcome: ActionOutcome) -> Self {
        match outcome {
            ActionOutcome::Completed => Self::ok(),
            ActionOutcome::Denied { reason } => Self::denied(reason),
        }
    }
}

/// An eligibility hint for one action, so the UI can disable buttons and
/// show countdowns without re-deriving the gating rules.
#[derive(Serialize, ToSchema)]
pub struct ActionHint {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opens_at: Option<String>,
}

impl From<Eligibility> for ActionHint {
    fn from(eligibility: Eligibility) -> Self {
        match eligibility {
            Eligibility::Allowed => Self {
                allowed: true,
                reason: None,
                opens_at: None,
            },
            Eligibility::Denied { reason, opens_at } => Self {
                allowed: false,
                reason: Some(reason),
                opens_at: opens_at.map(|t| t.format("%H:%M").to_string()),
            },
        }
    }
}

/// Converts an infrastructure failure into a generic 500. The detail goes to
/// the logs, never to the client.
pub fn infra_error(e: PortError) -> (StatusCode, String) {
    error!("infrastructure failure: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "An unexpected error occurred".to_string(),
    )
}

pub fn section_type_label(section_type: SectionType) -> &'static str {
    match section_type {
        SectionType::InPerson => "in_person",
        SectionType::Remote => "remote",
        SectionType::Internship => "internship",
    }
}
