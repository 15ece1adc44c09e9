//! crates/here_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or clocks.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use uuid::Uuid;

use crate::domain::{
    AttendanceEvent, AttendanceMark, CalendarDay, Enrollment, EventType, NewAttendanceEvent,
    NewPresenceInteraction, PresenceInteraction, Section, Student,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness guarantee in the store rejected the write. The services
    /// translate this into the domain-level "already done" case.
    #[error("Duplicate row: {0}")]
    Duplicate(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Clock Port
//=========================================================================================

/// Wall-clock time in the school's configured timezone. The services never
/// read ambient time directly, so eligibility windows stay deterministic
/// under test and correct on multi-timezone deployments.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

//=========================================================================================
// Persistence Port
//=========================================================================================

#[async_trait]
pub trait DataStore: Send + Sync {
    // --- Calendar ---
    async fn calendar_day(&self, date: NaiveDate) -> PortResult<Option<CalendarDay>>;

    async fn calendar_days_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<CalendarDay>>;

    async fn upsert_calendar_day(&self, day: CalendarDay) -> PortResult<()>;

    async fn delete_calendar_day(&self, date: NaiveDate) -> PortResult<()>;

    /// Destructive full overwrite: delete every calendar row, then insert
    /// `days`, all inside one store transaction so no reader ever observes
    /// an empty calendar mid-import.
    async fn replace_calendar(&self, days: Vec<CalendarDay>) -> PortResult<()>;

    // --- Sections and the user/role directory ---
    async fn section_by_id(&self, section_id: Uuid) -> PortResult<Option<Section>>;

    /// Sections the student is actively enrolled in.
    async fn sections_for_student(&self, student_id: Uuid) -> PortResult<Vec<Section>>;

    /// Sections the teacher is assigned to.
    async fn sections_for_teacher(&self, teacher_id: Uuid) -> PortResult<Vec<Section>>;

    async fn is_teacher_assigned(&self, teacher_id: Uuid, section_id: Uuid) -> PortResult<bool>;

    /// Active enrollees of a section, ordered by enrollment time.
    async fn students_in_section(&self, section_id: Uuid) -> PortResult<Vec<Student>>;

    // --- Enrollment ---
    /// Every enrollment row for the section, active or not.
    async fn enrollments_for_section(&self, section_id: Uuid) -> PortResult<Vec<Enrollment>>;

    async fn insert_enrollments(
        &self,
        section_id: Uuid,
        student_ids: &[Uuid],
        enrolled_at: DateTime<FixedOffset>,
    ) -> PortResult<()>;

    /// Flips soft-deleted rows back to active with a fresh `enrolled_at`.
    async fn reactivate_enrollments(
        &self,
        section_id: Uuid,
        student_ids: &[Uuid],
        enrolled_at: DateTime<FixedOffset>,
    ) -> PortResult<()>;

    async fn deactivate_enrollment(&self, section_id: Uuid, student_id: Uuid) -> PortResult<()>;

    // --- Attendance events ---
    /// Inserts one event. Returns `PortError::Duplicate` when an event of the
    /// same type already exists for (student, section, date); the store's
    /// unique index is the authoritative guard, not a read-before-write.
    async fn insert_attendance_event(
        &self,
        event: NewAttendanceEvent,
    ) -> PortResult<AttendanceEvent>;

    async fn attendance_event(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        date: NaiveDate,
        event_type: EventType,
    ) -> PortResult<Option<AttendanceEvent>>;

    async fn insert_prompt_response(&self, event_id: Uuid, content: &str) -> PortResult<()>;

    async fn prompt_response_for_event(&self, event_id: Uuid) -> PortResult<Option<String>>;

    // --- Presence interactions ---
    async fn insert_presence(
        &self,
        wave: NewPresenceInteraction,
    ) -> PortResult<PresenceInteraction>;

    /// The first wave of the day, if any.
    async fn presence_for_day(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Option<PresenceInteraction>>;

    // --- Teacher roster marks ---
    /// Upserts on (student, section, date).
    async fn upsert_marks(&self, marks: &[AttendanceMark]) -> PortResult<()>;

    async fn delete_marks(
        &self,
        section_id: Uuid,
        date: NaiveDate,
        student_ids: &[Uuid],
    ) -> PortResult<()>;

    async fn marks_for_section(
        &self,
        section_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<AttendanceMark>>;
}
