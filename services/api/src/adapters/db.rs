//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DataStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use here_core::domain::{
    AbDay, AttendanceEvent, AttendanceMark, CalendarDay, Enrollment, EventType, GeoPoint,
    MarkStatus, NewAttendanceEvent, NewPresenceInteraction, PresenceInteraction, SchedulePattern,
    Section, SectionType, Student, WeekdaySet,
};
use here_core::ports::{DataStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DataStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    /// Timestamps are stored in UTC and handed back to the domain in the
    /// school's wall-clock offset.
    offset: FixedOffset,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool, offset: FixedOffset) -> Self {
        Self { pool, offset }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn local(&self, ts: DateTime<Utc>) -> DateTime<FixedOffset> {
        ts.with_timezone(&self.offset)
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a failed insert, turning a unique-constraint violation into the
/// `Duplicate` port error the services branch on.
fn insert_error(e: sqlx::Error, what: &str) -> PortError {
    if let sqlx::Error::Database(db) = &e {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return PortError::Duplicate(what.to_string());
        }
    }
    unexpected(e)
}

//=========================================================================================
// Enum Codecs
//=========================================================================================

fn ab_to_str(ab: AbDay) -> &'static str {
    match ab {
        AbDay::ADay => "a_day",
        AbDay::BDay => "b_day",
    }
}

fn ab_from_str(value: &str) -> PortResult<AbDay> {
    match value {
        "a_day" => Ok(AbDay::ADay),
        "b_day" => Ok(AbDay::BDay),
        other => Err(PortError::Unexpected(format!(
            "unknown ab_designation '{other}' in database"
        ))),
    }
}

fn section_type_to_str(section_type: SectionType) -> &'static str {
    match section_type {
        SectionType::InPerson => "in_person",
        SectionType::Remote => "remote",
        SectionType::Internship => "internship",
    }
}

fn section_type_from_str(value: &str) -> PortResult<SectionType> {
    match value {
        "in_person" => Ok(SectionType::InPerson),
        "remote" => Ok(SectionType::Remote),
        "internship" => Ok(SectionType::Internship),
        other => Err(PortError::Unexpected(format!(
            "unknown section type '{other}' in database"
        ))),
    }
}

fn pattern_to_str(pattern: SchedulePattern) -> &'static str {
    match pattern {
        SchedulePattern::EveryDay => "every_day",
        SchedulePattern::SpecificDays => "specific_days",
        SchedulePattern::ADays => "a_days",
        SchedulePattern::BDays => "b_days",
    }
}

fn pattern_from_str(value: &str) -> PortResult<SchedulePattern> {
    match value {
        "every_day" => Ok(SchedulePattern::EveryDay),
        "specific_days" => Ok(SchedulePattern::SpecificDays),
        "a_days" => Ok(SchedulePattern::ADays),
        "b_days" => Ok(SchedulePattern::BDays),
        other => Err(PortError::Unexpected(format!(
            "unknown schedule pattern '{other}' in database"
        ))),
    }
}

fn event_type_to_str(event_type: EventType) -> &'static str {
    match event_type {
        EventType::CheckIn => "check_in",
        EventType::CheckOut => "check_out",
    }
}

fn event_type_from_str(value: &str) -> PortResult<EventType> {
    match value {
        "check_in" => Ok(EventType::CheckIn),
        "check_out" => Ok(EventType::CheckOut),
        other => Err(PortError::Unexpected(format!(
            "unknown event type '{other}' in database"
        ))),
    }
}

fn mark_to_str(status: MarkStatus) -> &'static str {
    match status {
        MarkStatus::Present => "present",
        MarkStatus::Absent => "absent",
        MarkStatus::Excused => "excused",
    }
}

fn mark_from_str(value: &str) -> PortResult<MarkStatus> {
    match value {
        "present" => Ok(MarkStatus::Present),
        "absent" => Ok(MarkStatus::Absent),
        "excused" => Ok(MarkStatus::Excused),
        other => Err(PortError::Unexpected(format!(
            "unknown attendance status '{other}' in database"
        ))),
    }
}

fn geo_point(lat: Option<f64>, lng: Option<f64>) -> Option<GeoPoint> {
    match (lat, lng) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CalendarDayRecord {
    date: NaiveDate,
    is_school_day: bool,
    ab_designation: Option<String>,
    notes: Option<String>,
}
impl CalendarDayRecord {
    fn to_domain(self) -> PortResult<CalendarDay> {
        Ok(CalendarDay {
            date: self.date,
            is_school_day: self.is_school_day,
            ab_designation: self
                .ab_designation
                .as_deref()
                .map(ab_from_str)
                .transpose()?,
            notes: self.notes,
        })
    }
}

#[derive(FromRow)]
struct SectionRecord {
    id: Uuid,
    name: String,
    section_type: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    schedule_pattern: String,
    days_of_week: i16,
    presence_enabled: bool,
    attendance_enabled: bool,
    expected_lat: Option<f64>,
    expected_lng: Option<f64>,
    geofence_radius_m: Option<f64>,
}
impl SectionRecord {
    fn to_domain(self) -> PortResult<Section> {
        Ok(Section {
            id: self.id,
            name: self.name,
            section_type: section_type_from_str(&self.section_type)?,
            start_time: self.start_time,
            end_time: self.end_time,
            schedule_pattern: pattern_from_str(&self.schedule_pattern)?,
            days_of_week: WeekdaySet::from_bits(self.days_of_week as u8),
            presence_enabled: self.presence_enabled,
            attendance_enabled: self.attendance_enabled,
            expected_location: geo_point(self.expected_lat, self.expected_lng),
            geofence_radius_m: self.geofence_radius_m,
        })
    }
}

#[derive(FromRow)]
struct EnrollmentRecord {
    student_id: Uuid,
    section_id: Uuid,
    active: bool,
    enrolled_at: DateTime<Utc>,
}
impl EnrollmentRecord {
    fn to_domain(self, offset: FixedOffset) -> Enrollment {
        Enrollment {
            student_id: self.student_id,
            section_id: self.section_id,
            active: self.active,
            enrolled_at: self.enrolled_at.with_timezone(&offset),
        }
    }
}

#[derive(FromRow)]
struct StudentRecord {
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    email: String,
}
impl StudentRecord {
    fn to_domain(self) -> Student {
        Student {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct AttendanceEventRecord {
    id: Uuid,
    student_id: Uuid,
    section_id: Uuid,
    event_type: String,
    date: NaiveDate,
    timestamp: DateTime<Utc>,
    lat: Option<f64>,
    lng: Option<f64>,
    location_verified: Option<bool>,
}
impl AttendanceEventRecord {
    fn to_domain(self, offset: FixedOffset) -> PortResult<AttendanceEvent> {
        Ok(AttendanceEvent {
            id: self.id,
            student_id: self.student_id,
            section_id: self.section_id,
            event_type: event_type_from_str(&self.event_type)?,
            date: self.date,
            timestamp: self.timestamp.with_timezone(&offset),
            location: geo_point(self.lat, self.lng),
            location_verified: self.location_verified,
        })
    }
}

#[derive(FromRow)]
struct PresenceRecord {
    id: Uuid,
    student_id: Uuid,
    section_id: Uuid,
    created_at: DateTime<Utc>,
    mood: String,
}
impl PresenceRecord {
    fn to_domain(self, offset: FixedOffset) -> PresenceInteraction {
        PresenceInteraction {
            id: self.id,
            student_id: self.student_id,
            section_id: self.section_id,
            created_at: self.created_at.with_timezone(&offset),
            mood: self.mood,
        }
    }
}

#[derive(FromRow)]
struct MarkRecord {
    student_id: Uuid,
    section_id: Uuid,
    date: NaiveDate,
    status: String,
    notes: Option<String>,
    marked_by: Uuid,
}
impl MarkRecord {
    fn to_domain(self) -> PortResult<AttendanceMark> {
        Ok(AttendanceMark {
            student_id: self.student_id,
            section_id: self.section_id,
            date: self.date,
            status: mark_from_str(&self.status)?,
            notes: self.notes,
            marked_by: self.marked_by,
        })
    }
}

//=========================================================================================
// `DataStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DataStore for DbAdapter {
    async fn calendar_day(&self, date: NaiveDate) -> PortResult<Option<CalendarDay>> {
        let record = sqlx::query_as::<_, CalendarDayRecord>(
            "SELECT date, is_school_day, ab_designation, notes FROM calendar_days WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(CalendarDayRecord::to_domain).transpose()
    }

    async fn calendar_days_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<CalendarDay>> {
        let records = sqlx::query_as::<_, CalendarDayRecord>(
            "SELECT date, is_school_day, ab_designation, notes FROM calendar_days \
             WHERE date >= $1 AND date <= $2 ORDER BY date",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records
            .into_iter()
            .map(CalendarDayRecord::to_domain)
            .collect()
    }

    async fn upsert_calendar_day(&self, day: CalendarDay) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO calendar_days (date, is_school_day, ab_designation, notes) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (date) DO UPDATE SET \
               is_school_day = EXCLUDED.is_school_day, \
               ab_designation = EXCLUDED.ab_designation, \
               notes = EXCLUDED.notes",
        )
        .bind(day.date)
        .bind(day.is_school_day)
        .bind(day.ab_designation.map(ab_to_str))
        .bind(day.notes)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_calendar_day(&self, date: NaiveDate) -> PortResult<()> {
        sqlx::query("DELETE FROM calendar_days WHERE date = $1")
            .bind(date)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn replace_calendar(&self, days: Vec<CalendarDay>) -> PortResult<()> {
        // Single transaction: no reader observes an empty calendar mid-import.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM calendar_days")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        for day in days {
            sqlx::query(
                "INSERT INTO calendar_days (date, is_school_day, ab_designation, notes) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(day.date)
            .bind(day.is_school_day)
            .bind(day.ab_designation.map(ab_to_str))
            .bind(day.notes)
            .execute(&mut *tx)
            .await
            .map_err(|e| insert_error(e, "calendar day"))?;
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn section_by_id(&self, section_id: Uuid) -> PortResult<Option<Section>> {
        let record = sqlx::query_as::<_, SectionRecord>(
            "SELECT id, name, section_type, start_time, end_time, schedule_pattern, days_of_week, \
                    presence_enabled, attendance_enabled, expected_lat, expected_lng, geofence_radius_m \
             FROM sections WHERE id = $1",
        )
        .bind(section_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(SectionRecord::to_domain).transpose()
    }

    async fn sections_for_student(&self, student_id: Uuid) -> PortResult<Vec<Section>> {
        let records = sqlx::query_as::<_, SectionRecord>(
            "SELECT s.id, s.name, s.section_type, s.start_time, s.end_time, s.schedule_pattern, \
                    s.days_of_week, s.presence_enabled, s.attendance_enabled, s.expected_lat, \
                    s.expected_lng, s.geofence_radius_m \
             FROM sections s \
             JOIN section_students ss ON ss.section_id = s.id \
             WHERE ss.student_id = $1 AND ss.active",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(SectionRecord::to_domain).collect()
    }

    async fn sections_for_teacher(&self, teacher_id: Uuid) -> PortResult<Vec<Section>> {
        let records = sqlx::query_as::<_, SectionRecord>(
            "SELECT s.id, s.name, s.section_type, s.start_time, s.end_time, s.schedule_pattern, \
                    s.days_of_week, s.presence_enabled, s.attendance_enabled, s.expected_lat, \
                    s.expected_lng, s.geofence_radius_m \
             FROM sections s \
             JOIN section_teachers st ON st.section_id = s.id \
             WHERE st.teacher_id = $1",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(SectionRecord::to_domain).collect()
    }

    async fn is_teacher_assigned(&self, teacher_id: Uuid, section_id: Uuid) -> PortResult<bool> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM section_teachers WHERE teacher_id = $1 AND section_id = $2",
        )
        .bind(teacher_id)
        .bind(section_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.is_some())
    }

    async fn students_in_section(&self, section_id: Uuid) -> PortResult<Vec<Student>> {
        let records = sqlx::query_as::<_, StudentRecord>(
            "SELECT u.id, u.first_name, u.last_name, u.email FROM users u \
             JOIN section_students ss ON ss.student_id = u.id \
             WHERE ss.section_id = $1 AND ss.active \
             ORDER BY ss.enrolled_at",
        )
        .bind(section_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(StudentRecord::to_domain).collect())
    }

    async fn enrollments_for_section(&self, section_id: Uuid) -> PortResult<Vec<Enrollment>> {
        let records = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT student_id, section_id, active, enrolled_at FROM section_students \
             WHERE section_id = $1",
        )
        .bind(section_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| r.to_domain(self.offset))
            .collect())
    }

    async fn insert_enrollments(
        &self,
        section_id: Uuid,
        student_ids: &[Uuid],
        enrolled_at: DateTime<FixedOffset>,
    ) -> PortResult<()> {
        for &student_id in student_ids {
            sqlx::query(
                "INSERT INTO section_students (student_id, section_id, active, enrolled_at) \
                 VALUES ($1, $2, TRUE, $3)",
            )
            .bind(student_id)
            .bind(section_id)
            .bind(enrolled_at.with_timezone(&Utc))
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, "enrollment"))?;
        }
        Ok(())
    }

    async fn reactivate_enrollments(
        &self,
        section_id: Uuid,
        student_ids: &[Uuid],
        enrolled_at: DateTime<FixedOffset>,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE section_students SET active = TRUE, enrolled_at = $3 \
             WHERE section_id = $1 AND student_id = ANY($2)",
        )
        .bind(section_id)
        .bind(student_ids)
        .bind(enrolled_at.with_timezone(&Utc))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn deactivate_enrollment(&self, section_id: Uuid, student_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE section_students SET active = FALSE \
             WHERE section_id = $1 AND student_id = $2",
        )
        .bind(section_id)
        .bind(student_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_attendance_event(
        &self,
        event: NewAttendanceEvent,
    ) -> PortResult<AttendanceEvent> {
        let record = sqlx::query_as::<_, AttendanceEventRecord>(
            "INSERT INTO attendance_events \
               (id, student_id, section_id, event_type, date, timestamp, lat, lng, location_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, student_id, section_id, event_type, date, timestamp, lat, lng, location_verified",
        )
        .bind(Uuid::new_v4())
        .bind(event.student_id)
        .bind(event.section_id)
        .bind(event_type_to_str(event.event_type))
        .bind(event.date)
        .bind(event.timestamp.with_timezone(&Utc))
        .bind(event.location.map(|l| l.latitude))
        .bind(event.location.map(|l| l.longitude))
        .bind(event.location_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "attendance event"))?;
        record.to_domain(self.offset)
    }

    async fn attendance_event(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        date: NaiveDate,
        event_type: EventType,
    ) -> PortResult<Option<AttendanceEvent>> {
        let record = sqlx::query_as::<_, AttendanceEventRecord>(
            "SELECT id, student_id, section_id, event_type, date, timestamp, lat, lng, location_verified \
             FROM attendance_events \
             WHERE student_id = $1 AND section_id = $2 AND date = $3 AND event_type = $4",
        )
        .bind(student_id)
        .bind(section_id)
        .bind(date)
        .bind(event_type_to_str(event_type))
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(|r| r.to_domain(self.offset)).transpose()
    }

    async fn insert_prompt_response(&self, event_id: Uuid, content: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO prompt_responses (id, attendance_event_id, content) VALUES ($1, $2, $3)",
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, "prompt response"))?;
        Ok(())
    }

    async fn prompt_response_for_event(&self, event_id: Uuid) -> PortResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT content FROM prompt_responses WHERE attendance_event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(|(content,)| content))
    }

    async fn insert_presence(
        &self,
        wave: NewPresenceInteraction,
    ) -> PortResult<PresenceInteraction> {
        let record = sqlx::query_as::<_, PresenceRecord>(
            "INSERT INTO presence_interactions (id, student_id, section_id, date, created_at, mood) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, student_id, section_id, created_at, mood",
        )
        .bind(Uuid::new_v4())
        .bind(wave.student_id)
        .bind(wave.section_id)
        .bind(wave.created_at.date_naive())
        .bind(wave.created_at.with_timezone(&Utc))
        .bind(&wave.mood)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "presence interaction"))?;
        Ok(record.to_domain(self.offset))
    }

    async fn presence_for_day(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Option<PresenceInteraction>> {
        let record = sqlx::query_as::<_, PresenceRecord>(
            "SELECT id, student_id, section_id, created_at, mood FROM presence_interactions \
             WHERE student_id = $1 AND section_id = $2 AND date = $3 \
             ORDER BY created_at LIMIT 1",
        )
        .bind(student_id)
        .bind(section_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain(self.offset)))
    }

    async fn upsert_marks(&self, marks: &[AttendanceMark]) -> PortResult<()> {
        for mark in marks {
            sqlx::query(
                "INSERT INTO attendance_marks \
                   (student_id, section_id, date, status, notes, marked_by, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
                 ON CONFLICT (student_id, section_id, date) DO UPDATE SET \
                   status = EXCLUDED.status, \
                   notes = EXCLUDED.notes, \
                   marked_by = EXCLUDED.marked_by, \
                   updated_at = NOW()",
            )
            .bind(mark.student_id)
            .bind(mark.section_id)
            .bind(mark.date)
            .bind(mark_to_str(mark.status))
            .bind(&mark.notes)
            .bind(mark.marked_by)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        }
        Ok(())
    }

    async fn delete_marks(
        &self,
        section_id: Uuid,
        date: NaiveDate,
        student_ids: &[Uuid],
    ) -> PortResult<()> {
        sqlx::query(
            "DELETE FROM attendance_marks \
             WHERE section_id = $1 AND date = $2 AND student_id = ANY($3)",
        )
        .bind(section_id)
        .bind(date)
        .bind(student_ids)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn marks_for_section(
        &self,
        section_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<AttendanceMark>> {
        let records = sqlx::query_as::<_, MarkRecord>(
            "SELECT student_id, section_id, date, status, notes, marked_by FROM attendance_marks \
             WHERE section_id = $1 AND date = $2",
        )
        .bind(section_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(MarkRecord::to_domain).collect()
    }
}
