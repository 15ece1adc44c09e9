#![allow(dead_code)] // each test binary uses a different slice of the fixtures

//! Shared test fixtures: an in-memory `DataStore` and a settable clock.
//!
//! The in-memory store mirrors the persistence guarantees the services rely
//! on, most importantly the uniqueness of attendance events per
//! (student, section, date, event_type).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use uuid::Uuid;

use here_core::domain::{
    AttendanceEvent, AttendanceMark, CalendarDay, Enrollment, EventType, NewAttendanceEvent,
    NewPresenceInteraction, PresenceInteraction, SchedulePattern, Section, SectionType, Student,
    WeekdaySet,
};
use here_core::ports::{Clock, DataStore, PortError, PortResult};

//=========================================================================================
// Clock
//=========================================================================================

/// A clock whose reading is set by the test.
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap()
    }
}

/// School-local wall clock for a given date and time, at UTC-5.
pub fn local(date: NaiveDate, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    date.and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_local_timezone(FixedOffset::west_opt(5 * 3600).unwrap())
        .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

//=========================================================================================
// Section builders
//=========================================================================================

pub fn section(name: &str, section_type: SectionType, pattern: SchedulePattern) -> Section {
    Section {
        id: Uuid::new_v4(),
        name: name.to_string(),
        section_type,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        schedule_pattern: pattern,
        days_of_week: WeekdaySet::EMPTY,
        presence_enabled: !matches!(section_type, SectionType::Remote | SectionType::Internship),
        attendance_enabled: true,
        expected_location: None,
        geofence_radius_m: None,
    }
}

pub fn student(email: &str) -> Student {
    Student {
        id: Uuid::new_v4(),
        first_name: Some("Test".to_string()),
        last_name: Some("Student".to_string()),
        email: email.to_string(),
    }
}

//=========================================================================================
// In-memory store
//=========================================================================================

#[derive(Default)]
struct Inner {
    calendar: BTreeMap<NaiveDate, CalendarDay>,
    sections: HashMap<Uuid, Section>,
    enrollments: Vec<Enrollment>,
    teacher_assignments: HashSet<(Uuid, Uuid)>,
    students: HashMap<Uuid, Student>,
    events: Vec<AttendanceEvent>,
    prompts: HashMap<Uuid, String>,
    presence: Vec<PresenceInteraction>,
    marks: Vec<AttendanceMark>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&self, section: Section) {
        let mut inner = self.inner.lock().unwrap();
        inner.sections.insert(section.id, section);
    }

    pub fn add_student(&self, student: Student) {
        let mut inner = self.inner.lock().unwrap();
        inner.students.insert(student.id, student);
    }

    pub fn assign_teacher(&self, teacher_id: Uuid, section_id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        inner.teacher_assignments.insert((teacher_id, section_id));
    }

    /// Directly seeds an enrollment row, bypassing the enrollment service.
    pub fn seed_enrollment(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        active: bool,
        enrolled_at: DateTime<FixedOffset>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.enrollments.push(Enrollment {
            student_id,
            section_id,
            active,
            enrolled_at,
        });
    }

    pub fn calendar_len(&self) -> usize {
        self.inner.lock().unwrap().calendar.len()
    }

    pub fn event_count(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    pub fn presence_count(&self) -> usize {
        self.inner.lock().unwrap().presence.len()
    }

    pub fn enrollment_rows(&self, section_id: Uuid) -> Vec<Enrollment> {
        self.inner
            .lock()
            .unwrap()
            .enrollments
            .iter()
            .filter(|e| e.section_id == section_id)
            .cloned()
            .collect()
    }

    pub fn last_event(&self) -> Option<AttendanceEvent> {
        self.inner.lock().unwrap().events.last().cloned()
    }

    /// The mood of the student's earliest wave for the section, if any.
    pub fn first_presence_mood(&self, student_id: Uuid, section_id: Uuid) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .presence
            .iter()
            .find(|p| p.student_id == student_id && p.section_id == section_id)
            .map(|p| p.mood.clone())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn calendar_day(&self, date: NaiveDate) -> PortResult<Option<CalendarDay>> {
        Ok(self.inner.lock().unwrap().calendar.get(&date).cloned())
    }

    async fn calendar_days_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<CalendarDay>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .calendar
            .range(from..=to)
            .map(|(_, day)| day.clone())
            .collect())
    }

    async fn upsert_calendar_day(&self, day: CalendarDay) -> PortResult<()> {
        self.inner.lock().unwrap().calendar.insert(day.date, day);
        Ok(())
    }

    async fn delete_calendar_day(&self, date: NaiveDate) -> PortResult<()> {
        self.inner.lock().unwrap().calendar.remove(&date);
        Ok(())
    }

    async fn replace_calendar(&self, days: Vec<CalendarDay>) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calendar.clear();
        for day in days {
            inner.calendar.insert(day.date, day);
        }
        Ok(())
    }

    async fn section_by_id(&self, section_id: Uuid) -> PortResult<Option<Section>> {
        Ok(self.inner.lock().unwrap().sections.get(&section_id).cloned())
    }

    async fn sections_for_student(&self, student_id: Uuid) -> PortResult<Vec<Section>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id && e.active)
            .filter_map(|e| inner.sections.get(&e.section_id).cloned())
            .collect())
    }

    async fn sections_for_teacher(&self, teacher_id: Uuid) -> PortResult<Vec<Section>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .teacher_assignments
            .iter()
            .filter(|(t, _)| *t == teacher_id)
            .filter_map(|(_, s)| inner.sections.get(s).cloned())
            .collect())
    }

    async fn is_teacher_assigned(&self, teacher_id: Uuid, section_id: Uuid) -> PortResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .teacher_assignments
            .contains(&(teacher_id, section_id)))
    }

    async fn students_in_section(&self, section_id: Uuid) -> PortResult<Vec<Student>> {
        let inner = self.inner.lock().unwrap();
        let mut enrollments: Vec<&Enrollment> = inner
            .enrollments
            .iter()
            .filter(|e| e.section_id == section_id && e.active)
            .collect();
        enrollments.sort_by_key(|e| e.enrolled_at);
        Ok(enrollments
            .iter()
            .filter_map(|e| inner.students.get(&e.student_id).cloned())
            .collect())
    }

    async fn enrollments_for_section(&self, section_id: Uuid) -> PortResult<Vec<Enrollment>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .enrollments
            .iter()
            .filter(|e| e.section_id == section_id)
            .cloned()
            .collect())
    }

    async fn insert_enrollments(
        &self,
        section_id: Uuid,
        student_ids: &[Uuid],
        enrolled_at: DateTime<FixedOffset>,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for &student_id in student_ids {
            inner.enrollments.push(Enrollment {
                student_id,
                section_id,
                active: true,
                enrolled_at,
            });
        }
        Ok(())
    }

    async fn reactivate_enrollments(
        &self,
        section_id: Uuid,
        student_ids: &[Uuid],
        enrolled_at: DateTime<FixedOffset>,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for enrollment in inner.enrollments.iter_mut() {
            if enrollment.section_id == section_id && student_ids.contains(&enrollment.student_id)
            {
                enrollment.active = true;
                enrollment.enrolled_at = enrolled_at;
            }
        }
        Ok(())
    }

    async fn deactivate_enrollment(&self, section_id: Uuid, student_id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for enrollment in inner.enrollments.iter_mut() {
            if enrollment.section_id == section_id && enrollment.student_id == student_id {
                enrollment.active = false;
            }
        }
        Ok(())
    }

    async fn insert_attendance_event(
        &self,
        event: NewAttendanceEvent,
    ) -> PortResult<AttendanceEvent> {
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner.events.iter().any(|e| {
            e.student_id == event.student_id
                && e.section_id == event.section_id
                && e.date == event.date
                && e.event_type == event.event_type
        });
        if duplicate {
            return Err(PortError::Duplicate(format!(
                "attendance event {:?} already exists for {} on {}",
                event.event_type, event.student_id, event.date
            )));
        }
        let stored = AttendanceEvent {
            id: Uuid::new_v4(),
            student_id: event.student_id,
            section_id: event.section_id,
            event_type: event.event_type,
            date: event.date,
            timestamp: event.timestamp,
            location: event.location,
            location_verified: event.location_verified,
        };
        inner.events.push(stored.clone());
        Ok(stored)
    }

    async fn attendance_event(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        date: NaiveDate,
        event_type: EventType,
    ) -> PortResult<Option<AttendanceEvent>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .events
            .iter()
            .find(|e| {
                e.student_id == student_id
                    && e.section_id == section_id
                    && e.date == date
                    && e.event_type == event_type
            })
            .cloned())
    }

    async fn insert_prompt_response(&self, event_id: Uuid, content: &str) -> PortResult<()> {
        self.inner
            .lock()
            .unwrap()
            .prompts
            .insert(event_id, content.to_string());
        Ok(())
    }

    async fn prompt_response_for_event(&self, event_id: Uuid) -> PortResult<Option<String>> {
        Ok(self.inner.lock().unwrap().prompts.get(&event_id).cloned())
    }

    async fn insert_presence(
        &self,
        wave: NewPresenceInteraction,
    ) -> PortResult<PresenceInteraction> {
        let stored = PresenceInteraction {
            id: Uuid::new_v4(),
            student_id: wave.student_id,
            section_id: wave.section_id,
            created_at: wave.created_at,
            mood: wave.mood,
        };
        self.inner.lock().unwrap().presence.push(stored.clone());
        Ok(stored)
    }

    async fn presence_for_day(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Option<PresenceInteraction>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .presence
            .iter()
            .find(|p| {
                p.student_id == student_id
                    && p.section_id == section_id
                    && p.created_at.date_naive() == date
            })
            .cloned())
    }

    async fn upsert_marks(&self, marks: &[AttendanceMark]) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for mark in marks {
            inner.marks.retain(|m| {
                !(m.student_id == mark.student_id
                    && m.section_id == mark.section_id
                    && m.date == mark.date)
            });
            inner.marks.push(mark.clone());
        }
        Ok(())
    }

    async fn delete_marks(
        &self,
        section_id: Uuid,
        date: NaiveDate,
        student_ids: &[Uuid],
    ) -> PortResult<()> {
        self.inner.lock().unwrap().marks.retain(|m| {
            !(m.section_id == section_id
                && m.date == date
                && student_ids.contains(&m.student_id))
        });
        Ok(())
    }

    async fn marks_for_section(
        &self,
        section_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<AttendanceMark>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .marks
            .iter()
            .filter(|m| m.section_id == section_id && m.date == date)
            .cloned()
            .collect())
    }
}
