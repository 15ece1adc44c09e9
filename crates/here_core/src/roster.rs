//! crates/here_core/src/roster.rs
//!
//! The teacher-facing roster: who is enrolled in a section, what each
//! student has signalled today, and the teacher's own attendance marks.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::attendance::AttendanceService;
use crate::domain::{AttendanceMark, DayStatus, MarkStatus, Student};
use crate::ports::{DataStore, PortResult};

/// One student's row in the teacher roster view.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub student: Student,
    pub status: DayStatus,
    /// The student's presence mood, when they waved today.
    pub mood: Option<String>,
    /// Soft geofence result carried on the day's check-in, if any.
    pub check_in_verified: Option<bool>,
    pub mark: Option<AttendanceMark>,
}

/// A teacher's requested mark for one student. `status: None` clears any
/// existing mark for that student on that date.
#[derive(Debug, Clone)]
pub struct MarkEntry {
    pub student_id: Uuid,
    pub status: Option<MarkStatus>,
    pub notes: Option<String>,
}

/// The discriminated result of a `save_marks` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkSaveOutcome {
    Saved { saved: usize },
    Denied { reason: String },
}

#[derive(Clone)]
pub struct RosterService {
    store: Arc<dyn DataStore>,
    attendance: AttendanceService,
}

impl RosterService {
    pub fn new(store: Arc<dyn DataStore>, attendance: AttendanceService) -> Self {
        Self { store, attendance }
    }

    /// Every active enrollee of the section with their day status and any
    /// existing teacher mark for `date`.
    pub async fn section_roster(
        &self,
        section_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<RosterEntry>> {
        let students = self.store.students_in_section(section_id).await?;
        let mut marks: HashMap<Uuid, AttendanceMark> = self
            .store
            .marks_for_section(section_id, date)
            .await?
            .into_iter()
            .map(|m| (m.student_id, m))
            .collect();

        let mut roster = Vec::with_capacity(students.len());
        for student in students {
            let status = self
                .attendance
                .get_status(student.id, section_id, date)
                .await?;
            let mood = self
                .store
                .presence_for_day(student.id, section_id, date)
                .await?
                .map(|wave| wave.mood);
            let check_in_verified = self
                .store
                .attendance_event(
                    student.id,
                    section_id,
                    date,
                    crate::domain::EventType::CheckIn,
                )
                .await?
                .and_then(|event| event.location_verified);
            let mark = marks.remove(&student.id);
            roster.push(RosterEntry {
                student,
                status,
                mood,
                check_in_verified,
                mark,
            });
        }
        Ok(roster)
    }

    /// Saves a batch of teacher marks for one section and date.
    ///
    /// Entries carrying a status are upserted on (student, section, date);
    /// entries with no status clear any existing mark. Denied when the
    /// teacher is not assigned to the section.
    pub async fn save_marks(
        &self,
        teacher_id: Uuid,
        section_id: Uuid,
        date: NaiveDate,
        entries: &[MarkEntry],
    ) -> PortResult<MarkSaveOutcome> {
        if !self
            .store
            .is_teacher_assigned(teacher_id, section_id)
            .await?
        {
            return Ok(MarkSaveOutcome::Denied {
                reason: "You are not assigned to this section".to_string(),
            });
        }

        let marks: Vec<AttendanceMark> = entries
            .iter()
            .filter_map(|entry| {
                entry.status.map(|status| AttendanceMark {
                    student_id: entry.student_id,
                    section_id,
                    date,
                    status,
                    notes: entry.notes.clone(),
                    marked_by: teacher_id,
                })
            })
            .collect();
        let cleared: Vec<Uuid> = entries
            .iter()
            .filter(|entry| entry.status.is_none())
            .map(|entry| entry.student_id)
            .collect();

        if !marks.is_empty() {
            self.store.upsert_marks(&marks).await?;
        }
        if !cleared.is_empty() {
            self.store.delete_marks(section_id, date, &cleared).await?;
        }

        Ok(MarkSaveOutcome::Saved {
            saved: marks.len(),
        })
    }
}
