//! crates/here_core/src/enrollment.rs
//!
//! Idempotent enrollment management. Enrollments are soft-deleted, so
//! re-enrolling a withdrawn student reactivates the existing row instead of
//! creating a second one, and enrolling an already-active student is a
//! reported no-op.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::ports::{Clock, DataStore, PortResult};

/// How a batch of enrollment requests was split up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrollmentSummary {
    /// Brand-new enrollment rows.
    pub enrolled: usize,
    /// Previously withdrawn students whose rows were flipped back to active.
    pub reactivated: usize,
    /// Already actively enrolled; nothing to do.
    pub skipped: usize,
}

#[derive(Clone)]
pub struct EnrollmentService {
    store: Arc<dyn DataStore>,
    clock: Arc<dyn Clock>,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn DataStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Enrolls a batch of students into a section, splitting them into new
    /// inserts, reactivations, and idempotent skips.
    pub async fn enroll_students(
        &self,
        section_id: Uuid,
        student_ids: &[Uuid],
    ) -> PortResult<EnrollmentSummary> {
        let existing: HashMap<Uuid, bool> = self
            .store
            .enrollments_for_section(section_id)
            .await?
            .into_iter()
            .map(|e| (e.student_id, e.active))
            .collect();

        let mut new_students = Vec::new();
        let mut reactivations = Vec::new();
        let mut skipped = 0usize;
        for &student_id in student_ids {
            match existing.get(&student_id) {
                None => new_students.push(student_id),
                Some(false) => reactivations.push(student_id),
                Some(true) => skipped += 1,
            }
        }

        let now = self.clock.now();
        if !new_students.is_empty() {
            self.store
                .insert_enrollments(section_id, &new_students, now)
                .await?;
        }
        if !reactivations.is_empty() {
            self.store
                .reactivate_enrollments(section_id, &reactivations, now)
                .await?;
        }

        Ok(EnrollmentSummary {
            enrolled: new_students.len(),
            reactivated: reactivations.len(),
            skipped,
        })
    }

    /// Soft-deletes one enrollment. Withdrawing a student who is not
    /// enrolled is a no-op.
    pub async fn withdraw_student(&self, section_id: Uuid, student_id: Uuid) -> PortResult<()> {
        self.store
            .deactivate_enrollment(section_id, student_id)
            .await
    }
}
