//! crates/here_core/src/attendance.rs
//!
//! The attendance/presence event log: records check-in, check-out, and
//! presence-wave actions and answers the per-day status queries that feed
//! the student agenda and the eligibility gate.
//!
//! Business-rule violations come back as `ActionOutcome::Denied` values,
//! never as errors; only infrastructure failures surface as `PortError`.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    DayStatus, EventType, GeoPoint, NewAttendanceEvent, NewPresenceInteraction, Section,
    SectionType,
};
use crate::ports::{Clock, DataStore, PortError, PortResult};

/// The wave recorded when the student doesn't pick a mood.
pub const DEFAULT_WAVE_MOOD: &str = "👋";

/// The discriminated result of a mutating attendance operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Denied { reason: String },
}

impl ActionOutcome {
    fn denied(reason: impl Into<String>) -> Self {
        ActionOutcome::Denied {
            reason: reason.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }
}

#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn DataStore>,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn DataStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Records a casual presence wave. Repeated waves are permitted; the
    /// signal is social, not an attendance record.
    pub async fn record_presence_wave(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        mood: Option<String>,
    ) -> PortResult<ActionOutcome> {
        let Some(section) = self.store.section_by_id(section_id).await? else {
            return Ok(ActionOutcome::denied("Section not found"));
        };
        if !section.presence_enabled {
            return Ok(ActionOutcome::denied(
                "Presence waves not enabled for this section",
            ));
        }

        self.store
            .insert_presence(NewPresenceInteraction {
                student_id,
                section_id,
                created_at: self.clock.now(),
                mood: mood.unwrap_or_else(|| DEFAULT_WAVE_MOOD.to_string()),
            })
            .await?;
        Ok(ActionOutcome::Completed)
    }

    /// Records a check-in with the student's plans for the session.
    ///
    /// Internship check-ins with a reported location get a soft geofence
    /// verification: the result is stored and logged, but an out-of-range
    /// location never blocks the check-in.
    pub async fn record_check_in(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        plans: &str,
        location: Option<GeoPoint>,
    ) -> PortResult<ActionOutcome> {
        let Some(section) = self.store.section_by_id(section_id).await? else {
            return Ok(ActionOutcome::denied("Section not found"));
        };
        if !section.requires_check_in() {
            return Ok(ActionOutcome::denied(
                "This section does not require check-in",
            ));
        }

        let today = self.clock.today();
        let location_verified = verify_location(&section, location.as_ref());
        if location_verified == Some(false) {
            info!(
                section = %section.name,
                %student_id,
                "check-in location outside the internship geofence; recording anyway"
            );
        }

        let event = match self
            .store
            .insert_attendance_event(NewAttendanceEvent {
                student_id,
                section_id,
                event_type: EventType::CheckIn,
                date: today,
                timestamp: self.clock.now(),
                location,
                location_verified,
            })
            .await
        {
            Ok(event) => event,
            Err(PortError::Duplicate(_)) => {
                return Ok(ActionOutcome::denied("Already checked in today"));
            }
            Err(e) => return Err(e),
        };

        // The event is already committed; losing the plans text is logged
        // rather than surfaced as a failed check-in.
        if let Err(e) = self.store.insert_prompt_response(event.id, plans).await {
            warn!(event_id = %event.id, "failed to save check-in plans: {e}");
        }
        Ok(ActionOutcome::Completed)
    }

    /// Records a check-out with the student's progress summary. Requires a
    /// same-day check-in; has no closing time.
    pub async fn record_check_out(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        progress: &str,
    ) -> PortResult<ActionOutcome> {
        let Some(section) = self.store.section_by_id(section_id).await? else {
            return Ok(ActionOutcome::denied("Section not found"));
        };
        if !section.requires_check_in() {
            return Ok(ActionOutcome::denied(
                "This section does not require check-in",
            ));
        }

        let today = self.clock.today();
        let existing_check_out = self
            .store
            .attendance_event(student_id, section_id, today, EventType::CheckOut)
            .await?;
        if existing_check_out.is_some() {
            return Ok(ActionOutcome::denied("Already checked out today"));
        }

        let checked_in = self
            .store
            .attendance_event(student_id, section_id, today, EventType::CheckIn)
            .await?
            .is_some();
        if !checked_in {
            return Ok(ActionOutcome::denied("Must check in before checking out"));
        }

        let event = match self
            .store
            .insert_attendance_event(NewAttendanceEvent {
                student_id,
                section_id,
                event_type: EventType::CheckOut,
                date: today,
                timestamp: self.clock.now(),
                location: None,
                location_verified: None,
            })
            .await
        {
            Ok(event) => event,
            // Lost the race with a concurrent submission: same answer as the
            // read-side guard above.
            Err(PortError::Duplicate(_)) => {
                return Ok(ActionOutcome::denied("Already checked out today"));
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self.store.insert_prompt_response(event.id, progress).await {
            warn!(event_id = %event.id, "failed to save check-out progress: {e}");
        }
        Ok(ActionOutcome::Completed)
    }

    /// Hydrates the per-day status for one (student, section, date).
    pub async fn get_status(
        &self,
        student_id: Uuid,
        section_id: Uuid,
        date: chrono::NaiveDate,
    ) -> PortResult<DayStatus> {
        let check_in = self
            .store
            .attendance_event(student_id, section_id, date, EventType::CheckIn)
            .await?;
        let check_out = self
            .store
            .attendance_event(student_id, section_id, date, EventType::CheckOut)
            .await?;
        let wave = self
            .store
            .presence_for_day(student_id, section_id, date)
            .await?;

        let plans = match &check_in {
            Some(event) => self.store.prompt_response_for_event(event.id).await?,
            None => None,
        };
        let progress = match &check_out {
            Some(event) => self.store.prompt_response_for_event(event.id).await?,
            None => None,
        };

        Ok(DayStatus {
            has_checked_in: check_in.is_some(),
            has_checked_out: check_out.is_some(),
            has_waved: wave.is_some(),
            plans,
            progress,
        })
    }
}

/// Soft geofence verification. `None` when no check applies: the section is
/// not an internship, no location was reported, or no geofence is configured.
fn verify_location(section: &Section, location: Option<&GeoPoint>) -> Option<bool> {
    if section.section_type != SectionType::Internship {
        return None;
    }
    let location = location?;
    let expected = section.expected_location.as_ref()?;
    let radius = section.geofence_radius_m?;
    Some(location.distance_m(expected) <= radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SchedulePattern, WeekdaySet};
    use chrono::NaiveTime;

    fn internship(expected: Option<GeoPoint>, radius: Option<f64>) -> Section {
        Section {
            id: Uuid::new_v4(),
            name: "Internship".to_string(),
            section_type: SectionType::Internship,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            schedule_pattern: SchedulePattern::EveryDay,
            days_of_week: WeekdaySet::EMPTY,
            presence_enabled: false,
            attendance_enabled: true,
            expected_location: expected,
            geofence_radius_m: radius,
        }
    }

    const SITE: GeoPoint = GeoPoint {
        latitude: 40.0,
        longitude: -75.0,
    };

    #[test]
    fn no_geofence_configured_means_no_verification() {
        let section = internship(None, None);
        assert_eq!(verify_location(&section, Some(&SITE)), None);
    }

    #[test]
    fn no_reported_location_means_no_verification() {
        let section = internship(Some(SITE), Some(200.0));
        assert_eq!(verify_location(&section, None), None);
    }

    #[test]
    fn inside_the_radius_verifies() {
        let section = internship(Some(SITE), Some(200.0));
        let nearby = GeoPoint {
            latitude: 40.0005,
            longitude: -75.0,
        };
        assert_eq!(verify_location(&section, Some(&nearby)), Some(true));
    }

    #[test]
    fn outside_the_radius_fails_softly() {
        let section = internship(Some(SITE), Some(200.0));
        let far = GeoPoint {
            latitude: 40.01,
            longitude: -75.0,
        };
        assert_eq!(verify_location(&section, Some(&far)), Some(false));
    }

    #[test]
    fn non_internship_sections_are_never_verified() {
        let mut section = internship(Some(SITE), Some(200.0));
        section.section_type = SectionType::Remote;
        assert_eq!(verify_location(&section, Some(&SITE)), None);
    }
}
