//! crates/here_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use uuid::Uuid;

/// The A/B rotation designation of a school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbDay {
    ADay,
    BDay,
}

/// One calendar date's school status, as maintained by an administrator.
///
/// A date with no stored `CalendarDay` is a default school day with no A/B
/// designation; only an explicit row with `is_school_day = false` marks a
/// day off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_school_day: bool,
    pub ab_designation: Option<AbDay>,
    pub notes: Option<String>,
}

/// The outcome of resolving a calendar date (see `calendar::CalendarService`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDay {
    pub is_school_day: bool,
    pub ab_designation: Option<AbDay>,
}

impl ResolvedDay {
    /// The default-open policy: any date without an explicit record.
    pub fn default_open() -> Self {
        Self {
            is_school_day: true,
            ab_designation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    InPerson,
    Remote,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePattern {
    EveryDay,
    SpecificDays,
    ADays,
    BDays,
}

/// A school weekday. Saturday and Sunday are never school days and have no
/// representation here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weekday {
    Monday = 0,
    Tuesday = 1,
    Wednesday = 2,
    Thursday = 3,
    Friday = 4,
}

impl Weekday {
    /// Maps a calendar date to a school weekday. Returns `None` on weekends.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::from_index(chrono::Datelike::weekday(&date).num_days_from_monday() as u8).ok()
    }

    /// Parses a weekday index (0 = Monday .. 4 = Friday).
    pub fn from_index(index: u8) -> Result<Self, WeekdayError> {
        match index {
            0 => Ok(Weekday::Monday),
            1 => Ok(Weekday::Tuesday),
            2 => Ok(Weekday::Wednesday),
            3 => Ok(Weekday::Thursday),
            4 => Ok(Weekday::Friday),
            other => Err(WeekdayError::OutOfRange(other)),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WeekdayError {
    #[error("Weekday index {0} is out of range (expected 0..=4, Monday..Friday)")]
    OutOfRange(u8),
}

/// A set of school weekdays, stored as a 5-bit mask.
///
/// Replaces the loosely-typed serialized array the data used to be kept in;
/// indices are validated when the set is parsed at the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn from_indices<I: IntoIterator<Item = u8>>(indices: I) -> Result<Self, WeekdayError> {
        let mut set = WeekdaySet::EMPTY;
        for index in indices {
            set.insert(Weekday::from_index(index)?);
        }
        Ok(set)
    }

    /// Reconstructs a set from its raw bitmask, ignoring bits above Friday.
    pub fn from_bits(bits: u8) -> Self {
        WeekdaySet(bits & 0b1_1111)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day as u8;
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day as u8) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn indices(&self) -> Vec<u8> {
        (0u8..5).filter(|i| self.0 & (1 << i) != 0).collect()
    }
}

/// A geographic coordinate, used for soft internship location checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Great-circle distance to `other` in meters (haversine formula).
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlng = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// A scheduled block of instruction or work.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: Uuid,
    pub name: String,
    pub section_type: SectionType,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub schedule_pattern: SchedulePattern,
    /// Populated only when `schedule_pattern` is `SpecificDays`.
    pub days_of_week: WeekdaySet,
    pub presence_enabled: bool,
    pub attendance_enabled: bool,
    pub expected_location: Option<GeoPoint>,
    pub geofence_radius_m: Option<f64>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SectionConfigError {
    #[error("A specific-days schedule requires at least one weekday")]
    EmptyDays,
}

impl Section {
    /// Validates the weekday set against the schedule pattern at the
    /// boundary: `SpecificDays` requires a non-empty set, every other
    /// pattern clears it.
    pub fn normalize_days(
        pattern: SchedulePattern,
        days: WeekdaySet,
    ) -> Result<WeekdaySet, SectionConfigError> {
        match pattern {
            SchedulePattern::SpecificDays if days.is_empty() => Err(SectionConfigError::EmptyDays),
            SchedulePattern::SpecificDays => Ok(days),
            _ => Ok(WeekdaySet::EMPTY),
        }
    }

    /// Remote and internship sections require formal check-in/check-out.
    /// In-person sections support only the optional presence wave.
    pub fn requires_check_in(&self) -> bool {
        matches!(
            self.section_type,
            SectionType::Remote | SectionType::Internship
        )
    }

    /// Whether the section's only signal is the casual presence wave.
    pub fn is_presence_only(&self) -> bool {
        self.presence_enabled && !self.requires_check_in()
    }
}

/// The role a person is acting under for a given request. Role resolution is
/// an explicit parameter into the core, never ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
}

/// A (student, section) relationship. Soft-deleted (`active = false`) rather
/// than hard-deleted, so re-enrollment reactivates the same row.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub student_id: Uuid,
    pub section_id: Uuid,
    pub active: bool,
    pub enrolled_at: DateTime<FixedOffset>,
}

/// A student as known to the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    CheckIn,
    CheckOut,
}

/// One attendance event row. At most one per
/// (student, section, date, event_type), enforced by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEvent {
    pub id: Uuid,
    pub student_id: Uuid,
    pub section_id: Uuid,
    pub event_type: EventType,
    pub date: NaiveDate,
    pub timestamp: DateTime<FixedOffset>,
    pub location: Option<GeoPoint>,
    /// Soft verification result for internship check-ins. `None` when no
    /// geofence applies; never blocks the event either way.
    pub location_verified: Option<bool>,
}

/// A new attendance event, before the store assigns it an id.
#[derive(Debug, Clone)]
pub struct NewAttendanceEvent {
    pub student_id: Uuid,
    pub section_id: Uuid,
    pub event_type: EventType,
    pub date: NaiveDate,
    pub timestamp: DateTime<FixedOffset>,
    pub location: Option<GeoPoint>,
    pub location_verified: Option<bool>,
}

/// A casual "I'm here" signal. Not mutually exclusive with attendance events
/// and not unique per day.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceInteraction {
    pub id: Uuid,
    pub student_id: Uuid,
    pub section_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
    pub mood: String,
}

#[derive(Debug, Clone)]
pub struct NewPresenceInteraction {
    pub student_id: Uuid,
    pub section_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
    pub mood: String,
}

/// Teacher-entered roster status for one student on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceMark {
    pub student_id: Uuid,
    pub section_id: Uuid,
    pub date: NaiveDate,
    pub status: MarkStatus,
    pub notes: Option<String>,
    pub marked_by: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkStatus {
    Present,
    Absent,
    Excused,
}

/// The per-(student, section, date) hydration record consumed by the agenda
/// view and the eligibility gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayStatus {
    pub has_checked_in: bool,
    pub has_checked_out: bool,
    pub has_waved: bool,
    pub plans: Option<String>,
    pub progress: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn weekday_set_rejects_out_of_range_indices() {
        let err = WeekdaySet::from_indices([0, 5]).unwrap_err();
        assert_eq!(err, WeekdayError::OutOfRange(5));
    }

    #[test]
    fn weekday_set_round_trips_indices() {
        let set = WeekdaySet::from_indices([0, 2, 4]).unwrap();
        assert!(set.contains(Weekday::Monday));
        assert!(!set.contains(Weekday::Tuesday));
        assert_eq!(set.indices(), vec![0, 2, 4]);
        assert_eq!(WeekdaySet::from_bits(set.bits()), set);
    }

    #[test]
    fn weekends_have_no_school_weekday() {
        // 2026-01-10 is a Saturday, 2026-01-12 a Monday.
        assert_eq!(
            Weekday::from_date(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()),
            None
        );
        assert_eq!(
            Weekday::from_date(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()),
            Some(Weekday::Monday)
        );
    }

    #[test]
    fn specific_days_require_a_non_empty_set() {
        let err =
            Section::normalize_days(SchedulePattern::SpecificDays, WeekdaySet::EMPTY).unwrap_err();
        assert_eq!(err, SectionConfigError::EmptyDays);

        let days = WeekdaySet::from_indices([1, 3]).unwrap();
        assert_eq!(
            Section::normalize_days(SchedulePattern::SpecificDays, days),
            Ok(days)
        );
        // Other patterns ignore and clear the set.
        assert_eq!(
            Section::normalize_days(SchedulePattern::EveryDay, days),
            Ok(WeekdaySet::EMPTY)
        );
    }

    #[test]
    fn haversine_distance_is_roughly_right() {
        // Two points ~111m apart along a meridian (0.001 degrees latitude).
        let a = GeoPoint {
            latitude: 40.0,
            longitude: -75.0,
        };
        let b = GeoPoint {
            latitude: 40.001,
            longitude: -75.0,
        };
        let d = a.distance_m(&b);
        assert!((d - 111.0).abs() < 2.0, "distance was {d}");
    }
}
