//! crates/here_core/src/schedule.rs
//!
//! The schedule matcher: given a person, a role, and a calendar date,
//! determines which of their sections are active on that date.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar::CalendarService;
use crate::domain::{AbDay, ResolvedDay, Role, SchedulePattern, Section, Weekday};
use crate::ports::{DataStore, PortResult};

/// Whether `section` meets on a resolved school day. Callers must have
/// already established that the day is a school day; off days short-circuit
/// to an empty agenda before any pattern is consulted.
pub fn section_matches(
    section: &Section,
    resolved: &ResolvedDay,
    weekday: Option<Weekday>,
) -> bool {
    match section.schedule_pattern {
        SchedulePattern::EveryDay => true,
        SchedulePattern::SpecificDays => match weekday {
            // Weekends carry no weekday index and never match.
            Some(day) => section.days_of_week.contains(day),
            None => false,
        },
        SchedulePattern::ADays => resolved.ab_designation == Some(AbDay::ADay),
        SchedulePattern::BDays => resolved.ab_designation == Some(AbDay::BDay),
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn DataStore>,
    calendar: CalendarService,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn DataStore>, calendar: CalendarService) -> Self {
        Self { store, calendar }
    }

    /// The person's active sections on `date`, ascending by start time.
    ///
    /// An off day returns an empty list unconditionally, regardless of any
    /// section's pattern. An empty result is not an error.
    pub async fn active_sections(
        &self,
        person_id: Uuid,
        role: Role,
        date: NaiveDate,
    ) -> PortResult<Vec<Section>> {
        let resolved = self.calendar.resolve(date).await?;
        if !resolved.is_school_day {
            return Ok(Vec::new());
        }

        let candidates = match role {
            Role::Student => self.store.sections_for_student(person_id).await?,
            Role::Teacher => self.store.sections_for_teacher(person_id).await?,
        };

        let weekday = Weekday::from_date(date);
        let mut active: Vec<Section> = candidates
            .into_iter()
            .filter(|section| section_matches(section, &resolved, weekday))
            .collect();
        active.sort_by_key(|section| section.start_time);
        Ok(active)
    }
}
