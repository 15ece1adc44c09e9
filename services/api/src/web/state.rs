//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use here_core::attendance::AttendanceService;
use here_core::calendar::CalendarService;
use here_core::enrollment::EnrollmentService;
use here_core::ports::{Clock, DataStore};
use here_core::roster::RosterService;
use here_core::schedule::ScheduleService;

use crate::config::Config;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DataStore>,
    pub clock: Arc<dyn Clock>,
    pub calendar: CalendarService,
    pub schedule: ScheduleService,
    pub attendance: AttendanceService,
    pub enrollment: EnrollmentService,
    pub roster: RosterService,
}

impl AppState {
    /// Wires the core services onto one store and clock.
    pub fn new(config: Arc<Config>, store: Arc<dyn DataStore>, clock: Arc<dyn Clock>) -> Self {
        let calendar = CalendarService::new(store.clone());
        let schedule = ScheduleService::new(store.clone(), calendar.clone());
        let attendance = AttendanceService::new(store.clone(), clock.clone());
        let enrollment = EnrollmentService::new(store.clone(), clock.clone());
        let roster = RosterService::new(store.clone(), attendance.clone());
        Self {
            config,
            store,
            clock,
            calendar,
            schedule,
            attendance,
            enrollment,
            roster,
        }
    }
}
