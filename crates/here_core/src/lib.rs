pub mod attendance;
pub mod calendar;
pub mod domain;
pub mod eligibility;
pub mod enrollment;
pub mod ports;
pub mod roster;
pub mod schedule;

pub use attendance::{ActionOutcome, AttendanceService, DEFAULT_WAVE_MOOD};
pub use calendar::{CalendarImportRow, CalendarService, ImportOutcome};
pub use domain::{
    AbDay, AttendanceEvent, AttendanceMark, CalendarDay, DayStatus, Enrollment, EventType,
    GeoPoint, MarkStatus, ResolvedDay, Role, SchedulePattern, Section, SectionConfigError,
    SectionType, Student, Weekday, WeekdaySet,
};
pub use eligibility::{check_action, Action, Eligibility};
pub use enrollment::{EnrollmentService, EnrollmentSummary};
pub use ports::{Clock, DataStore, PortError, PortResult};
pub use roster::{MarkEntry, MarkSaveOutcome, RosterEntry, RosterService};
pub use schedule::{section_matches, ScheduleService};
