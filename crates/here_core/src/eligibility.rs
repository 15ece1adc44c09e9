//! crates/here_core/src/eligibility.rs
//!
//! The eligibility gate: a pure function deciding whether a wave, check-in,
//! or check-out is currently permitted for a section. Performs no I/O; the
//! caller supplies the already-fetched day status and the clock reading.
//!
//! Denials are advisory values, never errors. The UI decides whether to show
//! a toast or disable a button; the event log remains the authoritative
//! enforcement point for duplicates.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};

use crate::domain::{DayStatus, Section};

/// Check-in opens this long before the section start. Check-in carries a
/// commitment (the plans prompt), so the window is deliberately tighter
/// than the wave window.
const CHECK_IN_LEAD_MINUTES: i64 = 15;

/// Presence waves open this long before the section start and never close.
const WAVE_LEAD_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Wave,
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Allowed,
    Denied {
        reason: String,
        /// Set when the action is merely early, so the UI can show a countdown.
        opens_at: Option<NaiveTime>,
    },
}

impl Eligibility {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Eligibility::Allowed)
    }

    fn denied(reason: impl Into<String>) -> Self {
        Eligibility::Denied {
            reason: reason.into(),
            opens_at: None,
        }
    }

    fn opens_later(reason: String, opens_at: NaiveTime) -> Self {
        Eligibility::Denied {
            reason,
            opens_at: Some(opens_at),
        }
    }
}

/// Evaluates whether `action` is permitted right now for `section` on
/// `target_date`, given the student's recorded `status` for that day.
///
/// The date guard comes first: no action of any kind is permitted for a date
/// other than the current local date.
pub fn check_action(
    section: &Section,
    action: Action,
    status: &DayStatus,
    now: DateTime<FixedOffset>,
    target_date: NaiveDate,
) -> Eligibility {
    if target_date != now.date_naive() {
        return Eligibility::denied("Actions only available for today");
    }

    let time = now.time();
    match action {
        Action::Wave => check_wave(section, time),
        Action::CheckIn => check_check_in(section, status, time),
        Action::CheckOut => check_check_out(section, status),
    }
}

fn check_wave(section: &Section, time: NaiveTime) -> Eligibility {
    if !section.is_presence_only() {
        return Eligibility::denied("Presence waves not enabled for this section");
    }
    let opens = section.start_time - Duration::minutes(WAVE_LEAD_MINUTES);
    if time < opens {
        return Eligibility::opens_later(format!("Wave opens at {}", clock_label(opens)), opens);
    }
    // No upper bound: a wave stays available all day once open.
    Eligibility::Allowed
}

fn check_check_in(section: &Section, status: &DayStatus, time: NaiveTime) -> Eligibility {
    if !section.requires_check_in() {
        return Eligibility::denied("This section does not require check-in");
    }
    if status.has_checked_in {
        return Eligibility::denied("Already checked in today");
    }
    let opens = section.start_time - Duration::minutes(CHECK_IN_LEAD_MINUTES);
    if time < opens {
        return Eligibility::opens_later(
            format!("Check-in opens at {}", clock_label(opens)),
            opens,
        );
    }
    if time > section.end_time {
        return Eligibility::denied("Check-in closed");
    }
    Eligibility::Allowed
}

fn check_check_out(section: &Section, status: &DayStatus) -> Eligibility {
    if !section.requires_check_in() {
        return Eligibility::denied("This section does not require check-in");
    }
    if !status.has_checked_in {
        return Eligibility::denied("Must check in before checking out");
    }
    if status.has_checked_out {
        return Eligibility::denied("Already checked out today");
    }
    // No closing time: a student who forgot to check out can still close
    // the session arbitrarily late the same day.
    Eligibility::Allowed
}

fn clock_label(time: NaiveTime) -> String {
    time.format("%-H:%M").to_string()
}
