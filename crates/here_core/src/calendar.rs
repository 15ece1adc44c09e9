//! crates/here_core/src/calendar.rs
//!
//! The calendar resolver: maps a calendar date to a school-day status and
//! A/B rotation designation, and owns the administrator-facing mutations
//! (bulk import, single-day overrides).

use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use regex::Regex;

use crate::domain::{AbDay, CalendarDay, ResolvedDay};
use crate::ports::{DataStore, PortResult};

/// One raw row of a calendar import, before validation. `line` is the
/// 1-based line number in the uploaded file, used in error messages.
#[derive(Debug, Clone)]
pub struct CalendarImportRow {
    pub line: usize,
    pub date: String,
    pub day_type: String,
}

/// The outcome of a bulk import. Validation failures reject the whole batch
/// and report every offending row; nothing is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Applied { imported: usize },
    Rejected { errors: Vec<String> },
}

#[derive(Clone)]
pub struct CalendarService {
    store: Arc<dyn DataStore>,
}

impl CalendarService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Resolves a date to its school-day status. Absence of a stored row is
    /// not an error: the calendar is default-open.
    pub async fn resolve(&self, date: NaiveDate) -> PortResult<ResolvedDay> {
        Ok(match self.store.calendar_day(date).await? {
            Some(day) => ResolvedDay {
                is_school_day: day.is_school_day,
                ab_designation: day.ab_designation,
            },
            None => ResolvedDay::default_open(),
        })
    }

    /// Validates every row, then replaces the entire calendar with the batch.
    ///
    /// The replace is a destructive full overwrite performed in a single
    /// store transaction; any validation failure rejects the batch wholesale
    /// with per-row messages and applies nothing.
    pub async fn import(&self, rows: &[CalendarImportRow]) -> PortResult<ImportOutcome> {
        let mut days = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for row in rows {
            match validate_row(row) {
                Ok(day) => days.push(day),
                Err(message) => errors.push(message),
            }
        }

        if !errors.is_empty() {
            return Ok(ImportOutcome::Rejected { errors });
        }

        let imported = days.len();
        self.store.replace_calendar(days).await?;
        Ok(ImportOutcome::Applied { imported })
    }

    /// Marks a single date as a day off (upsert by date).
    pub async fn mark_day_off(&self, date: NaiveDate) -> PortResult<()> {
        self.store
            .upsert_calendar_day(CalendarDay {
                date,
                is_school_day: false,
                ab_designation: None,
                notes: Some("Day off".to_string()),
            })
            .await
    }

    /// Deletes the date's row, reverting it to the default-open policy.
    pub async fn unmark_day_off(&self, date: NaiveDate) -> PortResult<()> {
        self.store.delete_calendar_day(date).await
    }

    pub async fn days_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<CalendarDay>> {
        self.store.calendar_days_in_range(from, to).await
    }
}

fn date_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"))
}

/// Validates one import row into a `CalendarDay`, or a per-row error message.
fn validate_row(row: &CalendarImportRow) -> Result<CalendarDay, String> {
    if !date_format().is_match(&row.date) {
        return Err(format!(
            "Row {}: Invalid date format \"{}\" (expected YYYY-MM-DD)",
            row.line, row.date
        ));
    }
    let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|_| {
        format!(
            "Row {}: \"{}\" is not a real calendar date",
            row.line, row.date
        )
    })?;

    let day_type = row.day_type.trim().to_uppercase();
    let (is_school_day, ab_designation, notes) = match day_type.as_str() {
        "A" => (true, Some(AbDay::ADay), None),
        "B" => (true, Some(AbDay::BDay), None),
        "OFF" => (false, None, Some("Day off".to_string())),
        other => {
            return Err(format!(
                "Row {}: Invalid day_type \"{}\" (expected A, B, or off)",
                row.line, other
            ));
        }
    };

    Ok(CalendarDay {
        date,
        is_school_day,
        ab_designation,
        notes,
    })
}
