//! services/api/src/adapters/clock.rs
//!
//! The concrete implementation of the `Clock` port: system time shifted
//! into the school's configured UTC offset.

use chrono::{DateTime, FixedOffset, Utc};
use here_core::ports::Clock;

/// A clock pinned to the school's wall-clock offset.
pub struct SchoolClock {
    offset: FixedOffset,
}

impl SchoolClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SchoolClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}
