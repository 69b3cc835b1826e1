//! Refresh decision table.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::config::{CURRENT_DELAY, STALE_AFTER_DAYS, STALE_DELAY, UPDATED_DELAY};

/// What one refresh cycle does after comparing remote and local dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The remote source is newer: download it, then wait 72 hours.
    Update,
    /// Nothing newer remotely, but the local files are over 3 days old: wait 6 hours.
    Stale,
    /// Local files are recent: wait 24 hours.
    Current,
}

impl Decision {
    /// Wait before the next cycle.
    pub fn delay(self) -> Duration {
        match self {
            Decision::Update => UPDATED_DELAY,
            Decision::Stale => STALE_DELAY,
            Decision::Current => CURRENT_DELAY,
        }
    }
}

/// Compares dates only (UTC); `local = None` means no data file exists.
pub fn decide(remote: DateTime<Utc>, local: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Decision {
    let Some(local) = local else {
        return Decision::Update;
    };
    let remote_date = remote.date_naive();
    let local_date = local.date_naive();

    if remote_date > local_date {
        Decision::Update
    } else if start_of(local_date) + TimeDelta::days(STALE_AFTER_DAYS as i64) < now {
        Decision::Stale
    } else {
        Decision::Current
    }
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
