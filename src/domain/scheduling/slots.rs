//! Bookable slot derivation.
//!
//! Slots come from weekly rules, minus days touched by breaks, minus
//! intervals already held by bookings. Dates and times are civil values in
//! the trainer's zone; instants are derived from them with that zone.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::{BTreeMap, BTreeSet};

use super::{AvailabilityRule, BreakPeriod};
use crate::domain::foundation::{Timestamp, ValidationError};

/// Longest window a single query may cover, in days.
pub const MAX_WINDOW_DAYS: i64 = 92;
pub const MIN_SLOT_MINUTES: u32 = 5;
pub const MAX_SLOT_MINUTES: u32 = 24 * 60;

/// Free start times keyed by local date, both ascending.
pub type SlotMap = BTreeMap<NaiveDate, Vec<NaiveTime>>;

/// Validated slot query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub duration_minutes: u32,
}

impl SlotWindow {
    pub fn new(from: NaiveDate, to: NaiveDate, duration_minutes: u32) -> Result<Self, ValidationError> {
        if to < from {
            return Err(ValidationError::invalid_format(
                "end_date",
                "end_date must not be before start_date",
            ));
        }
        let span = (to - from).num_days();
        if span >= MAX_WINDOW_DAYS {
            return Err(ValidationError::out_of_range("end_date", 0, MAX_WINDOW_DAYS - 1, span));
        }
        if !(MIN_SLOT_MINUTES..=MAX_SLOT_MINUTES).contains(&duration_minutes) {
            return Err(ValidationError::out_of_range(
                "duration",
                i64::from(MIN_SLOT_MINUTES),
                i64::from(MAX_SLOT_MINUTES),
                i64::from(duration_minutes),
            ));
        }
        Ok(Self {
            from,
            to,
            duration_minutes,
        })
    }

    /// UTC instants bounding the window in `tz`, padded by a day on each side.
    pub fn instant_bounds(&self, tz: Tz) -> (Timestamp, Timestamp) {
        let pad = Duration::days(1);
        let start = local_midnight(tz, self.from - pad);
        let end = local_midnight(tz, self.to + pad + pad);
        (start, end)
    }
}

/// Candidate start times from rules and breaks only.
pub fn candidate_slots(
    rules: &[AvailabilityRule],
    breaks: &[BreakPeriod],
    tz: Tz,
    window: &SlotWindow,
) -> SlotMap {
    let step = window.duration_minutes * 60;
    let mut result = SlotMap::new();

    let mut date = window.from;
    while date <= window.to {
        if !breaks.iter().any(|b| b.blocks(date, tz)) {
            let mut times = BTreeSet::new();
            for rule in rules.iter().filter(|r| r.is_active && r.applies_on(date.weekday())) {
                let end = rule.end_time.num_seconds_from_midnight();
                let mut start = rule.start_time.num_seconds_from_midnight();
                while start + step <= end {
                    if let Some(t) = NaiveTime::from_num_seconds_from_midnight_opt(start, 0) {
                        times.insert(t);
                    }
                    start += step;
                }
            }
            if !times.is_empty() {
                result.insert(date, times.into_iter().collect());
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    result
}

/// Instant of a civil date and time in `tz`.
///
/// Times inside a spring-forward gap do not exist and yield None; times
/// repeated by a fall-back take the earlier instant.
pub fn slot_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<Timestamp> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| Timestamp::from_datetime(dt.with_timezone(&Utc)))
}

/// Removes non-existent local times and slots overlapping any held interval.
///
/// A slot `[s, e)` conflicts with `[b_start, b_end)` when `b_start < e && b_end > s`.
pub fn remove_conflicts(
    slots: SlotMap,
    tz: Tz,
    duration_minutes: u32,
    held: &[(Timestamp, Timestamp)],
) -> SlotMap {
    let duration = i64::from(duration_minutes);
    slots
        .into_iter()
        .filter_map(|(date, times)| {
            let free: Vec<NaiveTime> = times
                .into_iter()
                .filter(|time| match slot_instant(tz, date, *time) {
                    Some(start) => {
                        let end = start.plus_minutes(duration);
                        !held.iter().any(|(b_start, b_end)| b_start.is_before(&end) && b_end.is_after(&start))
                    }
                    None => false,
                })
                .collect();
            if free.is_empty() {
                None
            } else {
                Some((date, free))
            }
        })
        .collect()
}

fn local_midnight(tz: Tz, date: NaiveDate) -> Timestamp {
    slot_instant(tz, date, NaiveTime::MIN)
        .or_else(|| slot_instant(tz, date, NaiveTime::from_hms_opt(1, 0, 0).unwrap_or(NaiveTime::MIN)))
        .unwrap_or_else(|| Timestamp::from_datetime(date.and_time(NaiveTime::MIN).and_utc()))
}
