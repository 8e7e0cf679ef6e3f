//! Weekly availability rules.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AvailabilityRuleId, Timestamp, TrainerId, ValidationError};

/// A recurring weekly window in which a trainer accepts bookings.
///
/// `day_of_week` counts from Monday = 0. Times are civil times in the
/// trainer's zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: AvailabilityRuleId,
    pub trainer_id: TrainerId,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub is_recurring: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AvailabilityRule {
    pub fn new(
        trainer_id: TrainerId,
        day_of_week: u8,
        start_time: NaiveTime,
        end_time: NaiveTime,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        validate_window(day_of_week, start_time, end_time)?;
        Ok(Self {
            id: AvailabilityRuleId::new(),
            trainer_id,
            day_of_week,
            start_time,
            end_time,
            is_active: true,
            is_recurring: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(
        &mut self,
        day_of_week: u8,
        start_time: NaiveTime,
        end_time: NaiveTime,
        is_active: bool,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        validate_window(day_of_week, start_time, end_time)?;
        self.day_of_week = day_of_week;
        self.start_time = start_time;
        self.end_time = end_time;
        self.is_active = is_active;
        self.updated_at = now;
        Ok(())
    }

    /// Whether this rule applies on the given weekday.
    pub fn applies_on(&self, weekday: Weekday) -> bool {
        u32::from(self.day_of_week) == weekday.num_days_from_monday()
    }
}

fn validate_window(day_of_week: u8, start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if day_of_week > 6 {
        return Err(ValidationError::out_of_range("day_of_week", 0, 6, i64::from(day_of_week)));
    }
    if end <= start {
        return Err(ValidationError::invalid_format(
            "end_time",
            "end_time must be after start_time",
        ));
    }
    Ok(())
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(field: &str, raw: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .map_err(|_| ValidationError::invalid_format(field, "expected HH:MM"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn rejects_inverted_windows() {
        let err = AvailabilityRule::new(TrainerId::new(), 0, t(12, 0), t(9, 0), Timestamp::now())
            .unwrap_err();
        assert_eq!(err.field(), "end_time");
        assert!(AvailabilityRule::new(TrainerId::new(), 0, t(9, 0), t(9, 0), Timestamp::now()).is_err());
    }

    #[test]
    fn rejects_day_out_of_range() {
        assert!(AvailabilityRule::new(TrainerId::new(), 7, t(9, 0), t(10, 0), Timestamp::now()).is_err());
    }

    #[test]
    fn monday_is_day_zero() {
        let rule = AvailabilityRule::new(TrainerId::new(), 0, t(9, 0), t(12, 0), Timestamp::now()).unwrap();
        assert!(rule.applies_on(Weekday::Mon));
        assert!(!rule.applies_on(Weekday::Sun));
    }

    #[test]
    fn parses_times() {
        assert_eq!(parse_time_of_day("start_time", "09:30").unwrap(), t(9, 30));
        assert_eq!(parse_time_of_day("start_time", "09:30:00").unwrap(), t(9, 30));
        assert!(parse_time_of_day("start_time", "9am").is_err());
    }
}
