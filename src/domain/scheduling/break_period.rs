//! Time off that blocks whole days of availability.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BreakId, Timestamp, TrainerId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    pub id: BreakId,
    pub trainer_id: TrainerId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub reason: Option<String>,
    pub created_at: Timestamp,
}

impl BreakPeriod {
    pub fn new(
        trainer_id: TrainerId,
        start: Timestamp,
        end: Timestamp,
        reason: Option<String>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        if !start.is_before(&end) {
            return Err(ValidationError::invalid_format("end", "end must be after start"));
        }
        Ok(Self {
            id: BreakId::new(),
            trainer_id,
            start,
            end,
            reason: reason.filter(|r| !r.trim().is_empty()),
            created_at: now,
        })
    }

    /// Closed range of local dates touched by the break in `tz`.
    pub fn local_dates(&self, tz: Tz) -> (NaiveDate, NaiveDate) {
        (
            self.start.as_datetime().with_timezone(&tz).date_naive(),
            self.end.as_datetime().with_timezone(&tz).date_naive(),
        )
    }

    /// True when `date` falls within the break's closed local date range.
    pub fn blocks(&self, date: NaiveDate, tz: Tz) -> bool {
        let (first, last) = self.local_dates(tz);
        first <= date && date <= last
    }
}
