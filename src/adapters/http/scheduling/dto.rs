//! Request and response bodies for scheduling routes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::query::parse_clock;
use crate::application::handlers::scheduling::RuleInput;
use crate::domain::foundation::{ClientId, Timestamp, TrainerId};
use crate::domain::scheduling::{Booking, BookingStatus, SlotMap};

#[derive(Debug, Clone, Deserialize)]
pub struct RuleRequest {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl RuleRequest {
    pub fn to_input(&self) -> Result<RuleInput, ApiError> {
        Ok(RuleInput {
            day_of_week: self.day_of_week,
            start_time: parse_clock("start_time", &self.start_time)?,
            end_time: parse_clock("end_time", &self.end_time)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreakRequest {
    pub start_dt: Timestamp,
    pub end_dt: Timestamp,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotsQuery {
    pub trainer_id: TrainerId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_duration")]
    pub duration: u32,
}

fn default_duration() -> u32 {
    60
}

/// `{"2025-03-10": ["09:00", "10:00"]}`; dates without slots are absent.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct SlotsResponse(pub BTreeMap<String, Vec<String>>);

impl From<SlotMap> for SlotsResponse {
    fn from(slots: SlotMap) -> Self {
        Self(
            slots
                .into_iter()
                .map(|(date, times)| {
                    (
                        date.format("%Y-%m-%d").to_string(),
                        times.into_iter().map(|t| t.format("%H:%M").to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub client_id: Option<ClientId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "client")]
    pub client_id: ClientId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RescheduleRequest {
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub notes: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub duration_minutes: i64,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let duration_minutes = booking.duration_minutes();
        Self {
            booking,
            duration_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn slots_render_as_iso_dates_and_clock_times() {
        let mut map = SlotMap::new();
        map.insert(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            vec![NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(10, 30, 0).unwrap()],
        );
        let body = serde_json::to_value(SlotsResponse::from(map)).unwrap();
        assert_eq!(body, serde_json::json!({"2025-03-10": ["09:00", "10:30"]}));
    }

    #[test]
    fn rule_request_rejects_bad_clock() {
        let req = RuleRequest {
            day_of_week: 0,
            start_time: "nine".into(),
            end_time: "17:00".into(),
            is_active: true,
        };
        assert!(req.to_input().is_err());
    }
}
