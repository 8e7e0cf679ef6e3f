//! Query-string and value parsing shared by the route modules.

use chrono::NaiveTime;
use serde::Deserialize;

use super::error::ApiError;
use crate::domain::foundation::PageRequest;

/// `?offset=&limit=` pagination, clamped by `PageRequest`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl From<PageQuery> for PageRequest {
    fn from(q: PageQuery) -> Self {
        PageRequest::new(q.offset, q.limit)
    }
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(field: &str, value: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ApiError::bad_request(field, format!("'{}' is not a time of day (HH:MM)", value)))
}
