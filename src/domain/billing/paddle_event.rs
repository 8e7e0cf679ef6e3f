//! Paddle notification payloads.
//!
//! Only the fields the reconciler reads are extracted; everything else in
//! `data` is kept verbatim in the stored webhook event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::webhook_errors::WebhookError;
use super::SubscriptionStatus;
use crate::domain::entitlement::Plan;
use crate::domain::foundation::Timestamp;

/// Notification envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddleEvent {
    pub event_id: String,
    pub event_type: String,
    #[serde(default)]
    pub occurred_at: Option<String>,
    #[serde(default)]
    pub data: JsonValue,
}

impl PaddleEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        let event: PaddleEvent =
            serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))?;
        if event.event_id.trim().is_empty() {
            return Err(WebhookError::MissingField("event_id"));
        }
        Ok(event)
    }

    pub fn kind(&self) -> PaddleEventKind {
        PaddleEventKind::from_type(&self.event_type)
    }
}

/// Event types the reconciler acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddleEventKind {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionCanceled,
    SubscriptionPastDue,
    SubscriptionPaused,
    SubscriptionResumed,
    TransactionCompleted,
    TransactionPaymentFailed,
    Other,
}

impl PaddleEventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "subscription.created" => PaddleEventKind::SubscriptionCreated,
            "subscription.updated" => PaddleEventKind::SubscriptionUpdated,
            "subscription.canceled" => PaddleEventKind::SubscriptionCanceled,
            "subscription.past_due" => PaddleEventKind::SubscriptionPastDue,
            "subscription.paused" => PaddleEventKind::SubscriptionPaused,
            "subscription.resumed" => PaddleEventKind::SubscriptionResumed,
            "transaction.completed" => PaddleEventKind::TransactionCompleted,
            "transaction.payment_failed" => PaddleEventKind::TransactionPaymentFailed,
            _ => PaddleEventKind::Other,
        }
    }
}

/// Subscription fields extracted from `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub external_subscription_id: String,
    pub external_customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub price_id: Option<String>,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub customer_email: Option<String>,
}

impl SubscriptionSnapshot {
    /// Extracts a snapshot. `fallback_status` is used when the payload has no status.
    pub fn from_data(data: &JsonValue, fallback_status: SubscriptionStatus) -> Result<Self, WebhookError> {
        let external_subscription_id =
            str_at(data, &["id"]).ok_or(WebhookError::MissingField("data.id"))?;

        let status = str_at(data, &["status"])
            .and_then(|s| SubscriptionStatus::from_provider(&s))
            .unwrap_or(fallback_status);

        let price_id = data
            .get("items")
            .and_then(JsonValue::as_array)
            .and_then(|items| items.first())
            .and_then(|item| {
                str_at(item, &["price", "id"]).or_else(|| str_at(item, &["price_id"]))
            });

        let cancel_at_period_end = str_at(data, &["scheduled_change", "action"])
            .map(|action| action == "cancel")
            .unwrap_or(false);

        let customer_email = str_at(data, &["customer", "email"])
            .or_else(|| str_at(data, &["custom_data", "email"]))
            .map(|e| e.trim().to_lowercase());

        Ok(Self {
            external_subscription_id,
            external_customer_id: str_at(data, &["customer_id"]),
            status,
            price_id,
            current_period_start: time_at(data, &["current_billing_period", "starts_at"]),
            current_period_end: time_at(data, &["current_billing_period", "ends_at"]),
            cancel_at_period_end,
            customer_email,
        })
    }
}

/// Transaction fields extracted from `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSnapshot {
    pub transaction_id: String,
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
}

impl TransactionSnapshot {
    pub fn from_data(data: &JsonValue) -> Result<Self, WebhookError> {
        let transaction_id = str_at(data, &["id"]).ok_or(WebhookError::MissingField("data.id"))?;

        let amount_cents = amount_at(data, &["details", "totals", "total"])
            .or_else(|| amount_at(data, &["details", "totals", "grand_total"]))
            .or_else(|| amount_at(data, &["amount"]))
            .unwrap_or(0);

        let currency = str_at(data, &["currency_code"])
            .or_else(|| str_at(data, &["details", "totals", "currency_code"]))
            .unwrap_or_else(|| "USD".to_string())
            .to_ascii_uppercase();

        Ok(Self {
            transaction_id,
            subscription_id: str_at(data, &["subscription_id"]),
            customer_id: str_at(data, &["customer_id"]),
            amount_cents,
            currency,
        })
    }
}

/// Maps provider price identifiers to plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceCatalog {
    pub pro_price_ids: Vec<String>,
    pub business_price_ids: Vec<String>,
}

impl PriceCatalog {
    /// Configured identifiers win; otherwise the id is matched by the
    /// substrings "business" and "pro". Unknown prices map to free.
    pub fn plan_for_price(&self, price_id: Option<&str>) -> Plan {
        let Some(price_id) = price_id else {
            return Plan::Free;
        };
        if self.business_price_ids.iter().any(|p| p == price_id) {
            return Plan::Business;
        }
        if self.pro_price_ids.iter().any(|p| p == price_id) {
            return Plan::Pro;
        }
        let lowered = price_id.to_lowercase();
        if lowered.contains("business") {
            Plan::Business
        } else if lowered.contains("pro") {
            Plan::Pro
        } else {
            Plan::Free
        }
    }
}

fn value_at<'a>(data: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    path.iter().try_fold(data, |node, key| node.get(*key))
}

fn str_at(data: &JsonValue, path: &[&str]) -> Option<String> {
    value_at(data, path)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn time_at(data: &JsonValue, path: &[&str]) -> Option<Timestamp> {
    value_at(data, path)
        .and_then(JsonValue::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| Timestamp::from_datetime(dt.with_timezone(&Utc)))
}

/// Amounts arrive as strings of minor units; plain numbers are accepted too.
fn amount_at(data: &JsonValue, path: &[&str]) -> Option<i64> {
    match value_at(data, path)? {
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Number(n) => n.as_i64(),
        _ => None,
    }
}
