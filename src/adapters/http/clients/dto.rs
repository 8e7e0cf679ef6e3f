//! Request bodies and query strings for client routes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::clients::{Client, ClientDetails, FitnessLevel, ManualPayment, ManualPaymentDraft, PackageTerms, PaymentMethod};
use crate::domain::foundation::{AttributeMap, BookingId, ClientId, PackagePurchaseId};

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientListQuery {
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub fitness_level: Option<FitnessLevel>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub preferences: AttributeMap,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<CreateClientRequest> for ClientDetails {
    fn from(req: CreateClientRequest) -> Self {
        ClientDetails {
            name: req.name,
            email: req.email,
            phone: req.phone,
            fitness_level: req.fitness_level,
            goals: req.goals,
            preferences: req.preferences,
            notes: req.notes,
        }
    }
}

/// Partial update. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fitness_level: Option<FitnessLevel>,
    pub goals: Option<Vec<String>>,
    pub preferences: Option<AttributeMap>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateClientRequest {
    fn touches_details(&self) -> bool {
        self.name.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.fitness_level.is_some()
            || self.goals.is_some()
            || self.preferences.is_some()
            || self.notes.is_some()
    }

    /// Merges the request over `current`; `None` when no detail field is set.
    pub fn merged_details(&self, current: &Client) -> Option<ClientDetails> {
        if !self.touches_details() {
            return None;
        }
        Some(ClientDetails {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            email: self.email.clone().unwrap_or_else(|| current.email.clone()),
            phone: self.phone.clone().or_else(|| current.phone.clone()),
            fitness_level: self.fitness_level.or(Some(current.fitness_level)),
            goals: self.goals.clone().unwrap_or_else(|| current.goals.clone()),
            preferences: self.preferences.clone().unwrap_or_else(|| current.preferences.clone()),
            notes: self.notes.clone().or_else(|| Some(current.notes.clone())),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub package_purchase_id: Option<PackagePurchaseId>,
    #[serde(default)]
    pub booking_id: Option<BookingId>,
}

impl From<RecordPaymentRequest> for ManualPaymentDraft {
    fn from(req: RecordPaymentRequest) -> Self {
        ManualPaymentDraft {
            amount_cents: req.amount_cents,
            currency: req.currency,
            method: req.payment_method,
            payment_date: req.payment_date,
            reference_id: req.reference_id,
            notes: req.notes,
            package_purchase_id: req.package_purchase_id,
            booking_id: req.booking_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordPaymentResponse {
    pub payment: ManualPayment,
    pub client: Client,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevenueQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageListQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sessions_count: u32,
    pub price_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub validity_days: Option<u32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl PackageRequest {
    pub fn terms(&self) -> PackageTerms {
        PackageTerms {
            name: self.name.clone(),
            description: self.description.clone(),
            sessions_count: self.sessions_count,
            price_cents: self.price_cents,
            currency: self.currency.clone(),
            validity_days: self.validity_days,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignPackageRequest {
    pub client_id: ClientId,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseListQuery {
    pub client_id: Option<ClientId>,
}
