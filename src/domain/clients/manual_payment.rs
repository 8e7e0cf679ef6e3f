//! Payments trainers record by hand (cash, transfers, third-party apps).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{
    format_cents, BookingId, ClientId, ManualPaymentId, Money, PackagePurchaseId, Timestamp,
    TrainerId, ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Stripe,
    Paypal,
    BankTransfer,
    Cash,
    Venmo,
    Zelle,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 7] = [
        PaymentMethod::Stripe,
        PaymentMethod::Paypal,
        PaymentMethod::BankTransfer,
        PaymentMethod::Cash,
        PaymentMethod::Venmo,
        PaymentMethod::Zelle,
        PaymentMethod::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Venmo => "venmo",
            PaymentMethod::Zelle => "zelle",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("method", format!("unknown payment method '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualPayment {
    pub id: ManualPaymentId,
    pub trainer_id: TrainerId,
    pub client_id: ClientId,
    pub amount_cents: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub reference_id: Option<String>,
    pub notes: String,
    pub package_purchase_id: Option<PackagePurchaseId>,
    pub booking_id: Option<BookingId>,
    pub created_at: Timestamp,
}

/// Fields supplied when recording a payment.
#[derive(Debug, Clone)]
pub struct ManualPaymentDraft {
    pub amount_cents: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub package_purchase_id: Option<PackagePurchaseId>,
    pub booking_id: Option<BookingId>,
}

impl ManualPayment {
    pub fn record(
        trainer_id: TrainerId,
        client_id: ClientId,
        draft: ManualPaymentDraft,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let money = Money::positive(draft.amount_cents, &draft.currency)?;
        Ok(Self {
            id: ManualPaymentId::new(),
            trainer_id,
            client_id,
            amount_cents: money.cents(),
            currency: money.currency().to_string(),
            method: draft.method,
            payment_date: draft.payment_date,
            reference_id: draft.reference_id.filter(|r| !r.trim().is_empty()),
            notes: draft.notes.unwrap_or_default(),
            package_purchase_id: draft.package_purchase_id,
            booking_id: draft.booking_id,
            created_at: now,
        })
    }

    pub fn amount_display(&self) -> String {
        format_cents(self.amount_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(amount: i64) -> ManualPaymentDraft {
        ManualPaymentDraft {
            amount_cents: amount,
            currency: "usd".into(),
            method: PaymentMethod::Cash,
            payment_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            reference_id: Some("  ".into()),
            notes: None,
            package_purchase_id: None,
            booking_id: None,
        }
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(ManualPayment::record(TrainerId::new(), ClientId::new(), draft(0), Timestamp::now()).is_err());
        let payment = ManualPayment::record(TrainerId::new(), ClientId::new(), draft(4500), Timestamp::now()).unwrap();
        assert_eq!(payment.amount_display(), "45.00");
        assert_eq!(payment.currency, "USD");
        assert!(payment.reference_id.is_none());
    }

    #[test]
    fn methods_parse() {
        assert_eq!("bank_transfer".parse::<PaymentMethod>().unwrap(), PaymentMethod::BankTransfer);
        assert!("crypto".parse::<PaymentMethod>().is_err());
    }
}
