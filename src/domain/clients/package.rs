//! Prepaid session packages and their purchases.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    format_cents, ClientId, DomainError, ErrorCode, PackageId, PackagePurchaseId, Timestamp,
    TrainerId, ValidationError,
};

/// A package offered by a trainer. (trainer, name) is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub trainer_id: TrainerId,
    pub name: String,
    pub description: String,
    pub sessions_count: u32,
    pub price_cents: i64,
    pub currency: String,
    pub validity_days: Option<u32>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Editable package fields.
#[derive(Debug, Clone)]
pub struct PackageTerms {
    pub name: String,
    pub description: String,
    pub sessions_count: u32,
    pub price_cents: i64,
    pub currency: String,
    pub validity_days: Option<u32>,
}

impl Package {
    pub fn new(trainer_id: TrainerId, terms: PackageTerms, now: Timestamp) -> Result<Self, ValidationError> {
        let terms = validate_terms(terms)?;
        Ok(Self {
            id: PackageId::new(),
            trainer_id,
            name: terms.name,
            description: terms.description,
            sessions_count: terms.sessions_count,
            price_cents: terms.price_cents,
            currency: terms.currency,
            validity_days: terms.validity_days,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&mut self, terms: PackageTerms, is_active: bool, now: Timestamp) -> Result<(), ValidationError> {
        let terms = validate_terms(terms)?;
        self.name = terms.name;
        self.description = terms.description;
        self.sessions_count = terms.sessions_count;
        self.price_cents = terms.price_cents;
        self.currency = terms.currency;
        self.validity_days = terms.validity_days;
        self.is_active = is_active;
        self.updated_at = now;
        Ok(())
    }

    pub fn price_display(&self) -> String {
        format_cents(self.price_cents)
    }
}

fn validate_terms(mut terms: PackageTerms) -> Result<PackageTerms, ValidationError> {
    terms.name = terms.name.trim().to_string();
    if terms.name.is_empty() {
        return Err(ValidationError::empty_field("name"));
    }
    if terms.sessions_count == 0 {
        return Err(ValidationError::out_of_range("sessions_count", 1, i64::from(u32::MAX), 0));
    }
    if terms.price_cents < 0 {
        return Err(ValidationError::invalid_format("price", "price cannot be negative"));
    }
    let currency = terms.currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::invalid_format("currency", "expected a three-letter ISO currency code"));
    }
    terms.currency = currency;
    if terms.validity_days == Some(0) {
        return Err(ValidationError::out_of_range("validity_days", 1, 3650, 0));
    }
    Ok(terms)
}

/// A client's purchase of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePurchase {
    pub id: PackagePurchaseId,
    pub trainer_id: TrainerId,
    pub client_id: ClientId,
    pub package_id: PackageId,
    pub sessions_remaining: u32,
    pub purchased_at: Timestamp,
    pub expiry_date: Option<NaiveDate>,
}

impl PackagePurchase {
    /// Assigns a package to a client. Without an explicit expiry the
    /// package's validity period, if any, starts on `today`.
    pub fn assign(
        package: &Package,
        client_id: ClientId,
        expiry_date: Option<NaiveDate>,
        today: NaiveDate,
        now: Timestamp,
    ) -> Self {
        let expiry_date = expiry_date.or_else(|| {
            package
                .validity_days
                .map(|days| today + Duration::days(i64::from(days)))
        });
        Self {
            id: PackagePurchaseId::new(),
            trainer_id: package.trainer_id,
            client_id,
            package_id: package.id,
            sessions_remaining: package.sessions_count,
            purchased_at: now,
            expiry_date,
        }
    }

    /// Active iff sessions remain and the expiry (if any) has not passed.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.sessions_remaining > 0 && self.expiry_date.map(|exp| exp >= today).unwrap_or(true)
    }

    /// Consumes one session. Fails without change when inactive.
    pub fn use_session(&mut self, today: NaiveDate) -> Result<(), DomainError> {
        if self.sessions_remaining == 0 {
            return Err(DomainError::new(
                ErrorCode::PackageExhausted,
                "No sessions remaining on this package",
            ));
        }
        if !self.is_active(today) {
            return Err(DomainError::new(
                ErrorCode::PackageExhausted,
                "This package has expired",
            )
            .with_detail("reason", "expired"));
        }
        self.sessions_remaining -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn terms(sessions: u32) -> PackageTerms {
        PackageTerms {
            name: "10-pack".into(),
            description: String::new(),
            sessions_count: sessions,
            price_cents: 50000,
            currency: "usd".into(),
            validity_days: Some(90),
        }
    }

    #[test]
    fn validates_terms() {
        assert!(Package::new(TrainerId::new(), terms(0), Timestamp::now()).is_err());
        let mut negative = terms(10);
        negative.price_cents = -1;
        assert!(Package::new(TrainerId::new(), negative, Timestamp::now()).is_err());
        let pkg = Package::new(TrainerId::new(), terms(10), Timestamp::now()).unwrap();
        assert_eq!(pkg.currency, "USD");
        assert_eq!(pkg.price_display(), "500.00");
    }

    #[test]
    fn assignment_derives_expiry_from_validity() {
        let pkg = Package::new(TrainerId::new(), terms(10), Timestamp::now()).unwrap();
        let purchase = PackagePurchase::assign(&pkg, ClientId::new(), None, date("2025-01-01"), Timestamp::now());
        assert_eq!(purchase.sessions_remaining, 10);
        assert_eq!(purchase.expiry_date, Some(date("2025-04-01")));

        let explicit = PackagePurchase::assign(
            &pkg,
            ClientId::new(),
            Some(date("2025-02-01")),
            date("2025-01-01"),
            Timestamp::now(),
        );
        assert_eq!(explicit.expiry_date, Some(date("2025-02-01")));
    }

    #[test]
    fn expired_purchase_cannot_be_used() {
        let pkg = Package::new(TrainerId::new(), terms(3), Timestamp::now()).unwrap();
        let mut purchase = PackagePurchase::assign(
            &pkg,
            ClientId::new(),
            Some(date("2025-01-31")),
            date("2025-01-01"),
            Timestamp::now(),
        );
        assert!(purchase.use_session(date("2025-01-31")).is_ok());
        let err = purchase.use_session(date("2025-02-01")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PackageExhausted);
        assert_eq!(purchase.sessions_remaining, 2);
    }

    proptest! {
        #[test]
        fn use_session_decrements_iff_active(remaining in 0u32..5, expiry_offset in proptest::option::of(-3i64..3)) {
            let today = date("2025-06-15");
            let mut purchase = PackagePurchase {
                id: PackagePurchaseId::new(),
                trainer_id: TrainerId::new(),
                client_id: ClientId::new(),
                package_id: PackageId::new(),
                sessions_remaining: remaining,
                purchased_at: Timestamp::now(),
                expiry_date: expiry_offset.map(|o| today + Duration::days(o)),
            };
            let was_active = purchase.is_active(today);
            let result = purchase.use_session(today);

            if was_active {
                prop_assert!(result.is_ok());
                prop_assert_eq!(purchase.sessions_remaining, remaining - 1);
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(purchase.sessions_remaining, remaining);
            }
        }
    }
}
