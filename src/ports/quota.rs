//! Result of quota-bearing writes.

use crate::domain::entitlement::QuotaCheck;

/// Outcome of an insert or update that may consume quota.
///
/// Adapters recount the live usage inside the writing transaction while
/// holding a lock on the trainer's subscription row, so two concurrent
/// writes cannot both take the last unit of allowance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaWrite {
    Written,
    /// Nothing was written.
    Denied(QuotaCheck),
}

impl QuotaWrite {
    pub fn into_result(self) -> Result<(), crate::domain::foundation::DomainError> {
        match self {
            QuotaWrite::Written => Ok(()),
            QuotaWrite::Denied(check) => check.into_result(),
        }
    }
}
