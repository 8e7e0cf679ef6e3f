//! ListPaymentsHandler - a trainer's provider payments.

use std::sync::Arc;

use crate::domain::billing::Payment;
use crate::domain::foundation::{DomainError, Page, PageRequest};
use crate::domain::identity::TenantContext;
use crate::ports::BillingLedger;

pub struct ListPaymentsHandler {
    ledger: Arc<dyn BillingLedger>,
}

impl ListPaymentsHandler {
    pub fn new(ledger: Arc<dyn BillingLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(&self, ctx: &TenantContext, page: PageRequest) -> Result<Page<Payment>, DomainError> {
        self.ledger.list_payments(ctx.trainer_id, page).await
    }
}
