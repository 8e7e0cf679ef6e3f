//! ManualPaymentsHandler - off-platform revenue tracked by the trainer.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use crate::application::events::publish_after_commit;
use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::clients::{Client, ManualPayment, ManualPaymentDraft};
use crate::domain::foundation::{format_cents, ClientId, DomainError, Page, PageRequest, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::workflow::TenantEvent;
use crate::ports::{ClientRepository, EventPublisher, ManualPaymentRepository, TrainerRepository};

/// A page of manual payments plus the total over every matching row.
#[derive(Debug, Clone, Serialize)]
pub struct ManualRevenue {
    #[serde(flatten)]
    pub page: Page<ManualPayment>,
    pub total_cents: i64,
    pub total_display: String,
}

pub struct ManualPaymentsHandler {
    payments: Arc<dyn ManualPaymentRepository>,
    clients: Arc<dyn ClientRepository>,
    trainers: Arc<dyn TrainerRepository>,
    gate: EntitlementGate,
    publisher: Arc<dyn EventPublisher>,
}

impl ManualPaymentsHandler {
    pub fn new(
        payments: Arc<dyn ManualPaymentRepository>,
        clients: Arc<dyn ClientRepository>,
        trainers: Arc<dyn TrainerRepository>,
        gate: EntitlementGate,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            payments,
            clients,
            trainers,
            gate,
            publisher,
        }
    }

    /// Records the payment and returns it with the client's updated rollups.
    pub async fn record(
        &self,
        ctx: &TenantContext,
        client_id: ClientId,
        draft: ManualPaymentDraft,
    ) -> Result<(ManualPayment, Client), DomainError> {
        self.gate.ensure_writable(ctx).await?;
        if self.clients.find(ctx.trainer_id, client_id).await?.is_none() {
            return Err(DomainError::not_found("client"));
        }

        let now = Timestamp::now();
        let payment = ManualPayment::record(ctx.trainer_id, client_id, draft, now)?;
        let client = self.payments.record(&payment).await?;

        if let Some(trainer) = self.trainers.find_by_id(ctx.trainer_id).await? {
            publish_after_commit(
                self.publisher.as_ref(),
                vec![TenantEvent::manual_payment_received(&payment, &client, &trainer, now)],
            )
            .await;
        }
        Ok((payment, client))
    }

    pub async fn list_for_client(&self, ctx: &TenantContext, client_id: ClientId) -> Result<Vec<ManualPayment>, DomainError> {
        self.payments.list_for_client(ctx.trainer_id, client_id).await
    }

    pub async fn revenue(
        &self,
        ctx: &TenantContext,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: PageRequest,
    ) -> Result<ManualRevenue, DomainError> {
        let (page, total_cents) = self.payments.list(ctx.trainer_id, from, to, page).await?;
        Ok(ManualRevenue {
            page,
            total_cents,
            total_display: format_cents(total_cents),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::clients::{ClientPaymentStatus, PaymentMethod};
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::ErrorKind;

    fn draft(cents: i64, day: u32) -> ManualPaymentDraft {
        ManualPaymentDraft {
            amount_cents: cents,
            currency: "USD".into(),
            method: PaymentMethod::Cash,
            payment_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            reference_id: None,
            notes: None,
            package_purchase_id: None,
            booking_id: None,
        }
    }

    #[tokio::test]
    async fn payments_roll_up_into_client_and_revenue() {
        let fx = Fixture::new(Plan::Free).await;
        let client = fx.client("Ari", "ari@example.com").await;
        let handler = ManualPaymentsHandler::new(
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            fx.gate(),
            fx.bus.clone(),
        );

        handler.record(&fx.ctx, client.id, draft(5_000, 2)).await.unwrap();
        let (_, updated) = handler.record(&fx.ctx, client.id, draft(2_550, 1)).await.unwrap();
        assert_eq!(updated.total_paid_cents, 7_550);
        assert_eq!(updated.last_payment_date, NaiveDate::from_ymd_opt(2026, 3, 2));
        assert_eq!(updated.payment_status, ClientPaymentStatus::Paid);

        let revenue = handler.revenue(&fx.ctx, None, None, PageRequest::default()).await.unwrap();
        assert_eq!(revenue.page.total, 2);
        assert_eq!(revenue.total_display, "75.50");
        assert_eq!(fx.bus.events_of_type("payment_received").len(), 2);

        let err = handler.record(&fx.ctx, client.id, draft(0, 3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
