use async_trait::async_trait;
use chrono::NaiveDate;

use super::InMemoryStore;
use crate::domain::clients::{Client, ManualPayment, Package, PackagePurchase};
use crate::domain::entitlement::ResourceKind;
use crate::domain::foundation::{
    ClientId, DomainError, PackageId, PackagePurchaseId, Page, PageRequest, Timestamp, TrainerId,
};
use crate::ports::{
    ClientFilter, ClientRepository, ManualPaymentRepository, PackageRepository, QuotaWrite,
    SessionUse,
};

#[async_trait]
impl ClientRepository for InMemoryStore {
    async fn insert(&self, client: &Client, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut state = self.write().await;
        let duplicate = state
            .clients
            .values()
            .any(|c| c.trainer_id == client.trainer_id && c.email == client.email);
        if duplicate {
            return Err(DomainError::conflict("A client with this email already exists").with_detail("field", "email"));
        }
        let decision = state.quota(client.trainer_id, ResourceKind::Clients, enforce_quota && client.is_active);
        if decision == QuotaWrite::Written {
            state.clients.insert(client.id, client.clone());
        }
        Ok(decision)
    }

    async fn update(&self, client: &Client, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut state = self.write().await;
        let was_active = match state.clients.get(&client.id) {
            Some(existing) if existing.trainer_id == client.trainer_id => existing.is_active,
            _ => return Err(DomainError::not_found("Client")),
        };
        let duplicate = state
            .clients
            .values()
            .any(|c| c.id != client.id && c.trainer_id == client.trainer_id && c.email == client.email);
        if duplicate {
            return Err(DomainError::conflict("A client with this email already exists").with_detail("field", "email"));
        }
        let activating = client.is_active && !was_active;
        let decision = state.quota(client.trainer_id, ResourceKind::Clients, enforce_quota && activating);
        if decision == QuotaWrite::Written {
            state.clients.insert(client.id, client.clone());
        }
        Ok(decision)
    }

    async fn find(&self, trainer_id: TrainerId, id: ClientId) -> Result<Option<Client>, DomainError> {
        Ok(self
            .read()
            .await
            .clients
            .get(&id)
            .filter(|c| c.trainer_id == trainer_id)
            .cloned())
    }

    async fn find_by_id(&self, id: ClientId) -> Result<Option<Client>, DomainError> {
        Ok(self.read().await.clients.get(&id).cloned())
    }

    async fn list(&self, trainer_id: TrainerId, filter: &ClientFilter, page: PageRequest) -> Result<Page<Client>, DomainError> {
        let state = self.read().await;
        let mut clients: Vec<Client> = state
            .clients
            .values()
            .filter(|c| c.trainer_id == trainer_id && filter.matches(c))
            .cloned()
            .collect();
        clients.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(Page::new(page.slice(&clients), clients.len() as u64, page))
    }

    async fn delete(&self, trainer_id: TrainerId, id: ClientId) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        if !state.clients.get(&id).map_or(false, |c| c.trainer_id == trainer_id) {
            return Ok(false);
        }
        state.clients.remove(&id);
        state.bookings.retain(|_, b| b.client_id != id);
        state.purchases.retain(|_, p| p.client_id != id);
        state.manual_payments.retain(|p| p.client_id != id);
        Ok(true)
    }
}

#[async_trait]
impl PackageRepository for InMemoryStore {
    async fn save(&self, package: &Package) -> Result<(), DomainError> {
        let mut state = self.write().await;
        let duplicate = state
            .packages
            .values()
            .any(|p| p.id != package.id && p.trainer_id == package.trainer_id && p.name == package.name);
        if duplicate {
            return Err(DomainError::conflict("A package with this name already exists").with_detail("field", "name"));
        }
        state.packages.insert(package.id, package.clone());
        Ok(())
    }

    async fn find(&self, trainer_id: TrainerId, id: PackageId) -> Result<Option<Package>, DomainError> {
        Ok(self
            .read()
            .await
            .packages
            .get(&id)
            .filter(|p| p.trainer_id == trainer_id)
            .cloned())
    }

    async fn list(&self, trainer_id: TrainerId, active_only: bool) -> Result<Vec<Package>, DomainError> {
        let state = self.read().await;
        let mut packages: Vec<Package> = state
            .packages
            .values()
            .filter(|p| p.trainer_id == trainer_id && (!active_only || p.is_active))
            .cloned()
            .collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    async fn insert_purchase(&self, purchase: &PackagePurchase) -> Result<(), DomainError> {
        self.write().await.purchases.insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn list_purchases(&self, trainer_id: TrainerId, client_id: Option<ClientId>) -> Result<Vec<PackagePurchase>, DomainError> {
        let state = self.read().await;
        let mut purchases: Vec<PackagePurchase> = state
            .purchases
            .values()
            .filter(|p| p.trainer_id == trainer_id && client_id.map_or(true, |c| p.client_id == c))
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(purchases)
    }

    async fn consume_session(&self, trainer_id: TrainerId, id: PackagePurchaseId, today: NaiveDate) -> Result<SessionUse, DomainError> {
        let mut state = self.write().await;
        let purchase = match state.purchases.get_mut(&id) {
            Some(p) if p.trainer_id == trainer_id => p,
            _ => return Ok(SessionUse::NotFound),
        };
        if purchase.sessions_remaining == 0 {
            return Ok(SessionUse::Exhausted);
        }
        if !purchase.is_active(today) {
            return Ok(SessionUse::Expired);
        }
        purchase.sessions_remaining -= 1;
        Ok(SessionUse::Consumed(purchase.clone()))
    }
}

#[async_trait]
impl ManualPaymentRepository for InMemoryStore {
    async fn record(&self, payment: &ManualPayment) -> Result<Client, DomainError> {
        let mut state = self.write().await;
        let client = match state.clients.get_mut(&payment.client_id) {
            Some(c) if c.trainer_id == payment.trainer_id => c,
            _ => return Err(DomainError::not_found("Client")),
        };
        client.record_payment(payment.amount_cents, payment.payment_date, Timestamp::now());
        let updated = client.clone();
        state.manual_payments.push(payment.clone());
        Ok(updated)
    }

    async fn list_for_client(&self, trainer_id: TrainerId, client_id: ClientId) -> Result<Vec<ManualPayment>, DomainError> {
        let state = self.read().await;
        let mut payments: Vec<ManualPayment> = state
            .manual_payments
            .iter()
            .filter(|p| p.trainer_id == trainer_id && p.client_id == client_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.created_at.cmp(&a.created_at)));
        Ok(payments)
    }

    async fn list(
        &self,
        trainer_id: TrainerId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: PageRequest,
    ) -> Result<(Page<ManualPayment>, i64), DomainError> {
        let state = self.read().await;
        let mut payments: Vec<ManualPayment> = state
            .manual_payments
            .iter()
            .filter(|p| {
                p.trainer_id == trainer_id
                    && from.map_or(true, |f| p.payment_date >= f)
                    && to.map_or(true, |t| p.payment_date <= t)
            })
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.created_at.cmp(&a.created_at)));
        let total: i64 = payments.iter().map(|p| p.amount_cents).sum();
        Ok((Page::new(page.slice(&payments), payments.len() as u64, page), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::Subscription;
    use crate::domain::clients::ClientDetails;
    use crate::domain::entitlement::PlanLimits;
    use crate::ports::SubscriptionRepository;

    fn client(trainer: TrainerId, n: usize) -> Client {
        Client::new(
            trainer,
            ClientDetails {
                name: format!("Client {}", n),
                email: format!("client{}@example.com", n),
                ..ClientDetails::default()
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn free_plan_stops_at_client_allowance() {
        let store = InMemoryStore::new();
        let trainer = TrainerId::new();
        SubscriptionRepository::save(&store, &Subscription::free(trainer, Timestamp::now()))
            .await
            .unwrap();
        let limit = PlanLimits::for_plan(crate::domain::entitlement::Plan::Free)
            .limit_for(ResourceKind::Clients)
            .unwrap_or(u32::MAX) as usize;

        for n in 0..limit {
            assert_eq!(store.insert(&client(trainer, n), true).await.unwrap(), QuotaWrite::Written);
        }
        assert!(matches!(
            store.insert(&client(trainer, limit), true).await.unwrap(),
            QuotaWrite::Denied(_)
        ));

        let mut inactive = client(trainer, limit + 1);
        inactive.set_active(false, Timestamp::now());
        assert_eq!(store.insert(&inactive, true).await.unwrap(), QuotaWrite::Written);

        inactive.set_active(true, Timestamp::now());
        assert!(matches!(store.update(&inactive, true).await.unwrap(), QuotaWrite::Denied(_)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        let trainer = TrainerId::new();
        store.insert(&client(trainer, 1), false).await.unwrap();
        let err = store.insert(&client(trainer, 1), false).await.unwrap_err();
        assert_eq!(err.kind(), crate::domain::foundation::ErrorKind::Conflict);
        assert!(store.insert(&client(TrainerId::new(), 1), false).await.is_ok());
    }
}
