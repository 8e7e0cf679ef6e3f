//! Page repository port.

use async_trait::async_trait;

use super::QuotaWrite;
use crate::domain::foundation::{DomainError, PageId, TrainerId};
use crate::domain::pages::Page;

#[async_trait]
pub trait PageRepository: Send + Sync {
    /// # Errors
    ///
    /// - `Conflict` if the trainer already has a page with this slug
    async fn insert(&self, page: &Page, enforce_quota: bool) -> Result<QuotaWrite, DomainError>;

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<Page>, DomainError>;

    async fn find_published(&self, trainer_id: TrainerId, slug: &str) -> Result<Option<Page>, DomainError>;

    async fn delete(&self, trainer_id: TrainerId, id: PageId) -> Result<bool, DomainError>;
}
