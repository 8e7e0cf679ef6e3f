//! UsageReader port - live resource counts for entitlement summaries.

use async_trait::async_trait;

use crate::domain::entitlement::ResourceKind;
use crate::domain::foundation::{DomainError, TrainerId};

/// Counts are read live and never cached: active clients, all pages,
/// active workflows.
#[async_trait]
pub trait UsageReader: Send + Sync {
    async fn count(&self, trainer_id: TrainerId, kind: ResourceKind) -> Result<u32, DomainError>;
}
