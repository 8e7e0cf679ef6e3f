//! HealthProbe port - dependency checks for readiness.

use async_trait::async_trait;

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Dependency name reported in the readiness body.
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), String>;
}
