//! Workflow ports - definitions, templates and the execution log.

use async_trait::async_trait;

use super::QuotaWrite;
use crate::domain::foundation::{
    DomainError, ExecutionId, Page, PageRequest, TemplateId, TrainerId, WorkflowId,
};
use crate::domain::workflow::{
    EventKind, ExecutionStatus, MessageTemplate, Workflow, WorkflowExecution,
};

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// With `enforce_quota` an active workflow counts against the plan.
    async fn insert(&self, workflow: &Workflow, enforce_quota: bool) -> Result<QuotaWrite, DomainError>;

    /// Replaces the definition and its actions. With `enforce_quota`,
    /// activating an inactive workflow counts against the plan.
    async fn update(&self, workflow: &Workflow, enforce_quota: bool) -> Result<QuotaWrite, DomainError>;

    async fn find(&self, trainer_id: TrainerId, id: WorkflowId) -> Result<Option<Workflow>, DomainError>;

    async fn find_by_id(&self, id: WorkflowId) -> Result<Option<Workflow>, DomainError>;

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<Workflow>, DomainError>;

    /// Active workflows of the trainer subscribed to `kind`.
    async fn list_active_for_event(&self, trainer_id: TrainerId, kind: EventKind) -> Result<Vec<Workflow>, DomainError>;

    async fn delete(&self, trainer_id: TrainerId, id: WorkflowId) -> Result<bool, DomainError>;

    /// Whether any workflow action references the template.
    async fn template_in_use(&self, trainer_id: TrainerId, template_id: TemplateId) -> Result<bool, DomainError>;
}

#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    async fn insert(&self, execution: &WorkflowExecution) -> Result<(), DomainError>;

    async fn update(&self, execution: &WorkflowExecution) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: ExecutionId) -> Result<Option<WorkflowExecution>, DomainError>;

    /// Newest first.
    async fn list(
        &self,
        trainer_id: TrainerId,
        workflow_id: Option<WorkflowId>,
        status: Option<ExecutionStatus>,
        page: PageRequest,
    ) -> Result<Page<WorkflowExecution>, DomainError>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// # Errors
    ///
    /// - `Conflict` if the trainer already has a template with this name
    async fn save(&self, template: &MessageTemplate) -> Result<(), DomainError>;

    async fn find(&self, trainer_id: TrainerId, id: TemplateId) -> Result<Option<MessageTemplate>, DomainError>;

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<MessageTemplate>, DomainError>;

    async fn delete(&self, trainer_id: TrainerId, id: TemplateId) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn WorkflowRepository, _: &dyn ExecutionRepository, _: &dyn TemplateRepository) {}
}
