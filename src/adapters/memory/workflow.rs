use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::entitlement::ResourceKind;
use crate::domain::foundation::{
    DomainError, ExecutionId, Page, PageId, PageRequest, TemplateId, TrainerId, WorkflowId,
};
use crate::domain::pages::Page as LandingPage;
use crate::domain::workflow::{
    EventKind, ExecutionStatus, MessageTemplate, Workflow, WorkflowExecution,
};
use crate::ports::{
    ExecutionRepository, PageRepository, QuotaWrite, TemplateRepository, WorkflowRepository,
};

#[async_trait]
impl PageRepository for InMemoryStore {
    async fn insert(&self, page: &LandingPage, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut state = self.write().await;
        if state
            .pages
            .values()
            .any(|p| p.trainer_id == page.trainer_id && p.slug == page.slug)
        {
            return Err(DomainError::conflict("A page with this slug already exists").with_detail("field", "slug"));
        }
        let decision = state.quota(page.trainer_id, ResourceKind::Pages, enforce_quota);
        if decision == QuotaWrite::Written {
            state.pages.insert(page.id, page.clone());
        }
        Ok(decision)
    }

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<LandingPage>, DomainError> {
        let state = self.read().await;
        let mut pages: Vec<LandingPage> = state
            .pages
            .values()
            .filter(|p| p.trainer_id == trainer_id)
            .cloned()
            .collect();
        pages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pages)
    }

    async fn find_published(&self, trainer_id: TrainerId, slug: &str) -> Result<Option<LandingPage>, DomainError> {
        Ok(self
            .read()
            .await
            .pages
            .values()
            .find(|p| p.trainer_id == trainer_id && p.slug == slug && p.is_published)
            .cloned())
    }

    async fn delete(&self, trainer_id: TrainerId, id: PageId) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        if state.pages.get(&id).map_or(false, |p| p.trainer_id == trainer_id) {
            state.pages.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryStore {
    async fn insert(&self, workflow: &Workflow, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut state = self.write().await;
        let decision = state.quota(workflow.trainer_id, ResourceKind::Workflows, enforce_quota && workflow.is_active);
        if decision == QuotaWrite::Written {
            state.workflows.insert(workflow.id, workflow.clone());
        }
        Ok(decision)
    }

    async fn update(&self, workflow: &Workflow, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut state = self.write().await;
        let was_active = match state.workflows.get(&workflow.id) {
            Some(existing) if existing.trainer_id == workflow.trainer_id => existing.is_active,
            _ => return Err(DomainError::not_found("Workflow")),
        };
        let activating = workflow.is_active && !was_active;
        let decision = state.quota(workflow.trainer_id, ResourceKind::Workflows, enforce_quota && activating);
        if decision == QuotaWrite::Written {
            state.workflows.insert(workflow.id, workflow.clone());
        }
        Ok(decision)
    }

    async fn find(&self, trainer_id: TrainerId, id: WorkflowId) -> Result<Option<Workflow>, DomainError> {
        Ok(self
            .read()
            .await
            .workflows
            .get(&id)
            .filter(|w| w.trainer_id == trainer_id)
            .cloned())
    }

    async fn find_by_id(&self, id: WorkflowId) -> Result<Option<Workflow>, DomainError> {
        Ok(self.read().await.workflows.get(&id).cloned())
    }

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<Workflow>, DomainError> {
        let state = self.read().await;
        let mut workflows: Vec<Workflow> = state
            .workflows
            .values()
            .filter(|w| w.trainer_id == trainer_id)
            .cloned()
            .collect();
        workflows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(workflows)
    }

    async fn list_active_for_event(&self, trainer_id: TrainerId, kind: EventKind) -> Result<Vec<Workflow>, DomainError> {
        let state = self.read().await;
        let mut workflows: Vec<Workflow> = state
            .workflows
            .values()
            .filter(|w| w.trainer_id == trainer_id && w.is_active && w.trigger.event_type == kind)
            .cloned()
            .collect();
        workflows.sort_by_key(|w| w.created_at);
        Ok(workflows)
    }

    async fn delete(&self, trainer_id: TrainerId, id: WorkflowId) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        if !state.workflows.get(&id).map_or(false, |w| w.trainer_id == trainer_id) {
            return Ok(false);
        }
        state.workflows.remove(&id);
        state.executions.retain(|_, e| e.workflow_id != id);
        Ok(true)
    }

    async fn template_in_use(&self, trainer_id: TrainerId, template_id: TemplateId) -> Result<bool, DomainError> {
        Ok(self.read().await.workflows.values().any(|w| {
            w.trainer_id == trainer_id && w.actions.iter().any(|a| a.spec.template_id() == Some(template_id))
        }))
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryStore {
    async fn insert(&self, execution: &WorkflowExecution) -> Result<(), DomainError> {
        self.write().await.executions.insert(execution.id, execution.clone());
        Ok(())
    }

    async fn update(&self, execution: &WorkflowExecution) -> Result<(), DomainError> {
        let mut state = self.write().await;
        match state.executions.get_mut(&execution.id) {
            Some(existing) => {
                *existing = execution.clone();
                Ok(())
            }
            None => Err(DomainError::not_found("Workflow execution")),
        }
    }

    async fn find_by_id(&self, id: ExecutionId) -> Result<Option<WorkflowExecution>, DomainError> {
        Ok(self.read().await.executions.get(&id).cloned())
    }

    async fn list(
        &self,
        trainer_id: TrainerId,
        workflow_id: Option<WorkflowId>,
        status: Option<ExecutionStatus>,
        page: PageRequest,
    ) -> Result<Page<WorkflowExecution>, DomainError> {
        let state = self.read().await;
        let mut executions: Vec<WorkflowExecution> = state
            .executions
            .values()
            .filter(|e| {
                e.trainer_id == trainer_id
                    && workflow_id.map_or(true, |w| e.workflow_id == w)
                    && status.map_or(true, |s| e.status == s)
            })
            .cloned()
            .collect();
        executions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::new(page.slice(&executions), executions.len() as u64, page))
    }
}

#[async_trait]
impl TemplateRepository for InMemoryStore {
    async fn save(&self, template: &MessageTemplate) -> Result<(), DomainError> {
        let mut state = self.write().await;
        if state
            .templates
            .values()
            .any(|t| t.id != template.id && t.trainer_id == template.trainer_id && t.name == template.name)
        {
            return Err(DomainError::conflict("A template with this name already exists").with_detail("field", "name"));
        }
        state.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn find(&self, trainer_id: TrainerId, id: TemplateId) -> Result<Option<MessageTemplate>, DomainError> {
        Ok(self
            .read()
            .await
            .templates
            .get(&id)
            .filter(|t| t.trainer_id == trainer_id)
            .cloned())
    }

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<MessageTemplate>, DomainError> {
        let state = self.read().await;
        let mut templates: Vec<MessageTemplate> = state
            .templates
            .values()
            .filter(|t| t.trainer_id == trainer_id)
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn delete(&self, trainer_id: TrainerId, id: TemplateId) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        if state.templates.get(&id).map_or(false, |t| t.trainer_id == trainer_id) {
            state.templates.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
