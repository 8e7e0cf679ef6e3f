//! ManageTemplatesHandler - reusable email and SMS templates.

use std::sync::Arc;

use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::entitlement::Feature;
use crate::domain::foundation::{DomainError, TemplateId, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::workflow::{MessageTemplate, TemplateKind};
use crate::ports::{TemplateRepository, WorkflowRepository};

#[derive(Debug, Clone)]
pub struct TemplateInput {
    pub name: String,
    pub subject: Option<String>,
    pub body: String,
}

pub struct ManageTemplatesHandler {
    templates: Arc<dyn TemplateRepository>,
    workflows: Arc<dyn WorkflowRepository>,
    gate: EntitlementGate,
}

impl ManageTemplatesHandler {
    pub fn new(templates: Arc<dyn TemplateRepository>, workflows: Arc<dyn WorkflowRepository>, gate: EntitlementGate) -> Self {
        Self {
            templates,
            workflows,
            gate,
        }
    }

    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<MessageTemplate>, DomainError> {
        self.templates.list(ctx.trainer_id).await
    }

    pub async fn create(&self, ctx: &TenantContext, kind: TemplateKind, input: TemplateInput) -> Result<MessageTemplate, DomainError> {
        self.gate.require_feature(ctx, Feature::Workflows).await?;
        self.gate.ensure_writable(ctx).await?;
        let template = MessageTemplate::new(ctx.trainer_id, kind, &input.name, input.subject, input.body, Timestamp::now())?;
        self.templates.save(&template).await?;
        Ok(template)
    }

    pub async fn update(&self, ctx: &TenantContext, id: TemplateId, input: TemplateInput) -> Result<MessageTemplate, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let mut template = self
            .templates
            .find(ctx.trainer_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("template"))?;
        template.update(&input.name, input.subject, input.body, Timestamp::now())?;
        self.templates.save(&template).await?;
        Ok(template)
    }

    /// Templates referenced by a workflow action cannot be deleted.
    pub async fn delete(&self, ctx: &TenantContext, id: TemplateId) -> Result<(), DomainError> {
        self.gate.ensure_writable(ctx).await?;
        if self.workflows.template_in_use(ctx.trainer_id, id).await? {
            return Err(DomainError::conflict("template is used by a workflow action"));
        }
        if !self.templates.delete(ctx.trainer_id, id).await? {
            return Err(DomainError::not_found("template"));
        }
        Ok(())
    }
}
