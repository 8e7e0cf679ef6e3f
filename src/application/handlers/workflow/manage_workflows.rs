//! ManageWorkflowsHandler - workflow CRUD behind the `workflows` feature.
//!
//! Active workflows count against `max_workflows`; inactive ones are free
//! to keep around.

use std::sync::Arc;

use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::entitlement::{Feature, ResourceKind};
use crate::domain::foundation::{DomainError, Timestamp, WorkflowId};
use crate::domain::identity::TenantContext;
use crate::domain::workflow::{ActionSpec, TemplateKind, Workflow, WorkflowDefinition};
use crate::ports::{TemplateRepository, WorkflowRepository};

pub struct ManageWorkflowsHandler {
    workflows: Arc<dyn WorkflowRepository>,
    templates: Arc<dyn TemplateRepository>,
    gate: EntitlementGate,
}

impl ManageWorkflowsHandler {
    pub fn new(workflows: Arc<dyn WorkflowRepository>, templates: Arc<dyn TemplateRepository>, gate: EntitlementGate) -> Self {
        Self {
            workflows,
            templates,
            gate,
        }
    }

    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<Workflow>, DomainError> {
        self.workflows.list(ctx.trainer_id).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: WorkflowId) -> Result<Workflow, DomainError> {
        self.workflows
            .find(ctx.trainer_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("workflow"))
    }

    pub async fn create(&self, ctx: &TenantContext, definition: WorkflowDefinition) -> Result<Workflow, DomainError> {
        self.gate.require_feature(ctx, Feature::Workflows).await?;
        if definition.is_active {
            self.gate.check_create(ctx, ResourceKind::Workflows).await?;
        } else {
            self.gate.ensure_writable(ctx).await?;
        }

        let workflow = Workflow::new(ctx.trainer_id, definition, Timestamp::now())?;
        self.check_templates(ctx, &workflow).await?;
        self.workflows
            .insert(&workflow, self.gate.enforces_quota(ctx))
            .await?
            .into_result()?;
        tracing::info!(trainer_id = %ctx.trainer_id, workflow_id = %workflow.id, event_type = workflow.trigger.event_type.as_str(), "workflow created");
        Ok(workflow)
    }

    /// Replaces the definition, actions included.
    pub async fn update(&self, ctx: &TenantContext, id: WorkflowId, definition: WorkflowDefinition) -> Result<Workflow, DomainError> {
        self.gate.require_feature(ctx, Feature::Workflows).await?;
        self.gate.ensure_writable(ctx).await?;
        let mut workflow = self.get(ctx, id).await?;
        workflow.redefine(definition, Timestamp::now())?;
        self.check_templates(ctx, &workflow).await?;
        self.save(ctx, &workflow).await?;
        Ok(workflow)
    }

    pub async fn toggle(&self, ctx: &TenantContext, id: WorkflowId) -> Result<Workflow, DomainError> {
        self.gate.require_feature(ctx, Feature::Workflows).await?;
        self.gate.ensure_writable(ctx).await?;
        let mut workflow = self.get(ctx, id).await?;
        workflow.set_active(!workflow.is_active, Timestamp::now());
        self.save(ctx, &workflow).await?;
        Ok(workflow)
    }

    pub async fn delete(&self, ctx: &TenantContext, id: WorkflowId) -> Result<(), DomainError> {
        self.gate.ensure_writable(ctx).await?;
        if !self.workflows.delete(ctx.trainer_id, id).await? {
            return Err(DomainError::not_found("workflow"));
        }
        Ok(())
    }

    async fn save(&self, ctx: &TenantContext, workflow: &Workflow) -> Result<(), DomainError> {
        self.workflows
            .update(workflow, self.gate.enforces_quota(ctx))
            .await?
            .into_result()
    }

    /// Referenced templates must belong to the trainer and match the
    /// action's channel.
    async fn check_templates(&self, ctx: &TenantContext, workflow: &Workflow) -> Result<(), DomainError> {
        for action in &workflow.actions {
            let Some(template_id) = action.spec.template_id() else {
                continue;
            };
            let template = self
                .templates
                .find(ctx.trainer_id, template_id)
                .await?
                .ok_or_else(|| DomainError::validation("template_id", format!("template {} does not exist", template_id)))?;
            let expected = match action.spec {
                ActionSpec::SendSms { .. } => TemplateKind::Sms,
                _ => TemplateKind::Email,
            };
            if template.kind != expected {
                return Err(DomainError::validation(
                    "template_id",
                    format!(
                        "{} needs an {} template, '{}' is {}",
                        action.spec.action_type(),
                        expected.as_str(),
                        template.name,
                        template.kind.as_str()
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::{ErrorCode, TemplateId};
    use crate::domain::workflow::{ActionTarget, Conditions, EventKind, MessageTemplate, WorkflowTrigger};

    fn definition(active: bool, actions: Vec<(ActionSpec, i32)>) -> WorkflowDefinition {
        WorkflowDefinition {
            name: "Welcome".into(),
            description: String::new(),
            is_active: active,
            trigger: WorkflowTrigger {
                event_type: EventKind::ClientCreated,
                conditions: Conditions::new(),
                delay_minutes: 0,
            },
            actions,
        }
    }

    fn note() -> Vec<(ActionSpec, i32)> {
        vec![(
            ActionSpec::CreateNote {
                target: ActionTarget::Client,
                text: "joined".into(),
            },
            1,
        )]
    }

    fn handler(fx: &Fixture) -> ManageWorkflowsHandler {
        ManageWorkflowsHandler::new(Arc::new(fx.store.clone()), Arc::new(fx.store.clone()), fx.gate())
    }

    #[tokio::test]
    async fn free_plan_cannot_use_workflows() {
        let fx = Fixture::new(Plan::Free).await;
        let err = handler(&fx).create(&fx.ctx, definition(true, note())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::FeatureNotIncluded);
    }

    #[tokio::test]
    async fn only_active_workflows_count_against_the_limit() {
        let fx = Fixture::new(Plan::Pro).await;
        let handler = handler(&fx);
        for _ in 0..3 {
            handler.create(&fx.ctx, definition(true, note())).await.unwrap();
        }
        let err = handler.create(&fx.ctx, definition(true, note())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);

        let parked = handler.create(&fx.ctx, definition(false, note())).await.unwrap();
        let err = handler.toggle(&fx.ctx, parked.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);

        let first = handler.list(&fx.ctx).await.unwrap().into_iter().find(|w| w.is_active).unwrap();
        assert!(!handler.toggle(&fx.ctx, first.id).await.unwrap().is_active);
        assert!(handler.toggle(&fx.ctx, parked.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn templates_must_exist_and_match_the_channel() {
        let fx = Fixture::new(Plan::Pro).await;
        let handler = handler(&fx);
        let sms = MessageTemplate::new(fx.ctx.trainer_id, crate::domain::workflow::TemplateKind::Sms, "Short", None, "Hi".into(), Timestamp::now()).unwrap();
        fx.store.save(&sms).await.unwrap();

        let email_with_sms_template = vec![(
            ActionSpec::SendEmail {
                template_id: Some(sms.id),
                subject: None,
                body: None,
                recipient: None,
            },
            1,
        )];
        let err = handler.create(&fx.ctx, definition(true, email_with_sms_template)).await.unwrap_err();
        assert_eq!(err.details["field"], "template_id");

        let missing = vec![(
            ActionSpec::SendSms {
                template_id: Some(TemplateId::new()),
                message: None,
                recipient: None,
            },
            1,
        )];
        assert!(handler.create(&fx.ctx, definition(true, missing)).await.is_err());

        let ok = vec![(
            ActionSpec::SendSms {
                template_id: Some(sms.id),
                message: None,
                recipient: None,
            },
            1,
        )];
        handler.create(&fx.ctx, definition(true, ok)).await.unwrap();
    }
}
