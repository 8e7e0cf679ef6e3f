//! Request bodies and query strings for workflow routes.

use serde::Deserialize;

use crate::application::handlers::workflow::TemplateInput;
use crate::domain::foundation::WorkflowId;
use crate::domain::notification::{Channel, NotificationStatus};
use crate::domain::workflow::{ActionSpec, ExecutionStatus, TemplateKind, WorkflowDefinition, WorkflowTrigger};

/// One action as sent by clients: `{"action_type": ..., "action_data": {...}, "order": 2}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    #[serde(flatten)]
    pub spec: ActionSpec,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub trigger: WorkflowTrigger,
    #[serde(default)]
    pub actions: Vec<ActionRequest>,
}

fn default_active() -> bool {
    true
}

impl From<WorkflowRequest> for WorkflowDefinition {
    /// Actions without an explicit order run in list position, starting at 1.
    fn from(req: WorkflowRequest) -> Self {
        let actions = req
            .actions
            .into_iter()
            .enumerate()
            .map(|(i, a)| (a.spec, a.order.unwrap_or(i as i32 + 1)))
            .collect();
        WorkflowDefinition {
            name: req.name,
            description: req.description,
            is_active: req.is_active,
            trigger: req.trigger,
            actions,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionQuery {
    pub workflow_id: Option<WorkflowId>,
    pub status: Option<ExecutionStatus>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateRequest {
    #[serde(alias = "template_type")]
    pub kind: TemplateKind,
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

impl CreateTemplateRequest {
    pub fn split(self) -> (TemplateKind, TemplateInput) {
        (
            self.kind,
            TemplateInput {
                name: self.name,
                subject: self.subject,
                body: self.body,
            },
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

impl From<UpdateTemplateRequest> for TemplateInput {
    fn from(req: UpdateTemplateRequest) -> Self {
        TemplateInput {
            name: req.name,
            subject: req.subject,
            body: req.body,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    pub channel: Option<Channel>,
    pub status: Option<NotificationStatus>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}
