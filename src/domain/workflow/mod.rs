//! Workflow domain - tenant events, triggers, conditions, actions and the
//! execution log.

mod action;
mod condition;
mod event;
mod execution;
mod message_template;
pub mod template;
#[allow(clippy::module_inception)]
mod workflow;

pub use action::{
    ActionSpec, ActionTarget, ClientState, WorkflowAction, DEFAULT_EMAIL_RECIPIENT,
    DEFAULT_SMS_RECIPIENT,
};
pub use condition::{conditions_match, ConditionSpec, Conditions, Operator};
pub use event::{EventKind, TenantEvent};
pub use execution::{ExecutionStatus, WorkflowExecution};
pub use message_template::{MessageTemplate, TemplateKind, SMS_MAX_CHARS};
pub use workflow::{Workflow, WorkflowDefinition, WorkflowTrigger, MAX_DELAY_MINUTES};
