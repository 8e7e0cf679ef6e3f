//! Workflow handlers - definitions, templates, the execution log, the
//! event-driven engine and the execution runner.

mod engine;
mod executions;
mod manage_workflows;
mod runner;
mod templates;

pub use engine::WorkflowEngine;
pub use executions::ListExecutionsHandler;
pub use manage_workflows::ManageWorkflowsHandler;
pub use runner::ExecutionRunner;
pub use templates::{ManageTemplatesHandler, TemplateInput};
