//! ListExecutionsHandler - the workflow execution log.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Page, PageRequest, WorkflowId};
use crate::domain::identity::TenantContext;
use crate::domain::workflow::{ExecutionStatus, WorkflowExecution};
use crate::ports::ExecutionRepository;

pub struct ListExecutionsHandler {
    executions: Arc<dyn ExecutionRepository>,
}

impl ListExecutionsHandler {
    pub fn new(executions: Arc<dyn ExecutionRepository>) -> Self {
        Self { executions }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        workflow_id: Option<WorkflowId>,
        status: Option<ExecutionStatus>,
        page: PageRequest,
    ) -> Result<Page<WorkflowExecution>, DomainError> {
        self.executions.list(ctx.trainer_id, workflow_id, status, page).await
    }
}
