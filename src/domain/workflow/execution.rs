//! Execution log entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::event::{EventKind, TenantEvent};
use super::workflow::Workflow;
use crate::domain::foundation::{
    AttributeMap, ExecutionId, StateMachine, Timestamp, TrainerId, ValidationError, WorkflowId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown execution status '{}'", other),
            )),
        }
    }
}

impl StateMachine for ExecutionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, target),
            // A lease that expired mid-run may be picked up again.
            (Pending, Running) | (Running, Running) | (Running, Completed) | (Running, Failed) | (Pending, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ExecutionStatus::*;
        match self {
            Pending => vec![Running, Failed],
            Running => vec![Running, Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}

/// One invocation of a workflow against one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub trainer_id: TrainerId,
    pub trigger_event_type: EventKind,
    pub trigger_data: AttributeMap,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
    pub scheduled_for: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub actions_completed: u32,
    pub created_at: Timestamp,
}

impl WorkflowExecution {
    pub fn pending(workflow: &Workflow, event: &TenantEvent, scheduled_for: Timestamp, now: Timestamp) -> Self {
        Self {
            id: ExecutionId::new(),
            workflow_id: workflow.id,
            trainer_id: workflow.trainer_id,
            trigger_event_type: event.kind,
            trigger_data: event.data.clone(),
            status: ExecutionStatus::Pending,
            error_message: None,
            scheduled_for,
            started_at: None,
            finished_at: None,
            actions_completed: 0,
            created_at: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn start(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ExecutionStatus::Running)?;
        self.started_at = Some(now);
        Ok(())
    }

    pub fn action_completed(&mut self) {
        self.actions_completed += 1;
    }

    pub fn complete(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ExecutionStatus::Completed)?;
        self.finished_at = Some(now);
        Ok(())
    }

    /// Fails the run. Actions already applied stay applied.
    pub fn fail(&mut self, message: impl Into<String>, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ExecutionStatus::Failed)?;
        self.error_message = Some(message.into());
        self.finished_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::{ActionSpec, ActionTarget, Conditions, WorkflowDefinition, WorkflowTrigger};

    fn execution() -> WorkflowExecution {
        let trainer = TrainerId::new();
        let workflow = Workflow::new(
            trainer,
            WorkflowDefinition {
                name: "w".into(),
                description: String::new(),
                is_active: true,
                trigger: WorkflowTrigger {
                    event_type: EventKind::ClientCreated,
                    conditions: Conditions::new(),
                    delay_minutes: 0,
                },
                actions: vec![(
                    ActionSpec::CreateNote {
                        target: ActionTarget::Client,
                        text: "hi".into(),
                    },
                    0,
                )],
            },
            Timestamp::now(),
        )
        .unwrap();
        let event = TenantEvent::new(trainer, EventKind::ClientCreated, AttributeMap::new(), Timestamp::now());
        WorkflowExecution::pending(&workflow, &event, Timestamp::now(), Timestamp::now())
    }

    #[test]
    fn runs_to_completion() {
        let mut ex = execution();
        ex.start(Timestamp::now()).unwrap();
        ex.action_completed();
        ex.complete(Timestamp::now()).unwrap();
        assert!(ex.is_finished());
        assert_eq!(ex.actions_completed, 1);
        assert!(ex.start(Timestamp::now()).is_err());
    }

    #[test]
    fn failure_records_message() {
        let mut ex = execution();
        ex.start(Timestamp::now()).unwrap();
        ex.fail("booking not found", Timestamp::now()).unwrap();
        assert_eq!(ex.status, ExecutionStatus::Failed);
        assert_eq!(ex.error_message.as_deref(), Some("booking not found"));
        assert!(ex.finished_at.is_some());
    }
}
