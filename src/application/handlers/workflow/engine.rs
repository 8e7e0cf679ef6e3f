//! WorkflowEngine - turns tenant events into scheduled executions.
//!
//! Runs synchronously on the event bus. For every active workflow of the
//! event's trainer whose trigger and conditions match, a pending execution
//! is stored and a `run_workflow_execution` job is queued for its start
//! time. Actions themselves run later in the job runner.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope, Timestamp};
use crate::domain::workflow::{EventKind, TenantEvent, WorkflowExecution};
use crate::ports::{EventHandler, EventSubscriber, ExecutionRepository, Job, JobKind, JobQueue, WorkflowRepository};

pub struct WorkflowEngine {
    workflows: Arc<dyn WorkflowRepository>,
    executions: Arc<dyn ExecutionRepository>,
    jobs: Arc<dyn JobQueue>,
}

impl WorkflowEngine {
    pub fn new(workflows: Arc<dyn WorkflowRepository>, executions: Arc<dyn ExecutionRepository>, jobs: Arc<dyn JobQueue>) -> Self {
        Self {
            workflows,
            executions,
            jobs,
        }
    }

    /// Registers the engine for every event type that can trigger workflows.
    pub fn subscribe_to(self: Arc<Self>, bus: &dyn EventSubscriber) {
        let types: Vec<&str> = EventKind::ALL
            .iter()
            .filter(|k| k.is_trigger())
            .map(|k| k.as_str())
            .collect();
        bus.subscribe_all(&types, self);
    }

    /// Schedules one execution per matching workflow. Returns what was stored.
    pub async fn dispatch(&self, event: &TenantEvent) -> Result<Vec<WorkflowExecution>, DomainError> {
        let now = Timestamp::now();
        let candidates = self.workflows.list_active_for_event(event.trainer_id, event.kind).await?;

        let mut scheduled = Vec::new();
        for workflow in candidates.iter().filter(|w| w.matches(event)) {
            let Some(run_at) = workflow.trigger.run_at(event, now) else {
                tracing::info!(
                    workflow_id = %workflow.id,
                    event_type = event.kind.as_str(),
                    delay_minutes = workflow.trigger.delay_minutes,
                    "scheduled time already passed; execution skipped"
                );
                continue;
            };
            let execution = WorkflowExecution::pending(workflow, event, run_at, now);
            self.executions.insert(&execution).await?;
            self.jobs
                .enqueue(&Job::new(
                    JobKind::RunWorkflowExecution {
                        execution_id: execution.id,
                    },
                    run_at,
                    now,
                ))
                .await?;
            scheduled.push(execution);
        }

        if !scheduled.is_empty() {
            tracing::debug!(trainer_id = %event.trainer_id, event_type = event.kind.as_str(), count = scheduled.len(), "workflow executions scheduled");
        }
        Ok(scheduled)
    }
}

#[async_trait]
impl EventHandler for WorkflowEngine {
    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), DomainError> {
        let event: TenantEvent = envelope
            .payload_as()
            .map_err(|e| DomainError::internal(format!("undecodable tenant event: {}", e)))?;
        self.dispatch(&event).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "workflow_engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::LocalEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::events::publish_after_commit;
    use crate::domain::foundation::{AttributeMap, PageRequest, Scalar, TrainerId};
    use crate::domain::workflow::{
        ActionSpec, ActionTarget, ConditionSpec, Conditions, ExecutionStatus, Operator, Workflow, WorkflowDefinition,
        WorkflowTrigger,
    };

    fn workflow(trainer: TrainerId, kind: EventKind, conditions: Conditions, delay: i64, active: bool) -> Workflow {
        Workflow::new(
            trainer,
            WorkflowDefinition {
                name: "w".into(),
                description: String::new(),
                is_active: active,
                trigger: WorkflowTrigger {
                    event_type: kind,
                    conditions,
                    delay_minutes: delay,
                },
                actions: vec![(
                    ActionSpec::CreateNote {
                        target: ActionTarget::Client,
                        text: "hello".into(),
                    },
                    1,
                )],
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    fn engine(store: &InMemoryStore) -> Arc<WorkflowEngine> {
        Arc::new(WorkflowEngine::new(Arc::new(store.clone()), Arc::new(store.clone()), Arc::new(store.clone())))
    }

    fn client_event(trainer: TrainerId, level: &str) -> TenantEvent {
        let mut data = AttributeMap::new();
        data.insert("fitness_level".into(), Scalar::from(level));
        TenantEvent::new(trainer, EventKind::ClientCreated, data, Timestamp::now())
    }

    #[tokio::test]
    async fn only_matching_active_workflows_fire() {
        let store = InMemoryStore::new();
        let trainer = TrainerId::new();
        let mut beginners = Conditions::new();
        beginners.insert("fitness_level".into(), ConditionSpec::Equals(Scalar::from("beginner")));
        let mut not_beginners = Conditions::new();
        not_beginners.insert(
            "fitness_level".into(),
            ConditionSpec::Compare {
                operator: Operator::NotEquals,
                value: Scalar::from("beginner"),
            },
        );

        let w1 = workflow(trainer, EventKind::ClientCreated, beginners, 0, true);
        let w2 = workflow(trainer, EventKind::ClientCreated, not_beginners, 0, true);
        let w3 = workflow(trainer, EventKind::ClientCreated, Conditions::new(), 0, false);
        let other_tenant = workflow(TrainerId::new(), EventKind::ClientCreated, Conditions::new(), 0, true);
        for w in [&w1, &w2, &w3, &other_tenant] {
            WorkflowRepository::insert(&store, w, false).await.unwrap();
        }

        let scheduled = engine(&store).dispatch(&client_event(trainer, "beginner")).await.unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].workflow_id, w1.id);
        assert_eq!(scheduled[0].status, ExecutionStatus::Pending);

        let log = ExecutionRepository::list(&store, trainer, None, None, PageRequest::default()).await.unwrap();
        assert_eq!(log.total, 1);
    }

    #[tokio::test]
    async fn delayed_workflows_are_scheduled_later() {
        let store = InMemoryStore::new();
        let trainer = TrainerId::new();
        let w = workflow(trainer, EventKind::ClientCreated, Conditions::new(), 90, true);
        WorkflowRepository::insert(&store, &w, false).await.unwrap();

        let before = Timestamp::now();
        let scheduled = engine(&store).dispatch(&client_event(trainer, "beginner")).await.unwrap();
        assert!(!scheduled[0].scheduled_for.is_before(&before.plus_minutes(90)));

        // The job is not due yet.
        let due = store.claim_due(Timestamp::now(), 10, 60).await.unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn subscribes_through_the_bus() {
        let store = InMemoryStore::new();
        let trainer = TrainerId::new();
        WorkflowRepository::insert(&store, &workflow(trainer, EventKind::ClientCreated, Conditions::new(), 0, true), false)
            .await
            .unwrap();

        let bus = LocalEventBus::new();
        engine(&store).subscribe_to(&bus);
        assert_eq!(bus.handler_count("client_created"), 1);
        assert_eq!(bus.handler_count("tenant_deleted"), 0);

        publish_after_commit(&bus, vec![client_event(trainer, "advanced")]).await;
        let log = ExecutionRepository::list(&store, trainer, None, None, PageRequest::default()).await.unwrap();
        assert_eq!(log.total, 1);
    }
}
