//! ExecutionRunner - runs a scheduled workflow execution.
//!
//! Actions run one at a time in ascending order. The first action error
//! fails the execution; earlier actions stay applied. A finished execution
//! is never run again, so a redelivered job is harmless.

use std::str::FromStr;
use std::sync::Arc;

use crate::application::handlers::notification::{MessageRequest, NotificationDispatcher};
use crate::application::handlers::scheduling::booking_conflict;
use crate::domain::foundation::{
    AttributeMap, BookingId, ClientId, DomainError, ExecutionId, TemplateId, Timestamp, TrainerId,
};
use crate::domain::scheduling::BookingStatus;
use crate::domain::workflow::{
    template, ActionSpec, ActionTarget, ClientState, MessageTemplate, TemplateKind, WorkflowExecution,
    DEFAULT_EMAIL_RECIPIENT, DEFAULT_SMS_RECIPIENT,
};
use crate::ports::{
    BookingRepository, BookingWrite, ClientRepository, ExecutionRepository, TemplateRepository, WorkflowRepository,
};

pub struct ExecutionRunner {
    executions: Arc<dyn ExecutionRepository>,
    workflows: Arc<dyn WorkflowRepository>,
    templates: Arc<dyn TemplateRepository>,
    bookings: Arc<dyn BookingRepository>,
    clients: Arc<dyn ClientRepository>,
    dispatcher: NotificationDispatcher,
}

impl ExecutionRunner {
    pub fn new(
        executions: Arc<dyn ExecutionRepository>,
        workflows: Arc<dyn WorkflowRepository>,
        templates: Arc<dyn TemplateRepository>,
        bookings: Arc<dyn BookingRepository>,
        clients: Arc<dyn ClientRepository>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            executions,
            workflows,
            templates,
            bookings,
            clients,
            dispatcher,
        }
    }

    /// Runs the execution and returns its final state.
    ///
    /// Action failures are recorded on the execution, not returned. Only
    /// storage errors surface, so the job is retried.
    pub async fn run(&self, execution_id: ExecutionId) -> Result<WorkflowExecution, DomainError> {
        let mut execution = self
            .executions
            .find_by_id(execution_id)
            .await?
            .ok_or_else(|| DomainError::not_found("workflow execution"))?;
        if execution.is_finished() {
            return Ok(execution);
        }

        let Some(workflow) = self.workflows.find_by_id(execution.workflow_id).await? else {
            execution.fail("workflow no longer exists", Timestamp::now())?;
            self.executions.update(&execution).await?;
            return Ok(execution);
        };

        execution.start(Timestamp::now())?;
        self.executions.update(&execution).await?;

        for action in workflow.ordered_actions() {
            match self.perform(&action.spec, execution.trainer_id, &execution.trigger_data).await {
                Ok(()) => execution.action_completed(),
                Err(e) => {
                    tracing::warn!(
                        execution_id = %execution.id,
                        workflow_id = %workflow.id,
                        action_type = action.spec.action_type(),
                        error = %e,
                        "workflow action failed"
                    );
                    execution.fail(format!("{}: {}", action.spec.action_type(), e.message), Timestamp::now())?;
                    self.executions.update(&execution).await?;
                    return Ok(execution);
                }
            }
            self.executions.update(&execution).await?;
        }

        execution.complete(Timestamp::now())?;
        self.executions.update(&execution).await?;
        Ok(execution)
    }

    async fn perform(&self, spec: &ActionSpec, trainer_id: TrainerId, data: &AttributeMap) -> Result<(), DomainError> {
        match spec {
            ActionSpec::SendEmail {
                template_id,
                subject,
                body,
                recipient,
            } => {
                let (subject, body) = match template_id {
                    Some(id) => {
                        let t = self.template(trainer_id, *id, TemplateKind::Email).await?;
                        (t.subject.unwrap_or_default(), t.body)
                    }
                    None => (subject.clone().unwrap_or_default(), body.clone().unwrap_or_default()),
                };
                let to = template::render(recipient.as_deref().unwrap_or(DEFAULT_EMAIL_RECIPIENT), data);
                let mut request = MessageRequest::email(trainer_id, &to, &template::render(&subject, data), template::render(&body, data));
                if let Some(name) = data.get("trainer_name").filter(|n| !n.is_null()) {
                    request = request.from_name(&name.render());
                }
                self.dispatcher.send(request).await?;
                Ok(())
            }
            ActionSpec::SendSms {
                template_id,
                message,
                recipient,
            } => {
                let body = match template_id {
                    Some(id) => self.template(trainer_id, *id, TemplateKind::Sms).await?.body,
                    None => message.clone().unwrap_or_default(),
                };
                let to = template::render(recipient.as_deref().unwrap_or(DEFAULT_SMS_RECIPIENT), data);
                self.dispatcher
                    .send(MessageRequest::sms(trainer_id, &to, template::render(&body, data)))
                    .await?;
                Ok(())
            }
            ActionSpec::UpdateStatus { target, new_status } => {
                let now = Timestamp::now();
                match target {
                    ActionTarget::Booking => {
                        let status = BookingStatus::from_str(new_status)
                            .map_err(|_| DomainError::validation("new_status", format!("unknown booking status '{}'", new_status)))?;
                        let id: BookingId = target_id(data, *target)?;
                        let mut booking = self
                            .bookings
                            .find(trainer_id, id)
                            .await?
                            .ok_or_else(|| DomainError::not_found("booking"))?;
                        booking.force_status(status, now);
                        if let BookingWrite::Conflict(existing) = self.bookings.update(&booking, status.is_held()).await? {
                            return Err(booking_conflict(existing));
                        }
                    }
                    ActionTarget::Client => {
                        let state = ClientState::from_str(new_status)?;
                        let id: ClientId = target_id(data, *target)?;
                        let mut client = self
                            .clients
                            .find(trainer_id, id)
                            .await?
                            .ok_or_else(|| DomainError::not_found("client"))?;
                        client.set_active(state == ClientState::Active, now);
                        self.clients.update(&client, true).await?.into_result()?;
                    }
                }
                Ok(())
            }
            ActionSpec::CreateNote { target, text } => {
                let now = Timestamp::now();
                let paragraph = format!(
                    "[{}] {}",
                    now.as_datetime().format("%Y-%m-%d %H:%M UTC"),
                    template::render(text, data)
                );
                match target {
                    ActionTarget::Booking => {
                        let id: BookingId = target_id(data, *target)?;
                        let mut booking = self
                            .bookings
                            .find(trainer_id, id)
                            .await?
                            .ok_or_else(|| DomainError::not_found("booking"))?;
                        booking.append_note(&paragraph, now);
                        self.bookings.update(&booking, false).await?;
                    }
                    ActionTarget::Client => {
                        let id: ClientId = target_id(data, *target)?;
                        let mut client = self
                            .clients
                            .find(trainer_id, id)
                            .await?
                            .ok_or_else(|| DomainError::not_found("client"))?;
                        client.append_note(&paragraph, now);
                        self.clients.update(&client, false).await?.into_result()?;
                    }
                }
                Ok(())
            }
        }
    }

    async fn template(&self, trainer_id: TrainerId, id: TemplateId, kind: TemplateKind) -> Result<MessageTemplate, DomainError> {
        self.templates
            .find(trainer_id, id)
            .await?
            .filter(|t| t.kind == kind)
            .ok_or_else(|| DomainError::not_found("template"))
    }
}

/// Reads the target's id (`booking_id` or `client_id`) from the event data.
fn target_id<T: FromStr>(data: &AttributeMap, target: ActionTarget) -> Result<T, DomainError> {
    let field = target.id_field();
    data.get(field)
        .filter(|v| !v.is_null())
        .and_then(|v| v.render().parse().ok())
        .ok_or_else(|| DomainError::validation(field, format!("event carries no {} to act on", target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notifications::{DisabledTransport, RecordingTransport};
    use crate::application::handlers::test_support::Fixture;
    use crate::application::handlers::workflow::WorkflowEngine;
    use crate::domain::entitlement::Plan;
    use crate::domain::scheduling::Booking;
    use crate::domain::workflow::{Conditions, EventKind, ExecutionStatus, TenantEvent, Workflow, WorkflowDefinition, WorkflowTrigger};

    struct Setup {
        fx: Fixture,
        email: RecordingTransport,
        runner: ExecutionRunner,
        engine: WorkflowEngine,
    }

    fn setup_with(fx: Fixture, dispatcher: NotificationDispatcher, email: RecordingTransport) -> Setup {
        let store = Arc::new(fx.store.clone());
        let runner = ExecutionRunner::new(store.clone(), store.clone(), store.clone(), store.clone(), store.clone(), dispatcher);
        let engine = WorkflowEngine::new(store.clone(), store.clone(), store);
        Setup { fx, email, runner, engine }
    }

    async fn setup() -> Setup {
        let fx = Fixture::new(Plan::Pro).await;
        let email = RecordingTransport::new();
        let store = Arc::new(fx.store.clone());
        let dispatcher = NotificationDispatcher::new(store, Arc::new(email.clone()), Arc::new(RecordingTransport::new()));
        setup_with(fx, dispatcher, email)
    }

    async fn install(setup: &Setup, kind: EventKind, actions: Vec<(ActionSpec, i32)>) -> Workflow {
        let workflow = Workflow::new(
            setup.fx.ctx.trainer_id,
            WorkflowDefinition {
                name: "w".into(),
                description: String::new(),
                is_active: true,
                trigger: WorkflowTrigger {
                    event_type: kind,
                    conditions: Conditions::new(),
                    delay_minutes: 0,
                },
                actions,
            },
            Timestamp::now(),
        )
        .unwrap();
        WorkflowRepository::insert(&setup.fx.store, &workflow, false).await.unwrap();
        workflow
    }

    async fn fire(setup: &Setup, event: TenantEvent) -> WorkflowExecution {
        let scheduled = setup.engine.dispatch(&event).await.unwrap();
        assert_eq!(scheduled.len(), 1);
        setup.runner.run(scheduled[0].id).await.unwrap()
    }

    #[tokio::test]
    async fn welcome_email_and_note_for_new_client() {
        let setup = setup().await;
        install(
            &setup,
            EventKind::ClientCreated,
            vec![
                (
                    ActionSpec::CreateNote {
                        target: ActionTarget::Client,
                        text: "Welcomed {{client_name}}".into(),
                    },
                    2,
                ),
                (
                    ActionSpec::SendEmail {
                        template_id: None,
                        subject: Some("Welcome {{client_name}}".into()),
                        body: Some("Hi {{client_name}}, see you at {{trainer_name}}.".into()),
                        recipient: None,
                    },
                    1,
                ),
            ],
        )
        .await;

        let client = setup.fx.client("Ari", "ari@example.com").await;
        let execution = fire(&setup, TenantEvent::client_created(&client, &setup.fx.trainer, Timestamp::now())).await;
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.actions_completed, 2);

        let sent = setup.email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "ari@example.com");
        assert_eq!(sent[0].subject.as_deref(), Some("Welcome Ari"));

        let client = ClientRepository::find(&setup.fx.store, setup.fx.ctx.trainer_id, client.id).await.unwrap().unwrap();
        assert!(client.notes.contains("UTC] Welcomed Ari"));
    }

    #[tokio::test]
    async fn transport_failure_does_not_fail_the_run() {
        let fx = Fixture::new(Plan::Pro).await;
        let store = Arc::new(fx.store.clone());
        let dispatcher = NotificationDispatcher::new(store, Arc::new(DisabledTransport::email()), Arc::new(DisabledTransport::sms()));
        let setup = setup_with(fx, dispatcher, RecordingTransport::new());
        install(
            &setup,
            EventKind::ClientCreated,
            vec![(
                ActionSpec::SendSms {
                    template_id: None,
                    message: Some("Hi".into()),
                    recipient: None,
                },
                1,
            )],
        )
        .await;

        let client = setup.fx.client("Ari", "ari@example.com").await;
        let execution = fire(&setup, TenantEvent::client_created(&client, &setup.fx.trainer, Timestamp::now())).await;
        assert_eq!(execution.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn a_failing_action_stops_the_run_but_keeps_earlier_effects() {
        let setup = setup().await;
        install(
            &setup,
            EventKind::ClientCreated,
            vec![
                (
                    ActionSpec::CreateNote {
                        target: ActionTarget::Client,
                        text: "first".into(),
                    },
                    1,
                ),
                (
                    ActionSpec::UpdateStatus {
                        target: ActionTarget::Booking,
                        new_status: "confirmed".into(),
                    },
                    2,
                ),
                (
                    ActionSpec::CreateNote {
                        target: ActionTarget::Client,
                        text: "never".into(),
                    },
                    3,
                ),
            ],
        )
        .await;

        let client = setup.fx.client("Ari", "ari@example.com").await;
        let execution = fire(&setup, TenantEvent::client_created(&client, &setup.fx.trainer, Timestamp::now())).await;
        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.actions_completed, 1);
        assert!(execution.error_message.unwrap().starts_with("update_status"));

        let client = ClientRepository::find(&setup.fx.store, setup.fx.ctx.trainer_id, client.id).await.unwrap().unwrap();
        assert!(client.notes.contains("first"));
        assert!(!client.notes.contains("never"));

        // Terminal executions are left alone.
        let again = setup.runner.run(execution.id).await.unwrap();
        assert_eq!(again.status, ExecutionStatus::Failed);
    }

    #[tokio::test]
    async fn update_status_confirms_the_booking() {
        let setup = setup().await;
        install(
            &setup,
            EventKind::BookingCreated,
            vec![(
                ActionSpec::UpdateStatus {
                    target: ActionTarget::Booking,
                    new_status: "confirmed".into(),
                },
                1,
            )],
        )
        .await;

        let client = setup.fx.client("Ari", "ari@example.com").await;
        let now = Timestamp::now();
        let start = now.plus_minutes(240);
        let booking = Booking::schedule(setup.fx.ctx.trainer_id, client.id, start, start.plus_minutes(60), None, None, now).unwrap();
        setup.fx.store.insert_checked(&booking).await.unwrap();

        let event = TenantEvent::for_booking(EventKind::BookingCreated, &booking, &client, &setup.fx.trainer, now);
        let execution = fire(&setup, event).await;
        assert_eq!(execution.status, ExecutionStatus::Completed);

        let stored = BookingRepository::find(&setup.fx.store, setup.fx.ctx.trainer_id, booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
    }
}
