//! Workflow aggregate: one trigger, an ordered action pipeline.

use serde::{Deserialize, Serialize};

use super::action::{ActionSpec, WorkflowAction};
use super::condition::{conditions_match, Conditions};
use super::event::{EventKind, TenantEvent};
use crate::domain::foundation::{Timestamp, TrainerId, ValidationError, WorkflowId};

/// Delays are bounded to one year either way.
pub const MAX_DELAY_MINUTES: i64 = 525_600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTrigger {
    pub event_type: EventKind,
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default)]
    pub delay_minutes: i64,
}

impl WorkflowTrigger {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.event_type.is_trigger() {
            return Err(ValidationError::invalid_format(
                "event_type",
                format!("'{}' cannot trigger workflows", self.event_type),
            ));
        }
        if self.delay_minutes.abs() > MAX_DELAY_MINUTES {
            return Err(ValidationError::out_of_range(
                "delay_minutes",
                -MAX_DELAY_MINUTES,
                MAX_DELAY_MINUTES,
                self.delay_minutes,
            ));
        }
        if self.delay_minutes < 0 && !self.event_type.carries_schedule_reference() {
            return Err(ValidationError::invalid_format(
                "delay_minutes",
                format!(
                    "negative delays need an event with a scheduled time; '{}' has none",
                    self.event_type
                ),
            ));
        }
        Ok(())
    }

    /// When an execution for `event` should run, or `None` when it should
    /// not be created at all.
    ///
    /// A negative delay is measured back from the event's schedule
    /// reference. If that moment already passed while the reference is
    /// still ahead, the execution runs immediately.
    pub fn run_at(&self, event: &TenantEvent, now: Timestamp) -> Option<Timestamp> {
        match self.delay_minutes {
            0 => Some(now),
            d if d > 0 => Some(now.plus_minutes(d)),
            d => {
                let reference = event.schedule_reference?;
                if !reference.is_after(&now) {
                    return None;
                }
                let at = reference.plus_minutes(d);
                Some(if at.is_before(&now) { now } else { at })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub trainer_id: TrainerId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub trigger: WorkflowTrigger,
    pub actions: Vec<WorkflowAction>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Editable workflow definition.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub trigger: WorkflowTrigger,
    pub actions: Vec<(ActionSpec, i32)>,
}

impl Workflow {
    pub fn new(trainer_id: TrainerId, definition: WorkflowDefinition, now: Timestamp) -> Result<Self, ValidationError> {
        let mut workflow = Self {
            id: WorkflowId::new(),
            trainer_id,
            name: String::new(),
            description: String::new(),
            is_active: false,
            trigger: definition.trigger.clone(),
            actions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        workflow.redefine(definition, now)?;
        Ok(workflow)
    }

    /// Replaces the whole definition after validating it.
    pub fn redefine(&mut self, definition: WorkflowDefinition, now: Timestamp) -> Result<(), ValidationError> {
        let name = definition.name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        definition.trigger.validate()?;
        if definition.actions.is_empty() {
            return Err(ValidationError::empty_field("actions"));
        }
        for (spec, _) in &definition.actions {
            spec.validate()?;
        }

        let mut actions: Vec<WorkflowAction> = definition
            .actions
            .into_iter()
            .map(|(spec, order)| WorkflowAction::new(spec, order))
            .collect();
        actions.sort_by_key(|a| a.order);

        self.name = name.to_string();
        self.description = definition.description;
        self.is_active = definition.is_active;
        self.trigger = definition.trigger;
        self.actions = actions;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_active(&mut self, active: bool, now: Timestamp) {
        self.is_active = active;
        self.updated_at = now;
    }

    /// Active, subscribed to the event's kind, and all conditions hold.
    pub fn matches(&self, event: &TenantEvent) -> bool {
        self.is_active
            && self.trainer_id == event.trainer_id
            && self.trigger.event_type == event.kind
            && conditions_match(&self.trigger.conditions, &event.data)
    }

    /// Actions in execution order.
    pub fn ordered_actions(&self) -> impl Iterator<Item = &WorkflowAction> {
        let mut actions: Vec<&WorkflowAction> = self.actions.iter().collect();
        actions.sort_by_key(|a| a.order);
        actions.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AttributeMap, Scalar};
    use crate::domain::workflow::action::ActionTarget;
    use serde_json::json;

    fn note(order: i32) -> (ActionSpec, i32) {
        (
            ActionSpec::CreateNote {
                target: ActionTarget::Client,
                text: format!("step {}", order),
            },
            order,
        )
    }

    fn definition(kind: EventKind, delay: i64) -> WorkflowDefinition {
        WorkflowDefinition {
            name: "Welcome".into(),
            description: String::new(),
            is_active: true,
            trigger: WorkflowTrigger {
                event_type: kind,
                conditions: Conditions::new(),
                delay_minutes: delay,
            },
            actions: vec![note(2), note(1)],
        }
    }

    fn event(trainer: TrainerId, kind: EventKind, reference: Option<Timestamp>) -> TenantEvent {
        let mut data = AttributeMap::new();
        data.insert("fitness_level".into(), Scalar::from("beginner"));
        let e = TenantEvent::new(trainer, kind, data, Timestamp::now());
        match reference {
            Some(r) => e.with_schedule_reference(r),
            None => e,
        }
    }

    #[test]
    fn requires_at_least_one_action() {
        let mut d = definition(EventKind::ClientCreated, 0);
        d.actions.clear();
        assert_eq!(
            Workflow::new(TrainerId::new(), d, Timestamp::now()).unwrap_err().field(),
            "actions"
        );
    }

    #[test]
    fn negative_delay_needs_a_schedule_reference() {
        assert!(Workflow::new(TrainerId::new(), definition(EventKind::ClientCreated, -60), Timestamp::now()).is_err());
        assert!(Workflow::new(TrainerId::new(), definition(EventKind::BookingConfirmed, -60), Timestamp::now()).is_ok());
    }

    #[test]
    fn actions_are_kept_in_order() {
        let wf = Workflow::new(TrainerId::new(), definition(EventKind::ClientCreated, 0), Timestamp::now()).unwrap();
        let orders: Vec<i32> = wf.ordered_actions().map(|a| a.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn matching_respects_tenant_kind_activity_and_conditions() {
        let trainer = TrainerId::new();
        let mut d = definition(EventKind::ClientCreated, 0);
        d.trigger.conditions = serde_json::from_value(json!({"fitness_level": "beginner"})).unwrap();
        let mut wf = Workflow::new(trainer, d, Timestamp::now()).unwrap();

        assert!(wf.matches(&event(trainer, EventKind::ClientCreated, None)));
        assert!(!wf.matches(&event(TrainerId::new(), EventKind::ClientCreated, None)));
        assert!(!wf.matches(&event(trainer, EventKind::BookingCreated, None)));

        wf.set_active(false, Timestamp::now());
        assert!(!wf.matches(&event(trainer, EventKind::ClientCreated, None)));
    }

    #[test]
    fn run_at_follows_delay_rules() {
        let now = Timestamp::now();
        let trainer = TrainerId::new();
        let trigger = |delay| WorkflowTrigger {
            event_type: EventKind::BookingCreated,
            conditions: Conditions::new(),
            delay_minutes: delay,
        };

        let no_ref = event(trainer, EventKind::BookingCreated, None);
        assert_eq!(trigger(0).run_at(&no_ref, now), Some(now));
        assert_eq!(trigger(30).run_at(&no_ref, now), Some(now.plus_minutes(30)));
        assert_eq!(trigger(-1440).run_at(&no_ref, now), None);

        let in_two_days = event(trainer, EventKind::BookingCreated, Some(now.plus_minutes(2880)));
        assert_eq!(trigger(-1440).run_at(&in_two_days, now), Some(now.plus_minutes(1440)));

        let in_an_hour = event(trainer, EventKind::BookingCreated, Some(now.plus_minutes(60)));
        assert_eq!(trigger(-1440).run_at(&in_an_hour, now), Some(now));

        let passed = event(trainer, EventKind::BookingCreated, Some(now.plus_minutes(-5)));
        assert_eq!(trigger(-1440).run_at(&passed, now), None);
    }
}
