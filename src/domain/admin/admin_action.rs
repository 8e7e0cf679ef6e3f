//! Append-only audit records of superuser mutations.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{AdminActionId, PrincipalId, Timestamp, TrainerId, ValidationError};

pub const USER_AGENT_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminActionKind {
    SuspendTrainer,
    ActivateTrainer,
    VerifyTrainer,
    DeleteTrainer,
    Impersonate,
    ActivateDomain,
    ReplayWebhook,
    RequeueNotifications,
}

impl AdminActionKind {
    pub const ALL: [AdminActionKind; 8] = [
        AdminActionKind::SuspendTrainer,
        AdminActionKind::ActivateTrainer,
        AdminActionKind::VerifyTrainer,
        AdminActionKind::DeleteTrainer,
        AdminActionKind::Impersonate,
        AdminActionKind::ActivateDomain,
        AdminActionKind::ReplayWebhook,
        AdminActionKind::RequeueNotifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminActionKind::SuspendTrainer => "suspend_trainer",
            AdminActionKind::ActivateTrainer => "activate_trainer",
            AdminActionKind::VerifyTrainer => "verify_trainer",
            AdminActionKind::DeleteTrainer => "delete_trainer",
            AdminActionKind::Impersonate => "impersonate",
            AdminActionKind::ActivateDomain => "activate_domain",
            AdminActionKind::ReplayWebhook => "replay_webhook",
            AdminActionKind::RequeueNotifications => "requeue_notifications",
        }
    }
}

impl fmt::Display for AdminActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminActionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdminActionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("action", format!("unknown admin action '{}'", s)))
    }
}

/// Where an admin request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAction {
    pub id: AdminActionId,
    pub admin_id: PrincipalId,
    pub kind: AdminActionKind,
    pub target_trainer_id: Option<TrainerId>,
    pub details: BTreeMap<String, JsonValue>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
}

impl AdminAction {
    pub fn record(
        admin_id: PrincipalId,
        kind: AdminActionKind,
        target_trainer_id: Option<TrainerId>,
        details: BTreeMap<String, JsonValue>,
        origin: &RequestOrigin,
        now: Timestamp,
    ) -> Self {
        Self {
            id: AdminActionId::new(),
            admin_id,
            kind,
            target_trainer_id,
            details,
            client_ip: origin.client_ip.clone(),
            user_agent: origin
                .user_agent
                .as_deref()
                .map(|ua| ua.chars().take(USER_AGENT_MAX_CHARS).collect()),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_is_truncated() {
        let origin = RequestOrigin {
            client_ip: Some("10.0.0.1".into()),
            user_agent: Some("é".repeat(USER_AGENT_MAX_CHARS + 20)),
        };
        let action = AdminAction::record(
            PrincipalId::new(),
            AdminActionKind::Impersonate,
            Some(TrainerId::new()),
            BTreeMap::new(),
            &origin,
            Timestamp::now(),
        );
        assert_eq!(action.user_agent.unwrap().chars().count(), USER_AGENT_MAX_CHARS);
        assert_eq!(action.client_ip.as_deref(), Some("10.0.0.1"));
    }
}
