//! Typed workflow actions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{TemplateId, ValidationError, WorkflowActionId};
use crate::domain::scheduling::BookingStatus;

/// Entity an `update_status` or `create_note` action operates on. The
/// entity id comes from the event data (`booking_id` / `client_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTarget {
    Booking,
    Client,
}

impl ActionTarget {
    /// Event data field holding the target's id.
    pub fn id_field(&self) -> &'static str {
        match self {
            ActionTarget::Booking => "booking_id",
            ActionTarget::Client => "client_id",
        }
    }
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTarget::Booking => f.write_str("booking"),
            ActionTarget::Client => f.write_str("client"),
        }
    }
}

/// Client states an action can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Active,
    Inactive,
}

impl FromStr for ClientState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ClientState::Active),
            "inactive" => Ok(ClientState::Inactive),
            other => Err(ValidationError::invalid_format(
                "new_status",
                format!("unknown client status '{}'", other),
            )),
        }
    }
}

/// Action payload, tagged by `action_type` with its `action_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action_type", content = "action_data", rename_all = "snake_case")]
pub enum ActionSpec {
    SendEmail {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template_id: Option<TemplateId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient: Option<String>,
    },
    SendSms {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template_id: Option<TemplateId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient: Option<String>,
    },
    UpdateStatus {
        target: ActionTarget,
        new_status: String,
    },
    CreateNote {
        target: ActionTarget,
        text: String,
    },
}

pub const DEFAULT_EMAIL_RECIPIENT: &str = "{{client_email}}";
pub const DEFAULT_SMS_RECIPIENT: &str = "{{client_phone}}";

impl ActionSpec {
    pub fn action_type(&self) -> &'static str {
        match self {
            ActionSpec::SendEmail { .. } => "send_email",
            ActionSpec::SendSms { .. } => "send_sms",
            ActionSpec::UpdateStatus { .. } => "update_status",
            ActionSpec::CreateNote { .. } => "create_note",
        }
    }

    /// Template referenced by a send action.
    pub fn template_id(&self) -> Option<TemplateId> {
        match self {
            ActionSpec::SendEmail { template_id, .. } | ActionSpec::SendSms { template_id, .. } => *template_id,
            _ => None,
        }
    }

    /// Structural checks. Template existence is checked by the caller.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ActionSpec::SendEmail { template_id, subject, body, .. } => {
                if template_id.is_none() && (is_blank(subject) || is_blank(body)) {
                    return Err(ValidationError::invalid_format(
                        "action_data",
                        "send_email needs a template_id or an inline subject and body",
                    ));
                }
            }
            ActionSpec::SendSms { template_id, message, .. } => {
                if template_id.is_none() && is_blank(message) {
                    return Err(ValidationError::invalid_format(
                        "action_data",
                        "send_sms needs a template_id or an inline message",
                    ));
                }
            }
            ActionSpec::UpdateStatus { target, new_status } => match target {
                ActionTarget::Booking => {
                    new_status.parse::<BookingStatus>().map_err(|_| {
                        ValidationError::invalid_format("new_status", format!("unknown booking status '{}'", new_status))
                    })?;
                }
                ActionTarget::Client => {
                    new_status.parse::<ClientState>()?;
                }
            },
            ActionSpec::CreateNote { text, .. } => {
                if text.trim().is_empty() {
                    return Err(ValidationError::empty_field("text"));
                }
            }
        }
        Ok(())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// One ordered step of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAction {
    pub id: WorkflowActionId,
    #[serde(flatten)]
    pub spec: ActionSpec,
    pub order: i32,
}

impl WorkflowAction {
    pub fn new(spec: ActionSpec, order: i32) -> Self {
        Self {
            id: WorkflowActionId::new(),
            spec,
            order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_tagged_actions() {
        let spec: ActionSpec = serde_json::from_value(json!({
            "action_type": "update_status",
            "action_data": {"target": "booking", "new_status": "confirmed"}
        }))
        .unwrap();
        assert_eq!(
            spec,
            ActionSpec::UpdateStatus {
                target: ActionTarget::Booking,
                new_status: "confirmed".into()
            }
        );
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn actions_serialize_flat_like_their_request_shape() {
        let action = WorkflowAction::new(
            ActionSpec::CreateNote {
                target: ActionTarget::Client,
                text: "Sent welcome pack".into(),
            },
            2,
        );
        let body = serde_json::to_value(&action).unwrap();
        assert_eq!(body["action_type"], "create_note");
        assert_eq!(body["action_data"]["text"], "Sent welcome pack");
        assert_eq!(body["order"], 2);
        assert!(body.get("spec").is_none());

        let back: WorkflowAction = serde_json::from_value(body).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn send_email_requires_template_or_inline_content() {
        let bare = ActionSpec::SendEmail {
            template_id: None,
            subject: Some("Hi".into()),
            body: None,
            recipient: None,
        };
        assert!(bare.validate().is_err());

        let templated = ActionSpec::SendEmail {
            template_id: Some(TemplateId::new()),
            subject: None,
            body: None,
            recipient: None,
        };
        assert!(templated.validate().is_ok());
    }

    #[test]
    fn update_status_checks_status_names() {
        let bad = ActionSpec::UpdateStatus {
            target: ActionTarget::Client,
            new_status: "confirmed".into(),
        };
        assert_eq!(bad.validate().unwrap_err().field(), "new_status");
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let result: Result<ActionSpec, _> = serde_json::from_value(json!({
            "action_type": "post_to_slack",
            "action_data": {}
        }));
        assert!(result.is_err());
    }
}
