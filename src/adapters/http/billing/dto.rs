use serde::Serialize;

use crate::application::handlers::billing::ReconcileOutcome;

/// Body returned to the provider after a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl From<ReconcileOutcome> for WebhookAck {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Applied { event_type } => Self {
                status: "processed",
                event_type: Some(event_type),
            },
            ReconcileOutcome::Acknowledged { event_type } => Self {
                status: "ignored",
                event_type: Some(event_type),
            },
            ReconcileOutcome::AlreadyProcessed => Self {
                status: "already_processed",
                event_type: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_carry_no_event_type() {
        let ack = WebhookAck::from(ReconcileOutcome::AlreadyProcessed);
        assert_eq!(serde_json::to_value(&ack).unwrap(), serde_json::json!({"status": "already_processed"}));
    }
}
