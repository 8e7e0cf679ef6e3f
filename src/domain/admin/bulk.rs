//! Bulk operations over trainer accounts.

use serde::{Deserialize, Serialize};

use super::AdminActionKind;
use crate::domain::foundation::TrainerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Suspend,
    Activate,
    Verify,
    Delete,
}

impl BulkAction {
    pub fn audit_kind(&self) -> AdminActionKind {
        match self {
            BulkAction::Suspend => AdminActionKind::SuspendTrainer,
            BulkAction::Activate => AdminActionKind::ActivateTrainer,
            BulkAction::Verify => AdminActionKind::VerifyTrainer,
            BulkAction::Delete => AdminActionKind::DeleteTrainer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: TrainerId,
    pub name: Option<String>,
    pub reason: String,
}

/// Per-target results; one target failing does not affect the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub success_count: u32,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, id: TrainerId, name: Option<String>, reason: impl Into<String>) {
        self.failed.push(BulkFailure {
            id,
            name,
            reason: reason.into(),
        });
    }
}
