//! Per-request tenant context.

use chrono_tz::Tz;

use crate::domain::foundation::{PrincipalId, TrainerId};

/// Resolved once per request and passed explicitly to every tenant operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub principal_id: PrincipalId,
    pub trainer_id: TrainerId,
    pub timezone: Tz,
    pub is_superuser: bool,
    /// Admin principal acting through an impersonation token.
    pub impersonated_by: Option<PrincipalId>,
}

impl TenantContext {
    pub fn new(principal_id: PrincipalId, trainer_id: TrainerId, timezone: Tz) -> Self {
        Self {
            principal_id,
            trainer_id,
            timezone,
            is_superuser: false,
            impersonated_by: None,
        }
    }

    /// Superusers bypass quota and feature checks.
    pub fn bypasses_entitlements(&self) -> bool {
        self.is_superuser
    }
}
