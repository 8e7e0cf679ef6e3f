//! The authenticated superuser behind an admin request.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::application::handlers::identity::Session;
use crate::domain::admin::{AdminAction, AdminActionKind, RequestOrigin};
use crate::domain::foundation::{DomainError, ErrorCode, PrincipalId, Timestamp, TrainerId};

#[derive(Debug, Clone)]
pub struct AdminActor {
    pub principal_id: PrincipalId,
    pub origin: RequestOrigin,
}

impl AdminActor {
    /// Impersonation sessions never count as superuser.
    pub fn from_session(session: &Session, origin: RequestOrigin) -> Result<Self, DomainError> {
        if !session.is_superuser() {
            return Err(DomainError::new(ErrorCode::Forbidden, "Superuser access required"));
        }
        Ok(Self {
            principal_id: session.principal.id,
            origin,
        })
    }

    pub(crate) fn audit(
        &self,
        kind: AdminActionKind,
        target: Option<TrainerId>,
        details: BTreeMap<String, JsonValue>,
    ) -> AdminAction {
        AdminAction::record(self.principal_id, kind, target, details, &self.origin, Timestamp::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::{Principal, PrincipalProfile};

    fn session(superuser: bool, impersonated_by: Option<PrincipalId>) -> Session {
        let mut principal = Principal::new_trainer("ops@example.com".into(), "hash".into(), PrincipalProfile::default(), Timestamp::now());
        principal.is_superuser = superuser;
        Session {
            principal,
            token_hash: String::new(),
            impersonated_by,
        }
    }

    #[test]
    fn only_direct_superuser_sessions_qualify() {
        assert!(AdminActor::from_session(&session(true, None), RequestOrigin::default()).is_ok());

        let err = AdminActor::from_session(&session(false, None), RequestOrigin::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(AdminActor::from_session(&session(true, Some(PrincipalId::new())), RequestOrigin::default()).is_err());
    }
}
