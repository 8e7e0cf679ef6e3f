//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Login identity (a person who can authenticate).
    PrincipalId
);
uuid_id!(
    /// Tenant root: the trainer profile owning all tenant data.
    TrainerId
);
uuid_id!(ClientId);
uuid_id!(AvailabilityRuleId);
uuid_id!(BreakId);
uuid_id!(BookingId);
uuid_id!(PackageId);
uuid_id!(PackagePurchaseId);
uuid_id!(SubscriptionId);
uuid_id!(PaymentId);
uuid_id!(ManualPaymentId);
uuid_id!(PageId);
uuid_id!(WorkflowId);
uuid_id!(WorkflowActionId);
uuid_id!(ExecutionId);
uuid_id!(TemplateId);
uuid_id!(NotificationId);
uuid_id!(AdminActionId);
uuid_id!(
    /// Durable background job.
    JobId
);
uuid_id!(EventId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(TrainerId::new(), TrainerId::new());
    }

    #[test]
    fn id_round_trips_through_string() {
        let id = BookingId::new();
        let parsed: BookingId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn id_rejects_garbage() {
        assert!("not-a-uuid".parse::<ClientId>().is_err());
    }

    #[test]
    fn id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let id = WorkflowId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
