//! Admin domain - audit trail and bulk operations.

mod admin_action;
mod bulk;

pub use admin_action::{AdminAction, AdminActionKind, RequestOrigin, USER_AGENT_MAX_CHARS};
pub use bulk::{BulkAction, BulkFailure, BulkOutcome};
