//! Admin plane handlers. Every operation requires a superuser session and
//! every mutation appends an audit record.

mod actor;
mod operations;
mod trainers;

pub use actor::AdminActor;
pub use operations::{AdminOperationsHandler, RequeueResult};
pub use trainers::{AdminTrainersHandler, BulkActionCommand, ImpersonationResult};
