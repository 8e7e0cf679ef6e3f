//! Identity handlers - signup, login, sessions, trainer profile and public lookup.

mod login;
mod public_lookup;
mod register;
mod session;
mod trainer_profile;

pub use login::{LoginCommand, LoginHandler, LoginResult};
pub use public_lookup::{PublicTrainerLookup, PublicTrainerProfile};
pub use register::{RegisterTrainerCommand, RegisterTrainerHandler, RegisterTrainerResult};
pub use session::{LogoutHandler, Session, TenantResolver};
pub use trainer_profile::{TrainerProfileHandler, UpdateTrainerProfileCommand};
