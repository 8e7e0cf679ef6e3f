//! Identity domain - principals, trainer profiles, tokens and tenant context.

mod principal;
mod tenant;
mod token;
mod trainer;

pub use principal::{normalize_email, validate_new_password, Principal, PrincipalProfile, MIN_PASSWORD_LENGTH};
pub use tenant::TenantContext;
pub use token::{AuthToken, TokenIssuer, TokenKind};
pub use trainer::{
    default_business_name, normalize_domain, parse_timezone, slug_for, validate_hex_color,
    DomainStatus, Trainer,
};
