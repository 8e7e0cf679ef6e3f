//! Login identities.

use serde::Serialize;

use crate::domain::foundation::{PrincipalId, Timestamp, ValidationError};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A person who can authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub is_trainer: bool,
    pub is_client: bool,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_superuser: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Profile fields supplied at sign-up.
#[derive(Debug, Clone, Default)]
pub struct PrincipalProfile {
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl Principal {
    /// Creates an active trainer principal. `email` must already be normalized.
    pub fn new_trainer(email: String, password_hash: String, profile: PrincipalProfile, now: Timestamp) -> Self {
        Self {
            id: PrincipalId::new(),
            email,
            password_hash,
            username: profile.username.filter(|u| !u.trim().is_empty()),
            first_name: profile.first_name.trim().to_string(),
            last_name: profile.last_name.trim().to_string(),
            phone: profile.phone.filter(|p| !p.trim().is_empty()),
            is_trainer: true,
            is_client: false,
            is_verified: false,
            is_active: true,
            is_superuser: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Part of the email before `@`.
    pub fn email_local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }

    pub fn record_login(&mut self, now: Timestamp) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

/// Lower-cases and validates an email address.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::empty_field("email"));
    }
    let invalid = || ValidationError::invalid_format("email", "Enter a valid email address");
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(email)
}

/// Checks password strength and confirmation.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::invalid_format(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    if password != confirmation {
        return Err(ValidationError::invalid_format(
            "password_confirm",
            "passwords do not match",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email_case_and_whitespace() {
        assert_eq!(normalize_email("  T@X.io ").unwrap(), "t@x.io");
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in ["", "plain", "@x.io", "a@", "a@b", "a b@x.io", "a@@x.io"] {
            assert!(normalize_email(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn password_rules() {
        assert!(validate_new_password("longenough", "longenough").is_ok());
        assert_eq!(
            validate_new_password("short", "short").unwrap_err().field(),
            "password"
        );
        assert_eq!(
            validate_new_password("longenough", "different1").unwrap_err().field(),
            "password_confirm"
        );
    }

    #[test]
    fn new_trainer_is_active_and_not_superuser() {
        let p = Principal::new_trainer(
            "t@x.io".into(),
            "hash".into(),
            PrincipalProfile::default(),
            Timestamp::now(),
        );
        assert!(p.is_trainer && p.is_active);
        assert!(!p.is_superuser);
        assert_eq!(p.email_local_part(), "t");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let p = Principal::new_trainer(
            "t@x.io".into(),
            "secret-hash".into(),
            PrincipalProfile::default(),
            Timestamp::now(),
        );
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
