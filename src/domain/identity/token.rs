//! Opaque authentication tokens.
//!
//! Clients hold a random 40-character hex token. Only its keyed digest is
//! stored, so a leaked table cannot be replayed.

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, PrincipalId, Timestamp, ValidationError};

/// How a token was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Session,
    Impersonation,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Session => "session",
            TokenKind::Impersonation => "impersonation",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session" => Ok(TokenKind::Session),
            "impersonation" => Ok(TokenKind::Impersonation),
            other => Err(ValidationError::invalid_format(
                "kind",
                format!("unknown token kind '{}'", other),
            )),
        }
    }
}

/// Stored token record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token_hash: String,
    pub principal_id: PrincipalId,
    pub kind: TokenKind,
    pub impersonated_by: Option<PrincipalId>,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

impl AuthToken {
    pub fn is_usable(&self, now: Timestamp) -> bool {
        self.revoked_at.is_none() && self.expires_at.map(|exp| now.is_before(&exp)).unwrap_or(true)
    }
}

/// Issues tokens and computes their digests.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    session_ttl_hours: Option<i64>,
}

impl TokenIssuer {
    /// `session_ttl_hours = None` issues non-expiring session tokens.
    pub fn new(secret: impl AsRef<[u8]>, session_ttl_hours: Option<i64>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            session_ttl_hours,
        }
    }

    /// Keyed digest of a plaintext token.
    pub fn digest(&self, token: &str) -> Result<String, DomainError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|_| DomainError::internal("invalid token secret"))?;
        mac.update(token.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Issues a session token. Returns the plaintext and the record to store.
    pub fn issue_session(&self, principal_id: PrincipalId, now: Timestamp) -> Result<(String, AuthToken), DomainError> {
        let expires_at = self.session_ttl_hours.map(|h| now.plus_minutes(h * 60));
        self.issue(principal_id, TokenKind::Session, None, now, expires_at)
    }

    /// Issues a short-lived token acting as `target`, on behalf of `admin`.
    pub fn issue_impersonation(
        &self,
        target: PrincipalId,
        admin: PrincipalId,
        now: Timestamp,
        ttl_minutes: i64,
    ) -> Result<(String, AuthToken), DomainError> {
        self.issue(
            target,
            TokenKind::Impersonation,
            Some(admin),
            now,
            Some(now.plus_minutes(ttl_minutes)),
        )
    }

    fn issue(
        &self,
        principal_id: PrincipalId,
        kind: TokenKind,
        impersonated_by: Option<PrincipalId>,
        now: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<(String, AuthToken), DomainError> {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plaintext = hex::encode(bytes);
        let record = AuthToken {
            token_hash: self.digest(&plaintext)?,
            principal_id,
            kind,
            impersonated_by,
            created_at: now,
            expires_at,
            revoked_at: None,
        };
        Ok((plaintext, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_forty_hex_chars_and_unique() {
        let issuer = TokenIssuer::new("secret", None);
        let (a, _) = issuer.issue_session(PrincipalId::new(), Timestamp::now()).unwrap();
        let (b, _) = issuer.issue_session(PrincipalId::new(), Timestamp::now()).unwrap();
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn stored_hash_matches_digest_of_plaintext() {
        let issuer = TokenIssuer::new("secret", None);
        let (plain, record) = issuer.issue_session(PrincipalId::new(), Timestamp::now()).unwrap();
        assert_eq!(issuer.digest(&plain).unwrap(), record.token_hash);
        assert_ne!(plain, record.token_hash);
    }

    #[test]
    fn digest_depends_on_secret() {
        let a = TokenIssuer::new("one", None).digest("tok").unwrap();
        let b = TokenIssuer::new("two", None).digest("tok").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn impersonation_tokens_expire() {
        let issuer = TokenIssuer::new("secret", None);
        let now = Timestamp::now();
        let (_, record) = issuer
            .issue_impersonation(PrincipalId::new(), PrincipalId::new(), now, 60)
            .unwrap();
        assert!(record.is_usable(now));
        assert!(!record.is_usable(now.plus_minutes(61)));
        assert_eq!(record.kind, TokenKind::Impersonation);
    }

    #[test]
    fn revoked_tokens_are_unusable() {
        let issuer = TokenIssuer::new("secret", Some(24));
        let now = Timestamp::now();
        let (_, mut record) = issuer.issue_session(PrincipalId::new(), now).unwrap();
        record.revoked_at = Some(now);
        assert!(!record.is_usable(now));
    }
}
