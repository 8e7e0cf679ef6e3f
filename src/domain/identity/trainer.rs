//! Trainer profile: the tenant root.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::Principal;
use crate::domain::foundation::{PrincipalId, Timestamp, TrainerId, ValidationError};

/// Activation state of a trainer's custom domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    /// Requested by the trainer, awaiting operator activation.
    Pending,
    /// Verified and serving.
    Active,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Pending => "pending",
            DomainStatus::Active => "active",
        }
    }
}

impl FromStr for DomainStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DomainStatus::Pending),
            "active" => Ok(DomainStatus::Active),
            other => Err(ValidationError::invalid_format(
                "custom_domain_status",
                format!("unknown domain status '{}'", other),
            )),
        }
    }
}

/// A trainer's business profile. Owns all tenant data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    pub id: TrainerId,
    pub principal_id: PrincipalId,
    pub business_name: String,
    pub bio: String,
    pub expertise: BTreeSet<String>,
    pub location: String,
    pub timezone: Tz,
    pub is_verified: bool,
    pub slug: String,
    pub billing_customer_id: Option<String>,
    pub custom_domain: Option<String>,
    pub custom_domain_status: Option<DomainStatus>,
    pub brand_color: Option<String>,
    pub hide_platform_branding: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Trainer {
    /// Default profile derived from a principal.
    pub fn for_principal(principal: &Principal, now: Timestamp) -> Self {
        Self {
            id: TrainerId::new(),
            principal_id: principal.id,
            business_name: default_business_name(principal),
            bio: String::new(),
            expertise: BTreeSet::new(),
            location: String::new(),
            timezone: Tz::UTC,
            is_verified: false,
            slug: slug_for(principal),
            billing_customer_id: None,
            custom_domain: None,
            custom_domain_status: None,
            brand_color: None,
            hide_platform_branding: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Requests a custom domain; it stays pending until an operator activates it.
    pub fn request_custom_domain(&mut self, domain: Option<String>, now: Timestamp) -> Result<(), ValidationError> {
        match domain {
            Some(raw) => {
                let normalized = normalize_domain(&raw)?;
                if self.custom_domain.as_deref() != Some(normalized.as_str()) {
                    self.custom_domain = Some(normalized);
                    self.custom_domain_status = Some(DomainStatus::Pending);
                }
            }
            None => {
                self.custom_domain = None;
                self.custom_domain_status = None;
            }
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn activate_custom_domain(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        if self.custom_domain.is_none() {
            return Err(ValidationError::empty_field("custom_domain"));
        }
        self.custom_domain_status = Some(DomainStatus::Active);
        self.updated_at = now;
        Ok(())
    }

    pub fn set_branding(
        &mut self,
        brand_color: Option<String>,
        hide_platform_branding: bool,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.brand_color = match brand_color {
            Some(c) => Some(validate_hex_color(&c)?),
            None => None,
        };
        self.hide_platform_branding = hide_platform_branding;
        self.updated_at = now;
        Ok(())
    }
}

/// Business name from the principal's full name, else the email local part.
pub fn default_business_name(principal: &Principal) -> String {
    let full = principal.full_name();
    if full.is_empty() {
        principal.email_local_part().to_string()
    } else {
        full
    }
}

/// Public slug: the username when set, otherwise the email local part.
pub fn slug_for(principal: &Principal) -> String {
    principal
        .username
        .clone()
        .unwrap_or_else(|| principal.email_local_part().to_string())
        .to_lowercase()
}

/// Parses an IANA zone name such as `America/New_York`.
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::invalid_format("timezone", format!("unknown time zone '{}'", name)))
}

/// Accepts `#RRGGBB` (case-insensitive), returns it upper-cased.
pub fn validate_hex_color(raw: &str) -> Result<String, ValidationError> {
    let color = raw.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(color.to_ascii_uppercase())
    } else {
        Err(ValidationError::invalid_format("brand_color", "invalid hex color"))
    }
}

/// Lower-cases a host name and checks its labels.
pub fn normalize_domain(raw: &str) -> Result<String, ValidationError> {
    let domain = raw.trim().trim_end_matches('.').to_lowercase();
    let invalid = || ValidationError::invalid_format("custom_domain", "invalid domain name");
    if domain.len() > 253 || !domain.contains('.') {
        return Err(invalid());
    }
    let labels_ok = domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if labels_ok {
        Ok(domain)
    } else {
        Err(invalid())
    }
}

impl fmt::Display for Trainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.business_name)
    }
}
