//! Subscription plan definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription plan held by a trainer.
///
/// Determines usage limits and feature access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Default plan for every new trainer.
    Free,
    /// Unlimited clients, a handful of pages and workflows.
    Pro,
    /// Everything unlimited, plus custom domain and white-label.
    Business,
}

impl Plan {
    /// All plans, cheapest first.
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Pro, Plan::Business];

    pub fn is_paid(&self) -> bool {
        !matches!(self, Plan::Free)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Pro => "Pro",
            Plan::Business => "Business",
        }
    }

    /// Numeric rank; higher means more allowances.
    pub fn rank(&self) -> u8 {
        match self {
            Plan::Free => 0,
            Plan::Pro => 1,
            Plan::Business => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Business => "business",
        }
    }

    /// Plans strictly above this one, cheapest first.
    pub fn upgrades(&self) -> impl Iterator<Item = Plan> + '_ {
        Plan::ALL.into_iter().filter(move |p| p.rank() > self.rank())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "business" => Ok(Plan::Business),
            other => Err(ValidationError::invalid_format(
                "plan",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}
