//! Quota-bearing resources and gated features.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resources counted against plan quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Active clients.
    Clients,
    /// Landing pages.
    Pages,
    /// Active workflows.
    Workflows,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Clients,
        ResourceKind::Pages,
        ResourceKind::Workflows,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Clients => "clients",
            ResourceKind::Pages => "pages",
            ResourceKind::Workflows => "workflows",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Boolean features gated by plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CustomDomain,
    WhiteLabel,
    Workflows,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::CustomDomain => "custom_domain",
            Feature::WhiteLabel => "white_label",
            Feature::Workflows => "workflows",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
