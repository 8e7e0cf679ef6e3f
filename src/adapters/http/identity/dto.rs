//! Request and response bodies for identity routes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::application::handlers::identity::{LoginResult, RegisterTrainerResult, UpdateTrainerProfileCommand};
use crate::application::handlers::pages::CreatePageCommand;
use crate::domain::billing::Subscription;
use crate::domain::identity::{Principal, Trainer};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "password_confirmation")]
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: Principal,
    pub trainer: Option<Trainer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    pub token: String,
}

impl From<RegisterTrainerResult> for AuthResponse {
    fn from(result: RegisterTrainerResult) -> Self {
        Self {
            user: result.principal,
            trainer: Some(result.trainer),
            subscription: Some(result.subscription),
            token: result.token,
        }
    }
}

impl From<LoginResult> for AuthResponse {
    fn from(result: LoginResult) -> Self {
        Self {
            user: result.principal,
            trainer: result.trainer,
            subscription: None,
            token: result.token,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTrainerRequest {
    pub business_name: Option<String>,
    pub bio: Option<String>,
    pub expertise: Option<BTreeSet<String>>,
    pub location: Option<String>,
    pub timezone: Option<String>,
}

impl From<UpdateTrainerRequest> for UpdateTrainerProfileCommand {
    fn from(req: UpdateTrainerRequest) -> Self {
        Self {
            business_name: req.business_name,
            bio: req.bio,
            expertise: req.expertise,
            location: req.location,
            timezone: req.timezone,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomDomainRequest {
    /// `null` removes the domain.
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandingRequest {
    pub brand_color: Option<String>,
    #[serde(default)]
    pub hide_platform_branding: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePageRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_published: bool,
}

impl From<CreatePageRequest> for CreatePageCommand {
    fn from(req: CreatePageRequest) -> Self {
        Self {
            title: req.title,
            slug: req.slug,
            content: req.content,
            is_published: req.is_published,
        }
    }
}
