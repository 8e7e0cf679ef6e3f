//! Payment configuration

use serde::Deserialize;

use crate::domain::billing::PriceCatalog;

/// Paddle webhook settings. Without a secret the webhook endpoint rejects
/// every delivery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Paddle notification destination secret
    pub paddle_webhook_secret: Option<String>,

    /// Comma-separated Paddle price ids mapping to the pro plan
    #[serde(default)]
    pub pro_price_ids: String,

    /// Comma-separated Paddle price ids mapping to the business plan
    #[serde(default)]
    pub business_price_ids: String,
}

impl PaymentConfig {
    pub fn webhook_secret(&self) -> Option<&str> {
        self.paddle_webhook_secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn price_catalog(&self) -> PriceCatalog {
        PriceCatalog {
            pro_price_ids: split_ids(&self.pro_price_ids),
            business_price_ids: split_ids(&self.business_price_ids),
        }
    }
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
