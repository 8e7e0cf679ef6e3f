//! Paddle webhook signature verification.
//!
//! The `Paddle-Signature` header has the form `ts=<unix>;h1=<hex>`. The
//! signature is HMAC-SHA256 over `"{ts}:{raw body}"` keyed with the
//! endpoint's secret. Several `h1` entries may appear during secret rotation.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;
use crate::domain::foundation::Timestamp;

/// Maximum allowed age for webhook signatures (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future signatures (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the `Paddle-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses `ts=<unix>;h1=<hex>[;h1=<hex>]`.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut signatures = Vec::new();

        for part in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid signature header".to_string()))?;

            match key {
                "ts" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid signature timestamp".to_string())
                    })?);
                }
                "h1" => {
                    signatures.push(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid h1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing ts".to_string()))?;
        if signatures.is_empty() {
            return Err(WebhookError::ParseError("missing h1 signature".to_string()));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verifier for Paddle webhook signatures.
pub struct PaddleWebhookVerifier {
    secret: String,
}

impl PaddleWebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the signature header against the raw body.
    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: Timestamp,
    ) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;
        validate_timestamp(header.timestamp, now)?;

        let expected = compute_signature(&self.secret, header.timestamp, payload)?;
        let matched = header
            .signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));

        if matched {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }
}

/// Builds a valid `Paddle-Signature` header for a payload.
///
/// Used by operator tooling and tests to produce signed deliveries.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("ts={};h1={}", timestamp, hex::encode(signature)))
}

fn validate_timestamp(timestamp: i64, now: Timestamp) -> Result<(), WebhookError> {
    let age = now.as_unix_secs() - timestamp;
    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }
    Ok(())
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::ParseError("invalid webhook secret".to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b":");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
