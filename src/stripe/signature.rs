//! Webhook signature verification
//!
//! Stripe signs each delivery with an HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` and sends the result in the
//! `stripe-signature` header as `t=<unix_ts>,v1=<hex>`. Verification must
//! run against the raw request body; any re-serialization breaks the MAC.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Verifies `stripe-signature` headers against a signing secret
///
/// Rejection is the default: a missing timestamp, missing `v1` signature,
/// non-hex signature, stale timestamp, or MAC mismatch all fail closed
/// before the payload is trusted. Comparison is constant-time via
/// [`Mac::verify_slice`].
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance: Duration,
}

impl SignatureVerifier {
    /// Create a verifier with the default 300 s timestamp tolerance
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance: Duration::from_secs(300),
        }
    }

    /// Override the timestamp tolerance
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Verify a raw payload against its signature header
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), WebhookError> {
        let (timestamp, signatures) = parse_header(header)?;

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::MalformedSignature("non-numeric timestamp".to_string()))?;
        let now = chrono::Utc::now().timestamp();
        if (now - ts).unsigned_abs() > self.tolerance.as_secs() {
            return Err(WebhookError::StaleTimestamp);
        }

        // MAC over "{t}.{payload}" with the timestamp exactly as received.
        for candidate in &signatures {
            let Ok(expected) = hex::decode(candidate) else {
                continue;
            };
            let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
                .expect("HMAC can take key of any size");
            mac.update(timestamp.as_bytes());
            mac.update(b".");
            mac.update(payload);
            if mac.verify_slice(&expected).is_ok() {
                return Ok(());
            }
        }

        Err(WebhookError::InvalidSignature)
    }
}

/// Split the header into its timestamp and the `v1` signature candidates.
/// Stripe may send several `v1` entries during secret rotation; any one
/// verifying is sufficient.
fn parse_header(header: &str) -> Result<(String, Vec<String>), WebhookError> {
    if header.is_empty() {
        return Err(WebhookError::MissingSignature);
    }

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value.to_string()),
            Some(("v1", value)) => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| WebhookError::MalformedSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedSignature(
            "missing v1 signature".to_string(),
        ));
    }
    Ok((timestamp, signatures))
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the secret
        f.debug_struct("SignatureVerifier")
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}
