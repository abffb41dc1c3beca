//! Stripe configuration, loaded from the environment

use std::time::Duration;

use anyhow::Context;

/// Default Stripe API base URL
const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Outbound provider calls are bounded so a slow provider surfaces a
/// retryable failure instead of hanging a request indefinitely.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Signed webhook timestamps older than this are rejected as replays.
const DEFAULT_SIGNATURE_TOLERANCE: Duration = Duration::from_secs(300);

/// Stripe credentials and tunables
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// API secret key (`sk_...`)
    pub secret_key: String,
    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: String,
    /// API base URL; overridable for tests
    pub api_base: String,
    /// Outbound request deadline
    pub timeout: Duration,
    /// Webhook signature timestamp tolerance
    pub signature_tolerance: Duration,
}

impl StripeConfig {
    /// Load configuration from `STRIPE_SECRET_KEY` and `STRIPE_WEBHOOK_SECRET`
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key =
            std::env::var("STRIPE_SECRET_KEY").context("STRIPE_SECRET_KEY is not set")?;
        let webhook_secret =
            std::env::var("STRIPE_WEBHOOK_SECRET").context("STRIPE_WEBHOOK_SECRET is not set")?;

        Ok(Self {
            secret_key,
            webhook_secret,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            signature_tolerance: DEFAULT_SIGNATURE_TOLERANCE,
        })
    }

    /// Configuration with test credentials, pointing at the default API base
    pub fn test_config() -> Self {
        Self {
            secret_key: "sk_test_xxx".to_string(),
            webhook_secret: "whsec_test123secret456".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            signature_tolerance: DEFAULT_SIGNATURE_TOLERANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_config_defaults() {
        let config = StripeConfig::test_config();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.signature_tolerance, Duration::from_secs(300));
        assert!(config.api_base.starts_with("https://"));
    }
}
