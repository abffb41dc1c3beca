//! Service configuration, loaded from the environment

use std::path::PathBuf;

use anyhow::Context;

/// Default full-reading price in minor currency units
const DEFAULT_PRICE_CENTS: i64 = 999;

/// Product label shown on the provider's hosted payment page
const PRODUCT_NAME: &str = "SoulCross Full Relationship Reading";

/// Application-level configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the durable snapshot
    pub data_dir: PathBuf,
    /// Public base URL used for payment success/cancel redirects
    pub base_url: String,
    /// Full-reading price in minor currency units
    pub price_cents: i64,
    /// Lower-cased ISO currency code
    pub currency: String,
    /// Product label for the payment page
    pub product_name: String,
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults
    ///
    /// Recognized variables: `DATA_DIR`, `PUBLIC_BASE_URL`,
    /// `FULL_READING_PRICE_CENTS`, `FULL_READING_CURRENCY`.
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        url::Url::parse(&base_url).context("PUBLIC_BASE_URL must be a valid URL")?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let price_cents = match std::env::var("FULL_READING_PRICE_CENTS") {
            Ok(raw) => raw
                .parse::<i64>()
                .context("FULL_READING_PRICE_CENTS must be an integer")?,
            Err(_) => DEFAULT_PRICE_CENTS,
        };
        let currency = std::env::var("FULL_READING_CURRENCY")
            .unwrap_or_else(|_| "usd".to_string())
            .to_lowercase();

        Ok(Self {
            data_dir,
            base_url,
            price_cents,
            currency,
            product_name: PRODUCT_NAME.to_string(),
        })
    }

    /// Configuration for tests: in-repo defaults, no environment reads
    pub fn test_config() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            base_url: "http://localhost:3000".to_string(),
            price_cents: DEFAULT_PRICE_CENTS,
            currency: "usd".to_string(),
            product_name: PRODUCT_NAME.to_string(),
        }
    }

    /// Success redirect for a reading; Stripe substitutes the session id
    pub fn success_url(&self, reading_id: &str) -> String {
        format!(
            "{}/reading/{}?checkout=success&session_id={{CHECKOUT_SESSION_ID}}",
            self.base_url, reading_id
        )
    }

    /// Cancel redirect for a reading
    pub fn cancel_url(&self, reading_id: &str) -> String {
        format!("{}/reading/{}?checkout=canceled", self.base_url, reading_id)
    }
}
