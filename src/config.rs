use anyhow::bail;
use std::env;

/// Application configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    // Klaviyo
    pub klaviyo_api_key: String,
    pub klaviyo_api_revision: String,

    // E-commerce platform
    pub ecommerce_platform: String,
    pub ecommerce_url: String,
    pub ecommerce_api_key: String,

    // Webhooks
    pub webhook_secret: String,

    // Application
    pub similar_products_limit: usize,
    pub api_timeout_secs: u64,
}

impl Config {
    /// Load configuration, failing with one message naming every missing
    /// required variable.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            klaviyo_api_key: env::var("KLAVIYO_API_KEY").unwrap_or_default(),
            klaviyo_api_revision: env::var("KLAVIYO_API_REVISION")
                .unwrap_or_else(|_| "2024-10-15".to_string()),
            ecommerce_platform: env::var("ECOMMERCE_PLATFORM")
                .unwrap_or_else(|_| "prestashop".to_string()),
            ecommerce_url: env::var("ECOMMERCE_URL").unwrap_or_default(),
            ecommerce_api_key: env::var("ECOMMERCE_API_KEY").unwrap_or_default(),
            webhook_secret: env::var("WEBHOOK_SECRET").unwrap_or_default(),
            similar_products_limit: parse_or("SIMILAR_PRODUCTS_LIMIT", 6),
            api_timeout_secs: parse_or("API_TIMEOUT", 10),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("KLAVIYO_API_KEY", &self.klaviyo_api_key),
            ("ECOMMERCE_URL", &self.ecommerce_url),
            ("ECOMMERCE_API_KEY", &self.ecommerce_api_key),
            ("WEBHOOK_SECRET", &self.webhook_secret),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            bail!("missing required environment variables: {}", missing.join(", "));
        }

        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
