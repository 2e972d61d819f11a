use std::{env, time::Duration};

use chore_common::{Secret, DEFAULT_CURRENCY_CODE};
use log::*;

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com/v1";
/// Stripe's own libraries reject webhook events whose signature is older than five minutes.
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Base URL of the REST API. Only overridden in tests or when going through a proxy.
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// ISO currency code (lowercase) used for checkout line items
    pub currency: String,
    /// Maximum age of a webhook signature before the event is rejected as a replay.
    pub webhook_tolerance: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            webhook_tolerance: DEFAULT_WEBHOOK_TOLERANCE,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = env::var("CHORE_STRIPE_API_URL").unwrap_or_else(|_| DEFAULT_STRIPE_API_URL.to_string());
        let secret_key = Secret::new(env::var("CHORE_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ CHORE_STRIPE_SECRET_KEY not set. Checkout sessions cannot be created until it is.");
            String::default()
        }));
        let webhook_secret = Secret::new(env::var("CHORE_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ CHORE_STRIPE_WEBHOOK_SECRET not set. All webhook calls will be refused until it is.");
            String::default()
        }));
        let currency = env::var("CHORE_STRIPE_CURRENCY")
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|_| DEFAULT_CURRENCY_CODE.to_string());
        let webhook_tolerance = env::var("CHORE_WEBHOOK_TOLERANCE_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for CHORE_WEBHOOK_TOLERANCE_SECS ({s}). {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE);
        Self { api_url, secret_key, webhook_secret, currency, webhook_tolerance }
    }

    pub fn with_webhook_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.webhook_secret = Secret::new(secret.into());
        self
    }

    pub fn with_secret_key<S: Into<String>>(mut self, key: S) -> Self {
        self.secret_key = Secret::new(key.into());
        self
    }
}
