use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use chore_common::helpers::parse_comma_list;
use chore_engine::order_objects::{DEFAULT_PAYMENT_ROYALTY_RATE, DEFAULT_ROYALTY_RATE};
use log::*;
use stripe_tools::StripeConfig;

const DEFAULT_CHORE_HOST: &str = "127.0.0.1";
const DEFAULT_CHORE_PORT: u16 = 5000;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SUCCESS_URL: &str = "http://localhost:5173/thankyou";
const DEFAULT_CANCEL_URL: &str = "http://localhost:5173/laundry";
const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "https://yourchore.com",
    "https://www.yourchore.com",
    "https://yourchorecom-production.up.railway.app",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            s => Err(format!("{s} is not a valid environment")),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
            Environment::Test => write!(f, "test"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The directory holding the order document
    pub data_dir: PathBuf,
    /// Origins the web frontend is served from. Use `*` to allow any origin.
    pub allowed_origins: Vec<String>,
    pub environment: Environment,
    /// The vendor's commission on submitted orders
    pub royalty_rate: f64,
    /// The commission applied to orders that are first heard of through a payment notification
    pub webhook_royalty_rate: f64,
    /// Where the payment page sends customers when the client did not say
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CHORE_HOST.to_string(),
            port: DEFAULT_CHORE_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            environment: Environment::default(),
            royalty_rate: DEFAULT_ROYALTY_RATE,
            webhook_royalty_rate: DEFAULT_PAYMENT_ROYALTY_RATE,
            checkout_success_url: DEFAULT_SUCCESS_URL.to_string(),
            checkout_cancel_url: DEFAULT_CANCEL_URL.to_string(),
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CHORE_HOST").ok().unwrap_or_else(|| DEFAULT_CHORE_HOST.into());
        let port = env::var("CHORE_PORT")
            .or_else(|_| env::var("PORT"))
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CHORE_PORT. {e} Using the default, {DEFAULT_CHORE_PORT}, \
                         instead."
                    );
                    DEFAULT_CHORE_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CHORE_PORT);
        let data_dir = env::var("CHORE_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
            info!("🪛️ CHORE_DATA_DIR is not set. Orders will be kept in ./{DEFAULT_DATA_DIR}");
            PathBuf::from(DEFAULT_DATA_DIR)
        });
        let allowed_origins = parse_origins(env::var("CHORE_ALLOWED_ORIGINS").ok());
        let environment = env::var("CHORE_ENVIRONMENT")
            .ok()
            .and_then(|s| {
                s.parse::<Environment>()
                    .map_err(|e| warn!("🪛️ Invalid value for CHORE_ENVIRONMENT. {e}. Assuming development."))
                    .ok()
            })
            .unwrap_or_default();
        let royalty_rate = parse_rate("CHORE_ROYALTY_RATE", env::var("CHORE_ROYALTY_RATE").ok(), DEFAULT_ROYALTY_RATE);
        let webhook_royalty_rate = parse_rate(
            "CHORE_WEBHOOK_ROYALTY_RATE",
            env::var("CHORE_WEBHOOK_ROYALTY_RATE").ok(),
            DEFAULT_PAYMENT_ROYALTY_RATE,
        );
        let checkout_success_url =
            env::var("CHORE_CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| DEFAULT_SUCCESS_URL.to_string());
        let checkout_cancel_url =
            env::var("CHORE_CHECKOUT_CANCEL_URL").unwrap_or_else(|_| DEFAULT_CANCEL_URL.to_string());
        let stripe = StripeConfig::new_from_env_or_default();
        Self {
            host,
            port,
            data_dir,
            allowed_origins,
            environment,
            royalty_rate,
            webhook_royalty_rate,
            checkout_success_url,
            checkout_cancel_url,
            stripe,
        }
    }
}

fn parse_origins(value: Option<String>) -> Vec<String> {
    match value.map(|s| parse_comma_list(&s)) {
        Some(origins) if !origins.is_empty() => {
            info!("🪛️ Allowed origins: {}", origins.join(", "));
            origins
        },
        _ => {
            info!("🪛️ CHORE_ALLOWED_ORIGINS is not set. Using the default origins.");
            DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect()
        },
    }
}

/// Rates are fractions of the amount paid, so they must lie in `[0, 1]`.
fn parse_rate(name: &str, value: Option<String>, default: f64) -> f64 {
    let Some(value) = value else {
        return default;
    };
    match value.trim().parse::<f64>() {
        Ok(rate) if (0.0..=1.0).contains(&rate) => rate,
        Ok(rate) => {
            warn!("🪛️ {name} must be between 0 and 1, but is {rate}. Using the default, {default}, instead.");
            default
        },
        Err(e) => {
            warn!("🪛️ {value} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        },
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers need. Contains no secrets.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub environment: Environment,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            environment: config.environment,
            checkout_success_url: config.checkout_success_url.clone(),
            checkout_cancel_url: config.checkout_cancel_url.clone(),
        }
    }

    /// Upstream error details are only shown to clients outside production.
    pub fn show_error_details(&self) -> bool {
        self.environment != Environment::Production
    }
}
