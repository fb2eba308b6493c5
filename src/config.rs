//! Application configuration loaded from environment variables.

use serde::Deserialize;
use strum::{Display, EnumString};
use url::Url;

use crate::error::{ServerError, StoreError};

/// Which document store backs the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// MongoDB (Atlas or self-hosted).
    #[default]
    Mongo,
    /// In-process collections, lost on restart.
    Memory,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    // === Store ===
    /// Store backend.
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Full connection string; takes precedence over the credential fields.
    #[serde(default)]
    pub mongodb_uri: Option<String>,

    /// Database user.
    #[serde(default)]
    pub db_user: Option<String>,

    /// Database password.
    #[serde(default)]
    pub db_pass: Option<String>,

    /// Cluster host, e.g. `cluster0.abcde.mongodb.net`.
    #[serde(default)]
    pub db_host: Option<String>,

    /// Database holding the marketplace collections.
    #[serde(default = "default_db_name")]
    pub db_name: String,

    // === Auth ===
    /// HMAC secret for access tokens.
    pub access_token_secret: String,

    /// Access token lifetime.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,

    // === Payments ===
    /// Stripe secret key. Without it payment intents are simulated.
    #[serde(default)]
    pub stripe_secret_key: Option<String>,

    /// Stripe API base URL.
    #[serde(default = "default_stripe_url")]
    pub stripe_api_url: String,

    /// Currency for payment intents.
    #[serde(default = "default_currency")]
    pub payment_currency: String,

    /// Outbound HTTP timeout for the payment API.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,
}

fn default_port() -> u16 {
    5000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "https://asta-185de.web.app".to_string(),
    ]
}

fn default_db_name() -> String {
    "asta".to_string()
}

fn default_token_ttl() -> u64 {
    3600 // 1 hour
}

fn default_stripe_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_http_timeout() -> u64 {
    10_000
}

fn invalid(reason: &str) -> ServerError {
    ServerError::InvalidConfig(reason.to_string())
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.access_token_secret.is_empty() {
            return Err(invalid("ACCESS_TOKEN_SECRET is required"));
        }

        if self.token_ttl_seconds == 0 {
            return Err(invalid("TOKEN_TTL_SECONDS must be greater than 0"));
        }

        if self.store_backend == StoreBackend::Mongo {
            let has_credentials =
                self.db_user.is_some() && self.db_pass.is_some() && self.db_host.is_some();
            if self.mongodb_uri.is_none() && !has_credentials {
                return Err(invalid(
                    "MONGODB_URI or DB_USER, DB_PASS and DB_HOST are required",
                ));
            }

            if self.stripe_secret_key.is_none() {
                return Err(invalid("STRIPE_SECRET_KEY is required with the mongo backend"));
            }
        }

        if let Some(key) = &self.stripe_secret_key {
            if !key.starts_with("sk_") && !key.starts_with("rk_") {
                return Err(invalid("STRIPE_SECRET_KEY must start with sk_ or rk_"));
            }
        }

        Ok(())
    }

    /// Connection string for the Mongo backend.
    ///
    /// An explicit `MONGODB_URI` wins; otherwise an SRV URI is built from the
    /// credential fields with user and password percent-encoded.
    pub fn mongodb_uri(&self) -> Result<String, StoreError> {
        if let Some(uri) = &self.mongodb_uri {
            return Ok(uri.clone());
        }

        let (Some(user), Some(pass), Some(host)) = (&self.db_user, &self.db_pass, &self.db_host)
        else {
            return Err(StoreError::InvalidUri(
                "missing DB_USER, DB_PASS or DB_HOST".to_string(),
            ));
        };

        let mut url = Url::parse(&format!("mongodb+srv://{host}/"))
            .map_err(|e| StoreError::InvalidUri(e.to_string()))?;
        url.set_username(user)
            .map_err(|_| StoreError::InvalidUri("cannot set username".to_string()))?;
        url.set_password(Some(pass))
            .map_err(|_| StoreError::InvalidUri("cannot set password".to_string()))?;
        url.set_query(Some("retryWrites=true&w=majority"));

        Ok(url.to_string())
    }
}
