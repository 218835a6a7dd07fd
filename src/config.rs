use std::env;
use std::fmt;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::status::TransitionPolicy;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAIL_FROM: &str = "orders@campus-eats.local";
const DEFAULT_MAIL_TIMEOUT: Duration = Duration::from_secs(10);
pub const CURRENCY: &str = "INR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Wraps a value that must never end up in logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>
where
    T: Clone + Default,
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

fn timeout_from_env(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(s) => s
            .parse()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                name,
                reason: format!("{s}: {e}"),
            }),
        Err(_) => Ok(default),
    }
}

/// Empty values and template leftovers such as `rzp_test_placeholder`.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.to_ascii_lowercase().contains("placeholder")
}

#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<Secret<String>>,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            api_base: DEFAULT_RAZORPAY_API_BASE.to_string(),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl RazorpayConfig {
    pub fn new(key_id: &str, key_secret: &str) -> Self {
        Self {
            key_id: Some(key_id.to_string()),
            key_secret: Some(Secret::new(key_secret.to_string())),
            ..Default::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout = timeout_from_env("RAZORPAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT)?;
        let config = Self {
            key_id: env::var("RAZORPAY_KEY_ID").ok(),
            key_secret: env::var("RAZORPAY_KEY_SECRET").ok().map(Secret::new),
            api_base: env::var("RAZORPAY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_RAZORPAY_API_BASE.to_string()),
            timeout,
        };
        if config.credentials().is_err() {
            warn!("Razorpay credentials are not configured. Online payments will be refused.");
        }
        Ok(config)
    }

    /// Key id and secret for the orders API.
    pub fn credentials(&self) -> Result<(&str, &str), DomainError> {
        let key_id = self
            .key_id
            .as_deref()
            .filter(|v| !is_placeholder(v))
            .ok_or_else(|| DomainError::Configuration("RAZORPAY_KEY_ID is not set".to_string()))?;
        Ok((key_id, self.signing_secret()?))
    }

    /// The key secret, which also signs payment callbacks.
    pub fn signing_secret(&self) -> Result<&str, DomainError> {
        self.key_secret
            .as_ref()
            .map(|s| s.reveal().as_str())
            .filter(|v| !is_placeholder(v))
            .ok_or_else(|| DomainError::Configuration("RAZORPAY_KEY_SECRET is not set".to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    /// HTTP endpoint of the mail relay. Mail is only logged when unset.
    pub relay_url: Option<String>,
    pub relay_token: Option<Secret<String>>,
    pub from: String,
    pub timeout: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            relay_token: None,
            from: DEFAULT_MAIL_FROM.to_string(),
            timeout: DEFAULT_MAIL_TIMEOUT,
        }
    }
}

impl MailConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            relay_url: env::var("MAIL_RELAY_URL").ok().filter(|s| !s.trim().is_empty()),
            relay_token: env::var("MAIL_RELAY_TOKEN").ok().map(Secret::new),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
            timeout: timeout_from_env("MAIL_TIMEOUT_SECS", DEFAULT_MAIL_TIMEOUT)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub razorpay: RazorpayConfig,
    pub mail: MailConfig,
    pub status_policy: TransitionPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("PORT") {
            Ok(s) => s.parse().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{s}: {e}"),
            })?,
            Err(_) => DEFAULT_PORT,
        };
        let status_policy = match env::var("ORDER_STATUS_POLICY") {
            Ok(s) => s.parse().map_err(|e: DomainError| ConfigError::Invalid {
                name: "ORDER_STATUS_POLICY",
                reason: e.to_string(),
            })?,
            Err(_) => TransitionPolicy::default(),
        };
        info!("Order status policy: {status_policy:?}");
        Ok(Self {
            host,
            port,
            database_url,
            razorpay: RazorpayConfig::from_env()?,
            mail: MailConfig::from_env()?,
            status_policy,
        })
    }
}
