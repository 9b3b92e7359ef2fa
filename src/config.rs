use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base url of the translation service.
    pub gateway_url: String,
    pub gateway_timeout: Duration,
    /// Max translation calls in flight at once.
    pub gateway_concurrency: usize,
    /// How long a fresh `/chat` connection may take to send its bind frame.
    pub bind_timeout: Duration,
    /// Whether a sender is part of its own fan-out.
    pub self_delivery: bool,
    pub cors_origins: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
            gateway_url: "http://127.0.0.1:8000".to_owned(),
            gateway_timeout: Duration::from_secs(30),
            gateway_concurrency: 5,
            bind_timeout: Duration::from_secs(10),
            self_delivery: true,
            cors_origins: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: lookup("CROSSTALK_HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "CROSSTALK_PORT", defaults.port)?,
            gateway_url: lookup("CROSSTALK_GATEWAY_URL").unwrap_or(defaults.gateway_url),
            gateway_timeout: parse(&lookup, "CROSSTALK_GATEWAY_TIMEOUT_SECS", defaults.gateway_timeout.as_secs())
                .map(Duration::from_secs)?,
            gateway_concurrency: parse(&lookup, "CROSSTALK_GATEWAY_CONCURRENCY", defaults.gateway_concurrency)?
                .max(1),
            bind_timeout: parse(&lookup, "CROSSTALK_BIND_TIMEOUT_SECS", defaults.bind_timeout.as_secs())
                .map(Duration::from_secs)?,
            self_delivery: parse(&lookup, "CROSSTALK_SELF_DELIVERY", defaults.self_delivery)?,
            cors_origins: lookup("CROSSTALK_CORS_ORIGINS").filter(|origins| !origins.trim().is_empty()),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("Invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}
