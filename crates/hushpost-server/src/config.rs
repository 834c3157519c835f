use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use hushpost_relay::RelayConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub db_timeout: Duration,
    pub relay: RelayConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("HUSHPOST_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("HUSHPOST_JWT_SECRET is unset or still a placeholder");
        }

        let defaults = RelayConfig::default();
        let relay = RelayConfig {
            base_url: get("HUSHPOST_LLM_BASE_URL").unwrap_or(defaults.base_url),
            api_key: get("OPENAI_API_KEY").filter(|k| !k.is_empty()),
            model: get("HUSHPOST_LLM_MODEL").unwrap_or(defaults.model),
            connect_timeout: secs(&get, "HUSHPOST_LLM_CONNECT_TIMEOUT_SECS", defaults.connect_timeout)?,
            idle_timeout: secs(&get, "HUSHPOST_LLM_IDLE_TIMEOUT_SECS", defaults.idle_timeout)?,
        };

        let db_timeout = match get("HUSHPOST_DB_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(v.parse().context("HUSHPOST_DB_TIMEOUT_MS")?),
            None => Duration::from_millis(5000),
        };

        Ok(Self {
            host: get("HUSHPOST_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: get("HUSHPOST_PORT")
                .unwrap_or_else(|| "3000".into())
                .parse()
                .context("HUSHPOST_PORT")?,
            db_path: get("HUSHPOST_DB_PATH")
                .unwrap_or_else(|| "hushpost.db".into())
                .into(),
            jwt_secret,
            db_timeout,
            relay,
        })
    }
}

fn secs(get: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Result<Duration> {
    match get(key) {
        Some(v) => Ok(Duration::from_secs(v.parse().with_context(|| key.to_string())?)),
        None => Ok(default),
    }
}
