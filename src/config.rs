//! read configuration from a file, the environment or a secret

use std::fmt;
use std::path::Path;

use aws_config::BehaviorVersion;
use serde::Deserialize;

use crate::errors::Error;

pub const DEFAULT_TOKEN_URL: &str = "https://osu.ppy.sh/oauth/token";
pub const DEFAULT_PREFERRED_REFRESH_PERCENT: u8 = 90;

pub enum ConfigLocation {
    File(String),
    Env,
    Secret,
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub username: String,
    pub password: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_preferred_refresh_percent")]
    pub preferred_refresh_percent: u8,
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_preferred_refresh_percent() -> u8 {
    DEFAULT_PREFERRED_REFRESH_PERCENT
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("preferred_refresh_percent", &self.preferred_refresh_percent)
            .finish()
    }
}

impl Config {
    /// Configuration for the default token endpoint with the given credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            token_url: default_token_url(),
            request_timeout_secs: None,
            preferred_refresh_percent: DEFAULT_PREFERRED_REFRESH_PERCENT,
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn with_preferred_refresh_percent(mut self, percent: u8) -> Self {
        self.preferred_refresh_percent = percent;
        self
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// # ENV Vars
    /// * `TOKEN_CACHE_USERNAME` - Account username
    /// * `TOKEN_CACHE_PASSWORD` - Account password
    /// * `TOKEN_CACHE_URL` - Optional token endpoint override
    /// * `TOKEN_CACHE_TIMEOUT_SECS` - Optional request timeout
    /// * `TOKEN_CACHE_PREFERRED_PERCENT` - Optional share of the lifetime before a background refresh
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Config::new(
            std::env::var("TOKEN_CACHE_USERNAME")
                .map_err(|_| Error::Config("Missing TOKEN_CACHE_USERNAME env var".to_string()))?,
            std::env::var("TOKEN_CACHE_PASSWORD")
                .map_err(|_| Error::Config("Missing TOKEN_CACHE_PASSWORD env var".to_string()))?,
        );
        if let Ok(url) = std::env::var("TOKEN_CACHE_URL") {
            config.token_url = url;
        }
        if let Ok(secs) = std::env::var("TOKEN_CACHE_TIMEOUT_SECS") {
            config.request_timeout_secs = Some(secs.parse().map_err(|_| {
                Error::Config(format!("Invalid TOKEN_CACHE_TIMEOUT_SECS '{}'", secs))
            })?);
        }
        if let Ok(percent) = std::env::var("TOKEN_CACHE_PREFERRED_PERCENT") {
            config.preferred_refresh_percent = percent.parse().map_err(|_| {
                Error::Config(format!(
                    "Invalid TOKEN_CACHE_PREFERRED_PERCENT '{}'",
                    percent
                ))
            })?;
        }
        Ok(config)
    }
}

pub async fn read_config(loc: ConfigLocation) -> Result<Config, Error> {
    match loc {
        ConfigLocation::File(path) => Config::from_file(path),
        ConfigLocation::Env => Config::from_env(),
        ConfigLocation::Secret => read_config_from_secret().await,
    }
}

async fn read_config_from_secret() -> Result<Config, Error> {
    let secret_arn = std::env::var("TOKEN_CACHE_SECRET_ARN")
        .map_err(|_| Error::Config("Missing TOKEN_CACHE_SECRET_ARN env var".to_string()))?;
    let client = aws_sdk_secretsmanager::Client::new(
        &aws_config::load_defaults(BehaviorVersion::latest()).await,
    );
    let resp = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Config(format!("Failed to get secret: {}", e)))?;
    let secret = resp
        .secret_string()
        .ok_or_else(|| Error::Config("Failed to get secret string, returned None".to_string()))?;
    Ok(serde_json::from_str(secret)?)
}
