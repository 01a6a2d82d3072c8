//! Configuration loading from environment.

use std::env;

/// Deployment environment; controls how strict the secrets handling is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Staging,
    Production,
}

impl AppEnv {
    fn from_env() -> anyhow::Result<Self> {
        match env::var("APP_ENV").as_deref() {
            Ok("production") => Ok(Self::Production),
            Ok("staging") => Ok(Self::Staging),
            Ok("development") | Err(_) => Ok(Self::Development),
            Ok(other) => anyhow::bail!("Unknown APP_ENV: {}", other),
        }
    }
}

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub app_env: AppEnv,
    pub provider_base_url: String,
    pub provider_client_id: String,
    pub provider_client_secret: String,
    /// HMAC secret for webhook verification; mandatory in production.
    pub webhook_secret: Option<String>,
    /// Bearer key for merchant endpoints; open access when unset (dev).
    pub api_key: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let app_env = AppEnv::from_env()?;

        let provider_base_url = env::var("PROVIDER_BASE_URL")
            .map_err(|_| anyhow::anyhow!("PROVIDER_BASE_URL environment variable is required"))?;
        let provider_client_id = env::var("PROVIDER_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("PROVIDER_CLIENT_ID environment variable is required"))?;
        let provider_client_secret = env::var("PROVIDER_CLIENT_SECRET").map_err(|_| {
            anyhow::anyhow!("PROVIDER_CLIENT_SECRET environment variable is required")
        })?;

        let webhook_secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());
        if app_env == AppEnv::Production && webhook_secret.is_none() {
            anyhow::bail!("WEBHOOK_SECRET is required when APP_ENV=production");
        }

        let api_key = env::var("API_KEY").ok().filter(|s| !s.is_empty());
        if app_env == AppEnv::Production && api_key.is_none() {
            anyhow::bail!("API_KEY is required when APP_ENV=production");
        }

        Ok(Self {
            port,
            database_url,
            app_env,
            provider_base_url,
            provider_client_id,
            provider_client_secret,
            webhook_secret,
            api_key,
        })
    }
}
