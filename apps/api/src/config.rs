use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_LLM_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "deepseek-chat";

/// Deployment environment. Only `Development` exposes verbose error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            other => anyhow::bail!("APP_ENV must be 'development' or 'production', got '{other}'"),
        }
    }

    pub fn exposes_error_detail(self) -> bool {
        self == AppEnv::Development
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    /// Shared secret for the `x-admin-token` header. `None` disables admin access.
    pub admin_token: Option<String>,
    pub app_env: AppEnv,
    pub store_timeout: Duration,
    pub match_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_API_URL.to_string()),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            admin_token: std::env::var("ADMIN_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            app_env: AppEnv::parse(
                &std::env::var("APP_ENV").unwrap_or_else(|_| "production".to_string()),
            )?,
            store_timeout: Duration::from_secs(parse_env("STORE_TIMEOUT_SECS", 5)?),
            match_timeout: Duration::from_secs(parse_env("MATCH_TIMEOUT_SECS", 30)?),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for router tests: admin token `test-admin`, development errors.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/directory_test".to_string(),
            db_max_connections: 1,
            llm_api_key: "test-key".to_string(),
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            admin_token: Some("test-admin".to_string()),
            app_env: AppEnv::Development,
            store_timeout: Duration::from_secs(1),
            match_timeout: Duration::from_secs(1),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
