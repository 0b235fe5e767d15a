//! Process configuration, read from the environment (and `.env` via dotenvy).

use std::env;
use crate::domain::value_objects::DEFAULT_CURRENCY;

pub const DEFAULT_PORT: u16 = 8084;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CART_TTL_MINS: i64 = 120;

/// Backend connection settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// e.g. "https://api.example.com/api"
    pub base_url: String,
    /// Bearer token forwarded on every backend call
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), token: None, timeout_secs: DEFAULT_TIMEOUT_SECS }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Http,
    /// In-process backend, for local development
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub currency: String,
    /// Carts untouched this long are dropped
    pub cart_ttl_mins: i64,
    pub backend: BackendKind,
    pub api: ApiConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => DEFAULT_PORT,
        };
        let timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS", raw))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        let cart_ttl_mins = match env::var("CART_TTL_MINS") {
            Ok(raw) => raw.parse().ok().filter(|m: &i64| *m > 0).ok_or(ConfigError::Invalid("CART_TTL_MINS", raw))?,
            Err(_) => DEFAULT_CART_TTL_MINS,
        };
        let backend = match env::var("MARKETPLACE_BACKEND").as_deref() {
            Ok("memory") => BackendKind::Memory,
            Ok("http") | Err(_) => BackendKind::Http,
            Ok(other) => return Err(ConfigError::Invalid("MARKETPLACE_BACKEND", other.to_string())),
        };
        let base_url = match (env::var("API_BASE_URL"), backend) {
            (Ok(url), _) => url,
            (Err(_), BackendKind::Memory) => String::new(),
            (Err(_), BackendKind::Http) => return Err(ConfigError::Missing("API_BASE_URL")),
        };
        let mut api = ApiConfig::new(base_url).with_timeout(timeout_secs);
        if let Ok(token) = env::var("API_TOKEN") { api = api.with_token(token); }

        Ok(Self {
            port,
            currency: env::var("CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string()),
            cart_ttl_mins,
            backend,
            api,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}
