//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The exchange credentials are referenced by env-var name in the config
//! and resolved at runtime; they are held as secrets so they never show
//! up in logs or `Debug` output.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::types::InvestError;

/// Default config path, overridable through `INVEST_CONFIG`.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub files: FilesConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

/// Locations of the three flat files the bot reads and writes.
#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    pub watch_list: PathBuf,
    pub pot: PathBuf,
    pub transactions: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// Quote currency appended to every ticker (BTC -> BTCUSDT).
    pub base_currency: String,
    /// Bars requested per coin; must cover the long window.
    pub bar_limit: u32,
    pub timeout_secs: u64,
    pub api_key_env: String,
    pub api_secret_env: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            base_currency: "USDT".to_string(),
            bar_limit: 42,
            timeout_secs: 30,
            api_key_env: "api_key".to_string(),
            api_secret_env: "api_secret".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyConfig {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            short_window: 7,
            long_window: 21,
        }
    }
}

/// Exchange API credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: SecretString,
    pub api_secret: SecretString,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_secret: SecretString::new(api_secret.into()),
        }
    }

    /// Whether both secrets are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.api_secret.expose_secret().is_empty()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), InvestError> {
        let s = &self.strategy;
        if s.short_window == 0 || s.short_window > s.long_window {
            return Err(InvestError::Config(format!(
                "short_window ({}) must be between 1 and long_window ({})",
                s.short_window, s.long_window
            )));
        }
        if (self.exchange.bar_limit as usize) < s.long_window {
            return Err(InvestError::Config(format!(
                "bar_limit ({}) must cover long_window ({})",
                self.exchange.bar_limit, s.long_window
            )));
        }
        if self.exchange.base_currency.trim().is_empty() {
            return Err(InvestError::Config("base_currency must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Read both exchange secrets from the environment. Both are required.
    pub fn credentials(&self) -> Result<Credentials> {
        let key = Self::resolve_env(&self.exchange.api_key_env)?;
        let secret = Self::resolve_env(&self.exchange.api_secret_env)?;
        let creds = Credentials::new(key, secret);
        if !creds.is_complete() {
            return Err(InvestError::Config("exchange credentials must not be empty".into()).into());
        }
        Ok(creds)
    }
}
