//! Process configuration, built once in `main` and borrowed by every call.

use thiserror::Error;

use crate::exchanges::binance::BINANCE_API_URL;
use crate::utils::api_key_man::Credentials;

pub const BASE_URL_VAR: &str = "BINANCE_BASE_URL";
pub const DEPOSIT_COIN_VAR: &str = "BINANCE_DEPOSIT_COIN";
pub const DEPOSIT_NETWORK_VAR: &str = "BINANCE_DEPOSIT_NETWORK";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),
}

/// Coin (and optional network) whose deposit address the report looks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositTarget {
    pub coin: String,
    pub network: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: String,
    pub deposit: Option<DepositTarget>,
}

impl Config {
    /// Defaults: production endpoint, no deposit lookup.
    pub fn new(credentials: Credentials) -> Self {
        Config {
            credentials,
            base_url: BINANCE_API_URL.to_string(),
            deposit: None,
        }
    }

    /// Load from the process environment, after a `.env` file if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = Config::new(Credentials::from_lookup(&lookup)?);
        if let Some(base_url) = set(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        config.deposit = set(DEPOSIT_COIN_VAR).map(|coin| DepositTarget {
            coin: coin.trim().to_uppercase(),
            network: set(DEPOSIT_NETWORK_VAR).map(|network| network.trim().to_uppercase()),
        });
        Ok(config)
    }
}
