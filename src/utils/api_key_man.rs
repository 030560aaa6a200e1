use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::config::ConfigError;

pub const API_KEY_VAR: &str = "BINANCE_API_KEY";
pub const API_SECRET_VAR: &str = "BINANCE_API_SECRET";

/// API key (sent as a header) and secret (HMAC key only).
///
/// The secret never shows up in `Debug` output and is zeroed on drop.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Credentials {
            api_key,
            api_secret: SecretString::from(api_secret),
        }
    }

    /// Read both variables through `lookup`. Unset and empty are both missing.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingEnvVar(name))
        };

        let api_key = read(API_KEY_VAR)?;
        let api_secret = read(API_SECRET_VAR)?;
        Ok(Credentials::new(api_key, api_secret))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Only for signing. Never log the result.
    pub fn expose_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}
