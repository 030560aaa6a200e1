// Binance REST client and the error type shared by every request
pub mod binance;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, RequestError>;

/// Failure of a single exchange call, caught at that call's boundary.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A signed call could not be timestamped, so nothing was sent.
    #[error("Could not get server time")]
    ServerTimeUnavailable,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RequestError {
    /// Build a status error, surfacing Binance's `{"code": .., "msg": ..}` body when present.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ApiError {
            code: i64,
            msg: String,
        }

        let message = match serde_json::from_str::<ApiError>(body) {
            Ok(err) => format!("code {}: {}", err.code, err.msg),
            Err(_) if body.trim().is_empty() => "empty response body".to_string(),
            Err(_) => body.trim().to_string(),
        };
        RequestError::Status { status, message }
    }
}
