use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, info};

use super::{ApiResult, RequestError};
use crate::config::Config;
use crate::utils::balance::AccountInfo;
use crate::utils::tick::TickerPrice;

pub const BINANCE_API_URL: &str = "https://api.binance.com";
pub const RECV_WINDOW_MS: u64 = 10_000;
const BINANCE_API_TIMEOUT: Duration = Duration::from_millis(10_000);
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

const TIME_PATH: &str = "/api/v3/time";
const ACCOUNT_PATH: &str = "/api/v3/account";
const DEPOSIT_ADDRESS_PATH: &str = "/sapi/v1/capital/deposit/address";
const TICKER_PRICE_PATH: &str = "/api/v3/ticker/price";

/// Request parameters in transmission order. The signed string and the sent
/// query are both built from this, so order must never be shuffled.
pub type Params = Vec<(String, String)>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTime {
    server_time: i64,
}

/// Response of `GET /sapi/v1/capital/deposit/address`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DepositAddress {
    pub coin: String,
    pub address: String,
    #[serde(default)]
    pub tag: String,
}

/// Join params as `k=v&k=v` in iteration order.
pub fn query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex HMAC-SHA256 of the query string built from `params`, keyed by `secret`.
pub fn sign(secret: &str, params: &[(String, String)]) -> String {
    get_signature(secret, &query_string(params))
}

fn get_signature(secret: &str, query_string: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(query_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Append `timestamp`, `recvWindow` and the signature over everything before it.
pub fn sign_params(secret: &str, mut params: Params, timestamp: i64) -> Params {
    params.push(("timestamp".to_string(), timestamp.to_string()));
    params.push(("recvWindow".to_string(), RECV_WINDOW_MS.to_string()));
    let signature = sign(secret, &params);
    params.push(("signature".to_string(), signature));
    params
}

pub struct BinanceClient<'a> {
    config: &'a Config,
    http: reqwest::Client,
}

impl<'a> BinanceClient<'a> {
    pub fn new(config: &'a Config) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(BINANCE_API_TIMEOUT)
            .build()?;
        Ok(BinanceClient { config, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RequestError::from_status(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Current exchange time in milliseconds. Unauthenticated.
    pub async fn get_server_time(&self) -> ApiResult<i64> {
        let request = self.http.get(self.endpoint(TIME_PATH));
        let time = self
            .get_json::<BinanceTime>(request)
            .await
            .map_err(|e| {
                error!(error = %e, "Error getting server time");
                e
            })?;

        debug!(server_time = time.server_time, "Fetched server time");
        Ok(time.server_time)
    }

    /// Timestamp and sign caller params against the current server time.
    ///
    /// Fails with [`RequestError::ServerTimeUnavailable`] when the exchange
    /// clock cannot be read; callers must not send anything in that case.
    pub async fn signed_params(&self, params: Params) -> ApiResult<Params> {
        let timestamp = self
            .get_server_time()
            .await
            .map_err(|_| RequestError::ServerTimeUnavailable)?;
        Ok(sign_params(
            self.config.credentials.expose_secret(),
            params,
            timestamp,
        ))
    }

    async fn signed_get<T: DeserializeOwned>(&self, path: &str, params: Params) -> ApiResult<T> {
        let signed = self.signed_params(params).await?;
        let url = format!("{}?{}", self.endpoint(path), query_string(&signed));

        let request = self
            .http
            .get(url)
            .header(API_KEY_HEADER, self.config.credentials.api_key());
        self.get_json(request).await
    }

    /// `GET /api/v3/account`, signed.
    pub async fn get_account_info(&self) -> ApiResult<AccountInfo> {
        let account = self
            .signed_get::<AccountInfo>(ACCOUNT_PATH, Vec::new())
            .await
            .map_err(|e| {
                error!(error = %e, "Error getting account info");
                e
            })?;

        info!(balances = account.balances.len(), "Account info retrieved");
        Ok(account)
    }

    /// `GET /sapi/v1/capital/deposit/address`, signed. `network` is only sent when given.
    pub async fn get_deposit_address(
        &self,
        coin: &str,
        network: Option<&str>,
    ) -> ApiResult<DepositAddress> {
        let mut params = vec![("coin".to_string(), coin.to_string())];
        if let Some(network) = network.filter(|n| !n.is_empty()) {
            params.push(("network".to_string(), network.to_string()));
        }

        self.signed_get(DEPOSIT_ADDRESS_PATH, params)
            .await
            .map_err(|e| {
                error!(coin, error = %e, "Error getting deposit address");
                e
            })
    }

    /// Latest price of every listed symbol. Unauthenticated.
    ///
    /// A failed call is an `Err`; an exchange answering with no tickers is `Ok(vec![])`.
    pub async fn get_prices(&self) -> ApiResult<Vec<TickerPrice>> {
        let request = self.http.get(self.endpoint(TICKER_PRICE_PATH));
        let prices = self
            .get_json::<Vec<TickerPrice>>(request)
            .await
            .map_err(|e| {
                error!(error = %e, "Error getting prices");
                e
            })?;

        debug!(symbols = prices.len(), "Fetched ticker prices");
        Ok(prices)
    }
}
