//! The fixed report sequence: server time, account, deposit address, prices.
//!
//! Every step after the connectivity check is allowed to fail on its own;
//! the report prints a notice for it and moves on.

use std::io::{self, Write};

use chrono::{SecondsFormat, TimeZone, Utc};
use thiserror::Error;
use tracing::info;

use crate::config::{Config, DepositTarget};
use crate::exchanges::binance::BinanceClient;
use crate::exchanges::RequestError;
use crate::utils::balance::AccountInfo;
use crate::utils::tick::{price_map, top_pair_prices};

const RULE: &str = "==================================================";

#[derive(Debug, Error)]
pub enum ReportError {
    /// The exchange did not answer the server-time check; nothing else was attempted.
    #[error("Binance API unreachable: {0}")]
    Unreachable(#[source] RequestError),

    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

pub async fn run<W: Write>(
    client: &BinanceClient<'_>,
    config: &Config,
    out: &mut W,
) -> Result<(), ReportError> {
    writeln!(out, "Starting Binance API report...")?;
    writeln!(out, "{}", RULE)?;

    let server_time = match client.get_server_time().await {
        Ok(server_time) => server_time,
        Err(e) => {
            writeln!(out, "✗ Failed to connect to Binance API")?;
            return Err(ReportError::Unreachable(e));
        }
    };
    writeln!(out, "✓ Connected to Binance API")?;
    writeln!(out, "✓ Server time: {}", format_server_time(server_time))?;

    match client.get_account_info().await {
        Ok(account) => {
            writeln!(out, "✓ Account info retrieved successfully")?;
            write_balances(out, &account)?;
        }
        Err(e) => writeln!(out, "✗ Error: {}", e)?,
    }

    if let Some(target) = &config.deposit {
        write_deposit_address(client, target, out).await?;
    }

    write_prices(client, out).await?;

    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Report complete.")?;
    info!("Report complete");
    Ok(())
}

fn format_server_time(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(time) => format!(
            "{} ({})",
            millis,
            time.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        None => millis.to_string(),
    }
}

fn write_balances<W: Write>(out: &mut W, account: &AccountInfo) -> io::Result<()> {
    writeln!(
        out,
        "Account type: {}",
        account.account_type.as_deref().unwrap_or("N/A")
    )?;

    writeln!(out)?;
    writeln!(out, "=== BALANCES ===")?;
    let balances = account.non_zero_balances();
    if balances.is_empty() {
        writeln!(out, "No balances found (account is empty)")?;
    }
    for balance in balances {
        writeln!(
            out,
            "{}: Free={:?}, Locked={:?}",
            balance.asset,
            balance.free_amount(),
            balance.locked_amount()
        )?;
    }
    Ok(())
}

async fn write_deposit_address<W: Write>(
    client: &BinanceClient<'_>,
    target: &DepositTarget,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== DEPOSIT ADDRESS ===")?;

    match client
        .get_deposit_address(&target.coin, target.network.as_deref())
        .await
    {
        Ok(deposit) => {
            let network = target.network.as_deref().unwrap_or("default network");
            write!(out, "{} ({}): {}", deposit.coin, network, deposit.address)?;
            if !deposit.tag.is_empty() {
                write!(out, " tag={}", deposit.tag)?;
            }
            writeln!(out)
        }
        Err(e) => writeln!(out, "✗ Error: {}", e),
    }
}

async fn write_prices<W: Write>(client: &BinanceClient<'_>, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== CURRENT PRICES ===")?;

    // An empty ticker list and a failed fetch print the same notice; only the failure is logged.
    let prices = client.get_prices().await.unwrap_or_default();
    if prices.is_empty() {
        return writeln!(out, "Could not retrieve prices");
    }

    let prices = price_map(prices);
    for (pair, price) in top_pair_prices(&prices) {
        writeln!(out, "{}: ${}", pair, price)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::api_key_man::Credentials;
    use serde_json::json;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> Config {
        let mut config = Config::new(Credentials::new("key".into(), "secret".into()));
        config.base_url = base_url.to_string();
        config
    }

    async fn mock_json(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn render(config: &Config) -> (Result<(), ReportError>, String) {
        let client = BinanceClient::new(config).unwrap();
        let mut out = Vec::new();
        let result = run(&client, config, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn server_time_is_shown_with_utc() {
        assert_eq!(
            format_server_time(1_700_000_000_000),
            "1700000000000 (2023-11-14T22:13:20Z)"
        );
    }

    #[tokio::test]
    async fn full_report() {
        let server = MockServer::start().await;
        mock_json(&server, "/api/v3/time", json!({ "serverTime": 1_700_000_000_000i64 })).await;
        mock_json(
            &server,
            "/api/v3/account",
            json!({
                "accountType": "SPOT",
                "balances": [
                    { "asset": "BTC", "free": "0.50000000", "locked": "0.00000000" },
                    { "asset": "ETH", "free": "0.00000000", "locked": "0.00000000" },
                    { "asset": "BNB", "free": "0.00000000", "locked": "1.00000000" }
                ]
            }),
        )
        .await;
        mock_json(
            &server,
            "/api/v3/ticker/price",
            json!([
                { "symbol": "ETHUSDT", "price": "3500.10000000" },
                { "symbol": "LTCBTC", "price": "0.00120000" },
                { "symbol": "BTCUSDT", "price": "67000.00000000" }
            ]),
        )
        .await;

        let (result, output) = render(&test_config(&server.uri())).await;
        assert!(result.is_ok());

        let expected = "\
Starting Binance API report...
==================================================
✓ Connected to Binance API
✓ Server time: 1700000000000 (2023-11-14T22:13:20Z)
✓ Account info retrieved successfully
Account type: SPOT

=== BALANCES ===
BTC: Free=0.5, Locked=0.0
BNB: Free=0.0, Locked=1.0

=== CURRENT PRICES ===
BTCUSDT: $67000.00000000
ETHUSDT: $3500.10000000

==================================================
Report complete.
";
        assert_eq!(output, expected);
    }

    #[tokio::test]
    async fn empty_account_and_failed_prices_continue() {
        let server = MockServer::start().await;
        mock_json(&server, "/api/v3/time", json!({ "serverTime": 1_700_000_000_000i64 })).await;
        mock_json(&server, "/api/v3/account", json!({ "balances": [] })).await;
        Mock::given(path("/api/v3/ticker/price"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (result, output) = render(&test_config(&server.uri())).await;
        assert!(result.is_ok());
        assert!(output.contains("Account type: N/A\n"));
        assert!(output.contains("No balances found (account is empty)\n"));
        assert!(output.contains("=== CURRENT PRICES ===\nCould not retrieve prices\n"));
        assert!(output.ends_with("Report complete.\n"));
    }

    #[tokio::test]
    async fn account_error_is_reported_inline() {
        let server = MockServer::start().await;
        mock_json(&server, "/api/v3/time", json!({ "serverTime": 1_700_000_000_000i64 })).await;
        Mock::given(path("/api/v3/account"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "code": -2015, "msg": "Invalid API-key." })),
            )
            .mount(&server)
            .await;
        mock_json(
            &server,
            "/api/v3/ticker/price",
            json!([{ "symbol": "SOLUSDT", "price": "150.00" }]),
        )
        .await;

        let (result, output) = render(&test_config(&server.uri())).await;
        assert!(result.is_ok());
        assert!(output.contains("✗ Error: HTTP 401 Unauthorized: code -2015: Invalid API-key.\n"));
        assert!(!output.contains("=== BALANCES ==="));
        assert!(output.contains("SOLUSDT: $150.00\n"));
    }

    #[tokio::test]
    async fn deposit_section_when_configured() {
        let server = MockServer::start().await;
        mock_json(&server, "/api/v3/time", json!({ "serverTime": 1_700_000_000_000i64 })).await;
        mock_json(&server, "/api/v3/account", json!({ "accountType": "SPOT", "balances": [] })).await;
        mock_json(
            &server,
            "/sapi/v1/capital/deposit/address",
            json!({ "coin": "XRP", "address": "rEb8TK3gBgk5auZkwc6sHnwrGVJH8DuaLh", "tag": "101", "url": "" }),
        )
        .await;
        mock_json(&server, "/api/v3/ticker/price", json!([])).await;

        let mut config = test_config(&server.uri());
        config.deposit = Some(DepositTarget {
            coin: "XRP".into(),
            network: Some("XRP".into()),
        });

        let (result, output) = render(&config).await;
        assert!(result.is_ok());
        assert!(output.contains(
            "=== DEPOSIT ADDRESS ===\nXRP (XRP): rEb8TK3gBgk5auZkwc6sHnwrGVJH8DuaLh tag=101\n"
        ));
        assert!(output.contains("Could not retrieve prices\n"));
    }

    #[tokio::test]
    async fn unreachable_server_aborts_before_account() {
        let server = MockServer::start().await;
        Mock::given(path("/api/v3/time"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        Mock::given(path("/api/v3/account"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(path("/api/v3/ticker/price"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (result, output) = render(&test_config(&server.uri())).await;
        assert!(matches!(result, Err(ReportError::Unreachable(_))));
        assert!(output.ends_with("✗ Failed to connect to Binance API\n"));
    }
}
