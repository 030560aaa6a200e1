use serde::Deserialize;
use tracing::warn;

/// Response of `GET /api/v3/account`, reduced to what the report shows.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub balances: Vec<Balance>,
}

/// One asset entry. Amounts stay as the exchange's decimal strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Balance {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

impl AccountInfo {
    /// Balances where either the free or the locked amount is positive.
    pub fn non_zero_balances(&self) -> Vec<&Balance> {
        self.balances.iter().filter(|b| b.is_non_zero()).collect()
    }
}

impl Balance {
    pub fn free_amount(&self) -> f64 {
        parse_amount(&self.asset, "free", &self.free)
    }

    pub fn locked_amount(&self) -> f64 {
        parse_amount(&self.asset, "locked", &self.locked)
    }

    pub fn is_non_zero(&self) -> bool {
        self.free_amount() > 0.0 || self.locked_amount() > 0.0
    }
}

fn parse_amount(asset: &str, field: &str, raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(amount) => amount,
        Err(e) => {
            warn!(asset, field, raw, error = %e, "Unparseable balance amount, treating as zero");
            0.0
        }
    }
}
