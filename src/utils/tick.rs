use std::collections::HashMap;

use serde::Deserialize;

/// Pairs the report prints, in print order.
pub const TOP_PAIRS: [&str; 5] = ["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "XRPUSDT"];

/// One entry of `GET /api/v3/ticker/price`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
}

/// Symbol to price, rebuilt from every fetch.
pub type PriceMap = HashMap<String, String>;

pub fn price_map(prices: Vec<TickerPrice>) -> PriceMap {
    prices
        .into_iter()
        .map(|tick| (tick.symbol, tick.price))
        .collect()
}

/// Allow-listed pairs present in `prices`, in [`TOP_PAIRS`] order.
pub fn top_pair_prices(prices: &PriceMap) -> Vec<(&'static str, &str)> {
    TOP_PAIRS
        .iter()
        .filter_map(|pair| prices.get(*pair).map(|price| (*pair, price.as_str())))
        .collect()
}
