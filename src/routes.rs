//! Route catalogue: path-to-key-template wiring for the REST adapter.
//!
//! This is configuration data, not engine behavior. Each entry binds an HTTP
//! path (axum `{param}` syntax) to a dot-joined key template for the
//! resolver. The default catalogue mirrors a v2-style trading API; configs
//! may append their own entries.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
}

/// One REST route: HTTP path plus the key template it resolves through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    /// HTTP path, e.g. `/v2/ticker/{symbol}`.
    pub path: String,

    /// Key template, e.g. `ticker.{symbol}`.
    pub key: String,

    /// Explicit method; when omitted, authenticated routes (third path
    /// segment `auth`) are POST and everything else is GET.
    #[serde(default)]
    pub method: Option<HttpMethod>,
}

impl RouteSpec {
    pub fn new(path: &str, key: &str) -> Self {
        Self {
            path: path.to_string(),
            key: key.to_string(),
            method: None,
        }
    }

    pub fn effective_method(&self) -> HttpMethod {
        if let Some(method) = self.method {
            return method;
        }
        if self.path.split('/').nth(2) == Some("auth") {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.path.starts_with('/') {
            anyhow::bail!("route path must start with '/': {:?}", self.path);
        }
        if self.key.is_empty() {
            anyhow::bail!("route key template cannot be empty for path {:?}", self.path);
        }
        Ok(())
    }
}

/// Default (path, key template) catalogue.
pub const DEFAULT_ROUTES: &[(&str, &str)] = &[
    ("/v2/ticker/{symbol}", "ticker.{symbol}"),
    ("/v2/tickers", "tickers"),
    ("/v2/tickers/hist", "tickers_hist"),
    ("/v2/stats1/{key}/{context}", "stats.{key}.{context}"),
    ("/v2/status/{type}", "status_messages.{type}.{keys}"),
    ("/v2/candles/{key}/{section}", "candles.{key}.{section}"),
    (
        "/v2/trades/{symbol}/hist",
        "public_trades.{symbol}.{start}.{end}.{limit}.{sort}",
    ),
    (
        "/v2/liquidations/hist",
        "liquidations.{start}.{end}.{limit}.{sort}",
    ),
    ("/v2/calc/trade/avg", "market_average_price.{symbol}.{amount}"),
    ("/v2/auth/r/alerts", "alerts.{type}"),
    ("/v2/auth/w/alert/set", "alert_set.{type}.{symbol}.{price}"),
    ("/v2/auth/w/alert/del", "alert_del.{symbol}.{price}"),
    (
        "/v2/auth/r/trades/hist",
        "trades.{start}.{end}.{limit}.{sort}",
    ),
    (
        "/v2/auth/r/trades/{symbol}/hist",
        "trades.{symbol}.{start}.{end}.{limit}.{sort}",
    ),
    ("/v2/auth/r/wallets", "wallets"),
    ("/v2/auth/r/orders", "active_orders"),
    ("/v2/auth/r/orders/hist", "orders.{start}.{end}.{limit}"),
    (
        "/v2/auth/r/orders/{symbol}/hist",
        "orders.{symbol}.{start}.{end}.{limit}",
    ),
    (
        "/v2/auth/r/order/{symID}/trades",
        "order_trades.{symID}.{start}.{end}.{limit}",
    ),
    ("/v2/auth/r/positions", "positions"),
    (
        "/v2/auth/r/positions/hist",
        "positions_hist.{start}.{end}.{limit}",
    ),
    ("/v2/auth/r/funding/offers/{symbol}", "f_offers.{symbol}"),
    (
        "/v2/auth/r/funding/offers/{symbol}/hist",
        "f_offer_hist.{symbol}.{start}.{end}.{limit}",
    ),
    ("/v2/auth/r/funding/loans/{symbol}", "f_loans.{symbol}"),
    ("/v2/auth/r/funding/credits/{symbol}", "f_credits.{symbol}"),
    ("/v2/auth/r/info/margin/{key}", "margin_info.{key}"),
    ("/v2/auth/r/info/funding/{key}", "f_info.{key}"),
    (
        "/v2/auth/r/ledgers/{symbol}/hist",
        "ledgers.{symbol}.{start}.{end}.{limit}",
    ),
    (
        "/v2/auth/r/movements/{symbol}/hist",
        "movements.{symbol}.{start}.{end}.{limit}",
    ),
    ("/v2/auth/r/info/user", "user_info"),
    ("/v2/auth/calc/order/avail", "calc.{symbol}.{dir}.{rate}.{type}"),
];

/// The default catalogue as specs, with inferred methods.
pub fn default_routes() -> Vec<RouteSpec> {
    DEFAULT_ROUTES
        .iter()
        .map(|&(path, key)| RouteSpec::new(path, key))
        .collect()
}
