//! Dispatch: map one inbound unit of work to a configured response.
//!
//! Probes the response table with each candidate key from the resolver, in
//! order. Presence wins, not truthiness: an explicit null entry on a more
//! specific key stops the search and is a match.

use std::sync::Arc;

use serde_json::Value;

use crate::error::EngineError;
use crate::expander;
use crate::resolver::{Params, RouteTemplate};
use crate::table::ResponseTable;

/// Result of probing the table for a unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Value of the most specific present candidate.
    Found(Value),
    /// No candidate was present; carries the full probe list for the
    /// "unknown arguments" diagnostic.
    NotFound { tried: Vec<String> },
}

/// Read-only facade over the response table for the transport adapters.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<ResponseTable>,
}

impl Dispatcher {
    pub fn new(table: Arc<ResponseTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<ResponseTable> {
        &self.table
    }

    /// Resolve a request against the table via the template's fallback
    /// sequence. Errors only when a matched entry is itself broken.
    pub fn resolve(
        &self,
        template: &RouteTemplate,
        params: &Params,
    ) -> Result<Outcome, EngineError> {
        let tried = template.resolve_candidates(params);

        for key in &tried {
            if let Some(stored) = self.table.get(key) {
                let value = stored.materialize(key)?;
                return Ok(Outcome::Found(value));
            }
        }

        Ok(Outcome::NotFound { tried })
    }

    /// Expand the packet bundle stored under an exact key. Identity concern
    /// for single-shot protocols; the stream adapter is the only caller.
    pub fn expand(&self, key: &str) -> Result<Vec<Value>, EngineError> {
        expander::expand(&self.table, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(ResponseTable::new()))
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_most_specific_candidate_wins() {
        let d = dispatcher();
        d.table().set("orders.tBTCUSD", json!([42]));
        d.table().set("orders", json!([41]));

        let template = RouteTemplate::parse("orders.{symbol}");

        let out = d
            .resolve(&template, &params(&[("symbol", "tBTCUSD")]))
            .unwrap();
        assert_eq!(out, Outcome::Found(json!([42])));

        let out = d
            .resolve(&template, &params(&[("symbol", "tETHUSD")]))
            .unwrap();
        assert_eq!(out, Outcome::Found(json!([41])));
    }

    #[test]
    fn test_absent_param_still_falls_back() {
        let d = dispatcher();
        d.table().set("orders", json!([41]));

        let template = RouteTemplate::parse("orders.{symbol}");
        // Probes "orders." first, then "orders".
        let out = d.resolve(&template, &Params::new()).unwrap();
        assert_eq!(out, Outcome::Found(json!([41])));
    }

    #[test]
    fn test_explicit_null_stops_the_search() {
        let d = dispatcher();
        d.table().set("orders.tBTCUSD", Value::Null);
        d.table().set("orders", json!([41]));

        let template = RouteTemplate::parse("orders.{symbol}");
        let out = d
            .resolve(&template, &params(&[("symbol", "tBTCUSD")]))
            .unwrap();

        // Present-but-null must not fall through to the generic entry.
        assert_eq!(out, Outcome::Found(Value::Null));
    }

    #[test]
    fn test_not_found_carries_full_probe_list() {
        let d = dispatcher();
        let template = RouteTemplate::parse("trades.{symbol}.{start}");

        let out = d
            .resolve(&template, &params(&[("symbol", "tBTCUSD")]))
            .unwrap();

        match out {
            Outcome::NotFound { tried } => {
                assert_eq!(tried, vec!["trades.tBTCUSD.", "trades.tBTCUSD", "trades"]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_entry_is_an_error_not_a_miss() {
        let d = dispatcher();
        d.table().set_raw("tickers", "[broken");

        let template = RouteTemplate::parse("tickers");
        let err = d.resolve(&template, &Params::new()).unwrap_err();
        assert!(matches!(err, EngineError::BadPayload { .. }));
    }

    #[test]
    fn test_deferred_entry_resolved_at_dispatch() {
        let d = dispatcher();
        d.table()
            .set_deferred("user_info", || Ok(json!([1337, "tester"])));

        let template = RouteTemplate::parse("user_info");
        let out = d.resolve(&template, &Params::new()).unwrap();
        assert_eq!(out, Outcome::Found(json!([1337, "tester"])));
    }
}
