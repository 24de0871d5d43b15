//! The response table: a keyed map of configured responses.
//!
//! This is the single source of truth the dispatch path reads and the
//! control plane writes. Entries are JSON values in one of three stored
//! forms: a canonical parsed value, a raw JSON string parsed at read time,
//! or a deferred producer invoked at read time.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::error::EngineError;

/// Zero-argument producer for deferred entries, invoked on every read.
pub type Producer = dyn Fn() -> anyhow::Result<Value> + Send + Sync;

/// A single configured response.
#[derive(Clone)]
pub enum StoredValue {
    /// Canonical parsed JSON. `Value::Null` is a valid entry meaning "key
    /// recognized, intentionally no payload".
    Literal(Value),
    /// Raw JSON text, parsed on read. Parse failures surface as
    /// [`EngineError::BadPayload`] rather than a missing entry.
    Raw(String),
    /// Computed on demand.
    Deferred(Arc<Producer>),
}

impl StoredValue {
    /// Resolve the stored form into a concrete JSON value.
    pub fn materialize(&self, key: &str) -> Result<Value, EngineError> {
        match self {
            StoredValue::Literal(value) => Ok(value.clone()),
            StoredValue::Raw(text) => {
                serde_json::from_str(text).map_err(|e| EngineError::bad_payload(key, e))
            }
            StoredValue::Deferred(producer) => {
                producer().map_err(|e| EngineError::bad_payload(key, e))
            }
        }
    }
}

impl fmt::Debug for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            StoredValue::Raw(text) => f.debug_tuple("Raw").field(text).finish(),
            StoredValue::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Shared mutable mapping of response key to stored value.
///
/// Every operation takes the lock exactly once, so reads and writes
/// interleaving across concurrently handled requests never observe a
/// half-applied update.
#[derive(Debug, Default)]
pub struct ResponseTable {
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl ResponseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-key lookup, no fallback. `None` means the key is unknown;
    /// a stored null is returned as `Some(Literal(Null))`.
    pub fn get(&self, key: &str) -> Option<StoredValue> {
        self.entries.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Upsert a canonical JSON value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        debug!(%key, "response set");
        self.entries.write().insert(key, StoredValue::Literal(value));
    }

    /// Upsert a raw JSON text entry. The text is not validated here; a
    /// malformed payload is reported when the entry is read.
    pub fn set_raw(&self, key: impl Into<String>, text: impl Into<String>) {
        self.entries
            .write()
            .insert(key.into(), StoredValue::Raw(text.into()));
    }

    /// Upsert a deferred entry, recomputed on every read.
    pub fn set_deferred<F>(&self, key: impl Into<String>, producer: F)
    where
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.entries
            .write()
            .insert(key.into(), StoredValue::Deferred(Arc::new(producer)));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Replace the entire table contents from a JSON document of the form
    /// `{"key": value, ...}`. All-or-nothing: on malformed input the
    /// existing entries are left untouched and the error is returned.
    pub fn load_json_str(&self, data: &str) -> Result<usize, serde_json::Error> {
        let parsed: HashMap<String, Value> = serde_json::from_str(data)?;
        let count = parsed.len();

        let mut entries = self.entries.write();
        entries.clear();
        for (key, value) in parsed {
            entries.insert(key, StoredValue::Literal(value));
        }

        Ok(count)
    }

    /// Bulk-load from a JSON file. See [`ResponseTable::load_json_str`] for
    /// the atomicity contract.
    pub fn load_json_file(&self, path: &Path) -> anyhow::Result<usize> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let count = self
            .load_json_str(&data)
            .map_err(|e| anyhow::anyhow!("malformed response data in {}: {}", path.display(), e))?;
        debug!(path = %path.display(), count, "responses loaded");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_round_trip() {
        let table = ResponseTable::new();
        let value = json!({
            "id": 41215275,
            "symbol": "fUSD",
            "rate": 0.00207328,
            "flags": null,
            "nested": { "tags": ["a", "b"] }
        });

        table.set("f_offers.fUSD", value.clone());

        let stored = table.get("f_offers.fUSD").expect("entry present");
        assert_eq!(stored.materialize("f_offers.fUSD").unwrap(), value);
    }

    #[test]
    fn test_null_entry_is_present() {
        let table = ResponseTable::new();
        table.set("wallets", Value::Null);

        assert!(table.contains("wallets"));
        let stored = table.get("wallets").unwrap();
        assert_eq!(stored.materialize("wallets").unwrap(), Value::Null);

        assert!(table.get("positions").is_none());
    }

    #[test]
    fn test_raw_entry_parse_failure_is_bad_payload() {
        let table = ResponseTable::new();
        table.set_raw("tickers", "{not json");

        let stored = table.get("tickers").unwrap();
        let err = stored.materialize("tickers").unwrap_err();
        assert!(matches!(err, EngineError::BadPayload { .. }));
    }

    #[test]
    fn test_deferred_entry_resolved_on_read() {
        let table = ResponseTable::new();
        table.set_deferred("user_info", || Ok(json!(["user", 42])));

        let stored = table.get("user_info").unwrap();
        assert_eq!(stored.materialize("user_info").unwrap(), json!(["user", 42]));
    }

    #[test]
    fn test_deferred_failure_is_bad_payload() {
        let table = ResponseTable::new();
        table.set_deferred("user_info", || anyhow::bail!("backend offline"));

        let err = table
            .get("user_info")
            .unwrap()
            .materialize("user_info")
            .unwrap_err();
        assert!(err.to_string().contains("backend offline"));
    }

    #[test]
    fn test_load_replaces_contents() {
        let table = ResponseTable::new();
        table.set("stale", json!(1));

        let count = table
            .load_json_str(r#"{"tickers": [[1, 2]], "wallets": null}"#)
            .unwrap();

        assert_eq!(count, 2);
        assert!(table.contains("tickers"));
        assert!(table.contains("wallets"));
        assert!(!table.contains("stale"));
    }

    #[test]
    fn test_failed_load_leaves_table_unmodified() {
        let table = ResponseTable::new();
        table.set("orders", json!([41]));

        let err = table.load_json_str("{broken");
        assert!(err.is_err());

        let stored = table.get("orders").expect("prior entry survives");
        assert_eq!(stored.materialize("orders").unwrap(), json!([41]));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"connect.res": {{"packets": [["info"]]}}}}"#).unwrap();

        let table = ResponseTable::new();
        let count = table.load_json_file(file.path()).unwrap();
        assert_eq!(count, 1);
        assert!(table.contains("connect.res"));
    }
}
