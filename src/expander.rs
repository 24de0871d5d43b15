//! Packet bundle expansion for streamed responses.
//!
//! A stream response is stored as `{"packets": [...]}`. Each entry is either
//! a literal payload emitted as one frame, or a string naming another key
//! whose expanded packets are spliced in at that position. Expansion keeps a
//! set of keys on the active reference path; revisiting one is reported as a
//! cycle instead of recursing until the stack blows.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::EngineError;
use crate::table::ResponseTable;

/// Expand the bundle stored under `key` into a flat ordered packet list.
///
/// An unknown key, a non-bundle value, or a bundle without a packet list all
/// yield an empty sequence; only a corrupt stored payload or a reference
/// cycle is an error.
pub fn expand(table: &ResponseTable, key: &str) -> Result<Vec<Value>, EngineError> {
    let mut visiting = HashSet::new();
    expand_inner(table, key, &mut visiting)
}

fn expand_inner(
    table: &ResponseTable,
    key: &str,
    visiting: &mut HashSet<String>,
) -> Result<Vec<Value>, EngineError> {
    if !visiting.insert(key.to_string()) {
        return Err(EngineError::ReferenceCycle {
            key: key.to_string(),
        });
    }

    let packets = match table.get(key) {
        Some(stored) => bundle_packets(stored.materialize(key)?),
        None => Vec::new(),
    };

    let mut out = Vec::new();
    for entry in packets {
        if is_falsy(&entry) {
            continue;
        }
        match entry {
            Value::String(reference) => {
                out.extend(expand_inner(table, &reference, visiting)?);
            }
            literal => out.push(literal),
        }
    }

    // Off the active path now; a later sibling may reference this key again.
    visiting.remove(key);

    Ok(out)
}

fn bundle_packets(value: Value) -> Vec<Value> {
    match value {
        Value::Object(mut map) => match map.remove("packets") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Skip rule for bundle entries, matching how bundles were authored: null,
/// false, zero, and the empty string are placeholders, not payloads.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(num) => num.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}
