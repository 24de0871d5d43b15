//! Candidate key resolution for parameterized routes.
//!
//! A route key template like `trades.{symbol}.{start}.{end}` plus the
//! request's parameters resolves to an ordered fallback list of lookup keys,
//! most specific first. Missing parameters substitute the empty string, so
//! `trades.{symbol}` with no symbol still probes `trades.` before `trades`.

use std::collections::HashMap;

use serde_json::Value;

/// Request parameters after merging path, query, and body sources.
pub type Params = HashMap<String, String>;

/// One token of a key template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
}

/// An ordered list of literal and `{placeholder}` tokens, joined by `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    tokens: Vec<Token>,
}

impl RouteTemplate {
    /// Parse a dot-separated key template. A token wrapped in braces is a
    /// placeholder; anything else is a literal. Always yields at least one
    /// token.
    pub fn parse(template: &str) -> Self {
        let tokens = template
            .split('.')
            .map(|token| {
                if token.len() >= 2 && token.starts_with('{') && token.ends_with('}') {
                    Token::Param(token[1..token.len() - 1].to_string())
                } else {
                    Token::Literal(token.to_string())
                }
            })
            .collect();

        Self { tokens }
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Build the fallback sequence for this template: substitute parameters
    /// into placeholders (empty string when absent), join with `.`, then
    /// repeatedly drop the last token. N tokens yield N candidates, ending
    /// with the first token alone.
    pub fn resolve_candidates(&self, params: &Params) -> Vec<String> {
        let substituted: Vec<&str> = self
            .tokens
            .iter()
            .map(|token| match token {
                Token::Literal(text) => text.as_str(),
                Token::Param(name) => params.get(name).map(String::as_str).unwrap_or(""),
            })
            .collect();

        (1..=substituted.len())
            .rev()
            .map(|end| substituted[..end].join("."))
            .collect()
    }
}

/// Merge parameter sources with path taking precedence over query, and
/// query over body. Body fields are flattened from the top level of a JSON
/// object; scalar values are coerced to strings, anything else is skipped.
pub fn merge_params(
    path: &HashMap<String, String>,
    query: &HashMap<String, String>,
    body: Option<&Value>,
) -> Params {
    let mut params = Params::new();

    if let Some(Value::Object(fields)) = body {
        for (name, value) in fields {
            if let Some(text) = scalar_to_string(value) {
                params.insert(name.clone(), text);
            }
        }
    }

    for (name, value) in query {
        params.insert(name.clone(), value.clone());
    }

    for (name, value) in path {
        params.insert(name.clone(), value.clone());
    }

    params
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
