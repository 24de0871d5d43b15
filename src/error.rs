//! Error taxonomy for the response engine.
//!
//! None of these are fatal to the process; each is scoped to a single
//! request, stream event, or control-plane call.

use thiserror::Error;

/// Failures raised while resolving or expanding a configured response.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A matched entry could not be deserialized or produced. Distinct from
    /// "no entry matched" so test authors can tell a missing stub apart from
    /// a broken one.
    #[error("bad response payload for key `{key}`: {reason}")]
    BadPayload { key: String, reason: String },

    /// A packet bundle references itself, directly or through other bundles.
    /// Expansion is aborted instead of recursing forever.
    #[error("reference cycle while expanding packet bundle `{key}`")]
    ReferenceCycle { key: String },
}

impl EngineError {
    pub fn bad_payload(key: &str, reason: impl ToString) -> Self {
        Self::BadPayload {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}
