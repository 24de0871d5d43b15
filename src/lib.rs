//! Mock API server for integration tests.
//!
//! Emulates a remote API's request/response and event-stream behavior from
//! a configurable response table. The core is the resolution engine:
//!
//! - **Keyed fallback**: parameterized routes resolve through an ordered
//!   candidate list, most specific key first. With `orders.tBTCUSD: [42]`
//!   and `orders: [41]` configured, a query for `tBTCUSD` returns `[42]`
//!   and any other symbol falls back to `[41]`.
//! - **Packet bundles**: stream responses are `{"packets": [...]}` values
//!   whose string entries reference other bundles by key, expanded
//!   recursively (with cycle detection) into an ordered frame sequence.
//!
//! Around the engine sit thin adapters: a REST server wired from a route
//! catalogue, a WebSocket server replaying bundles per decoded client
//! event, and a control-plane HTTP API for reading and rewriting responses
//! at runtime.

pub mod config;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod expander;
pub mod resolver;
pub mod rest;
pub mod routes;
pub mod serve;
pub mod table;
pub mod ws;

pub use config::MockServerConfig;
pub use dispatch::{Dispatcher, Outcome};
pub use error::EngineError;
pub use resolver::RouteTemplate;
pub use table::{ResponseTable, StoredValue};
