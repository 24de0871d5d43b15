//! Server configuration.
//!
//! Ports, optional bulk-load data files, and extra REST routes. Loaded from
//! YAML; everything has a default so an empty config file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::routes::{default_routes, RouteSpec};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockServerConfig {
    /// REST request/response server.
    #[serde(default)]
    pub rest: RestConfig,

    /// WebSocket event-stream server.
    #[serde(default)]
    pub ws: WsConfig,
}

impl MockServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, route) in self.rest.routes.iter().enumerate() {
            route
                .validate()
                .map_err(|e| anyhow::anyhow!("rest route {}: {}", i, e))?;
        }
        Ok(())
    }
}

/// REST server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestConfig {
    /// Port serving the mocked API routes.
    #[serde(default = "default_rest_api_port")]
    pub api_port: u16,

    /// Port serving the control-plane (get/set) API.
    #[serde(default = "default_rest_cmd_port")]
    pub cmd_port: u16,

    /// Optional JSON file bulk-loaded into the response table at startup.
    #[serde(default)]
    pub responses: Option<PathBuf>,

    /// Extra routes appended to the default catalogue.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

impl RestConfig {
    /// Default catalogue plus any configured extras.
    pub fn catalogue(&self) -> Vec<RouteSpec> {
        let mut routes = default_routes();
        routes.extend(self.routes.iter().cloned());
        routes
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            api_port: default_rest_api_port(),
            cmd_port: default_rest_cmd_port(),
            responses: None,
            routes: Vec::new(),
        }
    }
}

/// WebSocket server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WsConfig {
    /// Port accepting WebSocket clients.
    #[serde(default = "default_ws_api_port")]
    pub api_port: u16,

    /// Port serving the control-plane API (get/set/send/config).
    #[serde(default = "default_ws_cmd_port")]
    pub cmd_port: u16,

    /// Replay snapshot bundles to clients after auth.
    #[serde(default = "default_true")]
    pub sync_on_connect: bool,

    /// Optional JSON file bulk-loaded into the response table at startup.
    /// There is no baked-in default path; stream responses come from here
    /// or from the control plane.
    #[serde(default)]
    pub responses: Option<PathBuf>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            api_port: default_ws_api_port(),
            cmd_port: default_ws_cmd_port(),
            sync_on_connect: true,
            responses: None,
        }
    }
}

fn default_rest_api_port() -> u16 {
    9999
}

fn default_rest_cmd_port() -> u16 {
    9998
}

fn default_ws_api_port() -> u16 {
    9997
}

fn default_ws_cmd_port() -> u16 {
    9996
}

fn default_true() -> bool {
    true
}
