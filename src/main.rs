//! Mock API server - CLI entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use api_mock_server::config::MockServerConfig;
use api_mock_server::table::ResponseTable;
use api_mock_server::{control, rest, serve, ws};

#[derive(Parser, Debug)]
#[command(
    name = "api-mock-server",
    about = "Mock API server for integration tests - keyed response tables and scripted event streams",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mock-server.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Override the REST API port
    #[arg(long)]
    rest_port: Option<u16>,

    /// Override the WebSocket API port
    #[arg(long)]
    ws_port: Option<u16>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        print!("{}", serde_yaml::to_string(&MockServerConfig::default())?);
        return Ok(());
    }

    let mut config = if args.config.exists() {
        info!(path = ?args.config, "Loading configuration");
        MockServerConfig::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    } else {
        info!("Using default configuration");
        MockServerConfig::default()
    };

    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} extra routes)",
            config.rest.routes.len()
        );
        return Ok(());
    }

    if let Some(port) = args.rest_port {
        config.rest.api_port = port;
    }
    if let Some(port) = args.ws_port {
        config.ws.api_port = port;
    }

    // Response tables, optionally bulk-loaded from configured data files.
    let rest_table = Arc::new(ResponseTable::new());
    if let Some(path) = &config.rest.responses {
        let count = rest_table.load_json_file(path)?;
        info!(path = %path.display(), count, "REST responses loaded");
    }

    let ws_table = Arc::new(ResponseTable::new());
    if let Some(path) = &config.ws.responses {
        let count = ws_table.load_json_file(path)?;
        info!(path = %path.display(), count, "stream responses loaded");
    }

    let stream_state = ws::StreamState::new(Arc::clone(&ws_table), config.ws.sync_on_connect);

    let rest_api = serve::bind(
        listen_addr(config.rest.api_port),
        rest::router(Arc::clone(&rest_table), &config.rest.catalogue()),
        "rest api",
    )
    .await?;

    let rest_cmd = serve::bind(
        listen_addr(config.rest.cmd_port),
        control::router(rest_table),
        "rest cmd",
    )
    .await?;

    let ws_api = serve::bind(
        listen_addr(config.ws.api_port),
        ws::router(Arc::clone(&stream_state)),
        "ws api",
    )
    .await?;

    let ws_cmd = serve::bind(
        listen_addr(config.ws.cmd_port),
        control::stream_router(
            ws_table,
            control::StreamControl {
                broadcast: stream_state.broadcast(),
                sync_on_connect: stream_state.sync_flag(),
            },
        ),
        "ws cmd",
    )
    .await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    rest_api.close().await;
    rest_cmd.close().await;
    ws_api.close().await;
    ws_cmd.close().await;

    Ok(())
}

fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], port))
}
