//! Listener lifecycle shared by the API and control-plane servers.

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A running server; dropping the handle leaves the server up until the
/// process exits, `close` shuts it down gracefully.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The bound address (useful with port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and wait for in-flight connections to drain.
    pub async fn close(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}

/// Bind and serve a router; resolves once the listener is accepting.
pub async fn bind(addr: SocketAddr, app: Router, name: &'static str) -> Result<ServerHandle> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let (shutdown, rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let shutdown_signal = async {
            let _ = rx.await;
        };
        if let Err(err) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            error!(%err, "{name} server error");
        }
        debug!("{name} server closed");
    });

    info!(addr = %local, "{name} server listening");

    Ok(ServerHandle {
        addr: local,
        shutdown,
        task,
    })
}
